//! Integration settings.

/// Relative and absolute tolerances for the step-size search.
///
/// Both are stored as natural logarithms so that tolerances spanning many
/// orders of magnitude can be combined without overflow.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tolerances {
    ln_rtol: f64,
    ln_atol: f64,
}

impl Tolerances {
    /// Creates tolerances from their linear values.
    pub fn new(rtol: f64, atol: f64) -> Tolerances {
        Tolerances {
            ln_rtol: rtol.ln(),
            ln_atol: atol.ln(),
        }
    }

    /// Creates tolerances from their natural logarithms.
    pub fn from_log(ln_rtol: f64, ln_atol: f64) -> Tolerances {
        Tolerances { ln_rtol, ln_atol }
    }

    /// Relative tolerance.
    pub fn rtol(&self) -> f64 {
        self.ln_rtol.exp()
    }

    /// Absolute tolerance.
    pub fn atol(&self) -> f64 {
        self.ln_atol.exp()
    }

    pub fn ln_rtol(&self) -> f64 {
        self.ln_rtol
    }

    pub fn ln_atol(&self) -> f64 {
        self.ln_atol
    }

    /// Returns `true` if neither tolerance is NaN or infinitely large.
    pub(crate) fn is_valid(&self) -> bool {
        !self.ln_rtol.is_nan()
            && !self.ln_atol.is_nan()
            && self.ln_rtol != ::std::f64::INFINITY
            && self.ln_atol != ::std::f64::INFINITY
    }
}

impl Default for Tolerances {
    fn default() -> Tolerances {
        Tolerances::new(1.49012e-12, 1.49012e-12)
    }
}

/// Step size used inside each output interval.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StepSize {
    /// Search for a step size once, before integrating.
    Auto,
    /// Use this step size. It should divide the output interval evenly; the
    /// number of sub-steps is `floor(interval / dt)`.
    Fixed(f64),
}

impl Default for StepSize {
    fn default() -> StepSize {
        StepSize::Auto
    }
}

/// Settings shared by all integrators.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Settings {
    /// Step size, or `Auto` to search for one (default: `Auto`).
    pub step: StepSize,
    /// Tolerances for the step search (default: `1.49012e-12` for both).
    pub tolerances: Tolerances,
    /// Integrate `y[2] * y[0]` in place of `y[2]`, converting back on output
    /// (default: `false`).
    ///
    /// In cylindrical or polar coordinates `[R, vR, vT, ...]` this integrates
    /// the angular momentum `L = R vT` while still reporting `vT`.
    pub angular_momentum: bool,
}

impl Settings {
    pub fn with_step(mut self, step: StepSize) -> Settings {
        self.step = step;
        self
    }

    pub fn with_fixed_step(self, dt: f64) -> Settings {
        self.with_step(StepSize::Fixed(dt))
    }

    pub fn with_tolerances(mut self, tolerances: Tolerances) -> Settings {
        self.tolerances = tolerances;
        self
    }

    pub fn with_angular_momentum(mut self, enabled: bool) -> Settings {
        self.angular_momentum = enabled;
        self
    }
}
