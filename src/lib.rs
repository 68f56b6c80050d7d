//! Symplectic integrators for separable Hamiltonian systems.
//!
//! Three fixed-step schemes are provided: leapfrog (order 2) and a
//! fourth-order composition acting on a combined state through a
//! [`DriftKick`] force model, and a sixth-order composition acting on
//! separate positions and momenta through an [`Acceleration`]. Each scheme
//! can pick its step size once, before integrating, by comparing one step
//! against two half steps.

pub mod cancel;
pub mod drift_kick;
pub mod grid;
pub mod kernel;
pub mod method;
pub mod metric;
pub mod position_momentum;
pub mod settings;
pub mod system;

use ndarray::prelude::*;
use ndarray::s;
use thiserror::Error;

pub use crate::cancel::CancelToken;
pub use crate::drift_kick::DriftKickIntegrator;
pub use crate::grid::CreateIntegratorError;
pub use crate::method::{CompositionMethod, Leapfrog, Yoshida4, Yoshida6};
pub use crate::metric::{Cartesian, PeriodicAngle, StepMetric};
pub use crate::position_momentum::PositionMomentumIntegrator;
pub use crate::settings::{Settings, StepSize, Tolerances};
pub use crate::system::{Acceleration, DriftKick, Split};

/// Status code of an integration that was stopped by cancellation.
pub const INTERRUPTED: i32 = -10;

/// How an integration ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    /// Every output row was written.
    Completed,
    /// Cancellation was observed; only the first `valid_rows` output rows
    /// were written.
    Interrupted { valid_rows: usize },
}

impl Status {
    /// `0` on completion, [`INTERRUPTED`] otherwise.
    pub fn code(&self) -> i32 {
        match self {
            Status::Completed => 0,
            Status::Interrupted { .. } => INTERRUPTED,
        }
    }

    pub fn is_interrupted(&self) -> bool {
        matches!(self, Status::Interrupted { .. })
    }

    pub fn into_result(self) -> Result<(), Interrupted> {
        match self {
            Status::Completed => Ok(()),
            Status::Interrupted { valid_rows } => Err(Interrupted { valid_rows }),
        }
    }
}

/// Error form of [`Status::Interrupted`].
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("integration interrupted after {valid_rows} output rows")]
pub struct Interrupted {
    pub valid_rows: usize,
}

/// Output of [`SymplecticIntegrate::integrate`].
#[derive(Clone, Debug)]
pub struct Integration {
    /// One row per output time. Rows past the valid prefix of an interrupted
    /// integration are zero.
    pub output: Array2<f64>,
    pub status: Status,
}

impl Integration {
    /// The rows that were actually written.
    pub fn valid(&self) -> ArrayView2<'_, f64> {
        match self.status {
            Status::Completed => self.output.view(),
            Status::Interrupted { valid_rows } => self.output.slice(s![..valid_rows, ..]),
        }
    }
}

pub trait SymplecticIntegrate {
    /// Returns the number of elements in each output row.
    fn len(&self) -> usize;
    /// Output times.
    fn times(&self) -> ArrayView1<'_, f64>;
    /// Step size used inside each output interval.
    fn step_size(&self) -> f64;
    /// Integrate from the initial state over all output times, writing one
    /// row per time into `out` (the first row is the initial state).
    ///
    /// `cancel` is polled before each output interval.
    ///
    /// # Panics
    ///
    /// Panics if `out` does not have shape `(self.times().len(), self.len())`.
    fn integrate_into(&mut self, out: ArrayViewMut2<'_, f64>, cancel: &CancelToken) -> Status;
    /// Integrate into a freshly allocated output array.
    fn integrate(&mut self, cancel: &CancelToken) -> Integration {
        let mut output = Array2::zeros((self.times().len(), self.len()));
        let status = self.integrate_into(output.view_mut(), cancel);
        Integration { output, status }
    }
}
