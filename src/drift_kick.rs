//! Symplectic integration of combined `y` states through drift and kick maps.

use log::{debug, info, trace, warn};
use ndarray::prelude::*;
use std::marker::PhantomData;

use crate::cancel::CancelToken;
use crate::grid::{check_settings, CreateIntegratorError, TimeGrid};
use crate::method::{compose, CompositionMethod, Flow, MAX_DT_REDUCE};
use crate::metric::{norm, Cartesian, StepMetric};
use crate::settings::{Settings, StepSize, Tolerances};
use crate::system::DriftKick;
use crate::{Status, SymplecticIntegrate};

/// A combined state moved by a [`DriftKick`] system.
struct Combined<'a, S> {
    system: &'a mut S,
    y: ArrayViewMut1<'a, f64>,
}

impl<'a, S: DriftKick> Flow for Combined<'a, S> {
    fn drift(&mut self, h: f64) {
        self.system.drift(h, self.y.view_mut());
    }

    fn kick(&mut self, h: f64, t: f64) {
        self.system.kick(h, t, self.y.view_mut());
    }
}

/// Search for a step size that integrates `y0` to within tolerance.
///
/// Starting from `interval`, the step is halved until one step of size `dt`
/// and two steps of size `dt / 2` agree to an RMS error of at most 1, where
/// component `i` of the difference (as measured by `metric`) is scaled by
/// `atol + rtol * scaling[i]`.
///
/// Components that agree exactly contribute nothing, so a zero tolerance is
/// only violated by components that actually differ. A NaN error counts as
/// not converged.
///
/// The search stops without complaint once `interval / dt` reaches
/// [`MAX_DT_REDUCE`], returning the smallest step tried.
pub fn estimate_step<S, M, E>(
    system: &mut S,
    metric: &E,
    y0: ArrayView1<f64>,
    t0: f64,
    interval: f64,
    tolerances: &Tolerances,
) -> f64
where
    S: DriftKick,
    M: CompositionMethod,
    E: StepMetric,
{
    let n = y0.len();
    let mut scale = Array1::zeros(n);
    metric.tol_scaling(y0, scale.view_mut());
    let (rtol, atol) = (tolerances.rtol(), tolerances.atol());
    scale.mapv_inplace(|s| atol + rtol * s);

    let mut y_full = Array1::zeros(n);
    let mut y_half = Array1::zeros(n);
    let mut delta = Array1::zeros(n);

    let mut err: f64 = 2.;
    let mut dt = 2. * interval;
    while (err > 1. || err.is_nan()) && interval / dt < MAX_DT_REDUCE {
        dt /= 2.;
        y_full.assign(&y0);
        y_half.assign(&y0);
        compose::<M, _>(
            &mut Combined {
                system: &mut *system,
                y: y_full.view_mut(),
            },
            t0,
            dt,
            1,
        );
        compose::<M, _>(
            &mut Combined {
                system: &mut *system,
                y: y_half.view_mut(),
            },
            t0,
            dt / 2.,
            2,
        );
        metric.distance(y_full.view(), y_half.view(), delta.view_mut());
        err = norm(delta.view(), scale.view());
        trace!("step search: dt = {:e}, error norm = {:e}", dt, err);
    }
    if err > 1. || err.is_nan() {
        warn!(
            "step search stopped at dt = {:e} with error norm {:e} > 1",
            dt, err
        );
    }
    dt
}

/// Fixed-step symplectic integrator for [`DriftKick`] systems.
///
/// `M` selects the composition ([`Leapfrog`](crate::Leapfrog) or
/// [`Yoshida4`](crate::Yoshida4)) and `E` the metric used by the step
/// search. Output rows have the same length as the state.
pub struct DriftKickIntegrator<S, M, E = Cartesian>
where
    S: DriftKick,
    M: CompositionMethod,
    E: StepMetric,
{
    system: S,
    metric: E,
    method: PhantomData<M>,
    /// Initial state, as given. This is the first output row.
    y_init: Array1<f64>,
    /// Initial state in the form that is integrated.
    y0: Array1<f64>,
    grid: TimeGrid,
    /// Step size.
    dt: f64,
    /// Number of steps per output interval.
    ndt: usize,
    angular_momentum: bool,
}

impl<S, M, E> DriftKickIntegrator<S, M, E>
where
    S: DriftKick,
    M: CompositionMethod,
    E: StepMetric,
{
    /// Creates a new integrator.
    ///
    /// # Parameters
    ///
    /// * `system`: Drift and kick maps of the Hamiltonian.
    ///
    /// * `metric`: Distance and tolerance scaling used by the step search.
    ///
    /// * `y0`: Initial state.
    ///
    /// * `times`: Equally spaced output times, at least two. The first is the
    ///   initial time.
    ///
    /// * `settings`: Step size (searched for here if `Auto`), tolerances and
    ///   the angular-momentum transform.
    pub fn new(
        mut system: S,
        metric: E,
        y0: Array1<f64>,
        times: Array1<f64>,
        settings: Settings,
    ) -> Result<DriftKickIntegrator<S, M, E>, CreateIntegratorError> {
        if y0.is_empty() {
            return Err(CreateIntegratorError::EmptyState);
        }
        if settings.angular_momentum && y0.len() < 3 {
            return Err(CreateIntegratorError::TransformTooShort(y0.len()));
        }
        let grid = TimeGrid::new(times)?;
        check_settings(&grid, &settings)?;

        let y_init = y0;
        let mut y0 = y_init.clone();
        if settings.angular_momentum {
            let r = y0[0];
            y0[2] *= r;
        }

        let dt = match settings.step {
            StepSize::Fixed(dt) => dt,
            StepSize::Auto => estimate_step::<S, M, E>(
                &mut system,
                &metric,
                y0.view(),
                grid.start(),
                grid.interval(),
                &settings.tolerances,
            ),
        };
        let ndt = grid.substeps(dt);
        debug!(
            "order-{} integrator: dt = {:e}, {} steps per output interval",
            M::ORDER,
            dt,
            ndt
        );

        Ok(DriftKickIntegrator {
            system,
            metric,
            method: PhantomData,
            y_init,
            y0,
            grid,
            dt,
            ndt,
            angular_momentum: settings.angular_momentum,
        })
    }

    /// Number of steps taken per output interval.
    pub fn steps_per_interval(&self) -> usize {
        self.ndt.max(1)
    }

    pub fn metric(&self) -> &E {
        &self.metric
    }

    /// Returns the system.
    pub fn into_system(self) -> S {
        self.system
    }
}

impl<S, M, E> SymplecticIntegrate for DriftKickIntegrator<S, M, E>
where
    S: DriftKick,
    M: CompositionMethod,
    E: StepMetric,
{
    fn len(&self) -> usize {
        self.y0.len()
    }

    fn times(&self) -> ArrayView1<'_, f64> {
        self.grid.times()
    }

    fn step_size(&self) -> f64 {
        self.dt
    }

    fn integrate_into(&mut self, mut out: ArrayViewMut2<'_, f64>, cancel: &CancelToken) -> Status {
        assert_eq!(
            out.dim(),
            (self.grid.len(), self.y0.len()),
            "output buffer has the wrong shape"
        );
        out.index_axis_mut(Axis(0), 0).assign(&self.y_init);

        let mut y = self.y0.clone();
        let mut t = self.grid.start();
        for row in 1..self.grid.len() {
            if cancel.take() {
                info!("integration interrupted at t = {}", t);
                return Status::Interrupted { valid_rows: row };
            }
            t = compose::<M, _>(
                &mut Combined {
                    system: &mut self.system,
                    y: y.view_mut(),
                },
                t,
                self.dt,
                self.ndt,
            );
            let mut saved = out.index_axis_mut(Axis(0), row);
            saved.assign(&y);
            if self.angular_momentum {
                let r = saved[0];
                saved[2] /= r;
            }
        }
        Status::Completed
    }
}
