//! Symplectic integration of separate positions and momenta driven by an
//! acceleration.

use log::{debug, info, trace, warn};
use ndarray::prelude::*;
use ndarray::s;
use std::marker::PhantomData;
use std::mem;

use crate::cancel::CancelToken;
use crate::grid::{check_settings, CreateIntegratorError, TimeGrid};
use crate::kernel::{advance_momentum, advance_position};
use crate::method::{compose, CompositionMethod, Flow, Yoshida6, MAX_DT_REDUCE};
use crate::metric::{ln_scale, log_scaled_sq_sum};
use crate::settings::{Settings, StepSize, Tolerances};
use crate::system::Acceleration;
use crate::{Status, SymplecticIntegrate};

/// Positions and momenta with scratch space for the half steps.
struct PhaseFlow<'a, A> {
    accel: &'a mut A,
    q: Array1<f64>,
    p: Array1<f64>,
    /// Target of the next drift; swapped with `q` afterwards.
    q_next: Array1<f64>,
    /// Target of the next kick; swapped with `p` afterwards.
    p_next: Array1<f64>,
    /// Acceleration buffer.
    a: Array1<f64>,
}

impl<'a, A: Acceleration> PhaseFlow<'a, A> {
    fn new(accel: &'a mut A, q: ArrayView1<f64>, p: ArrayView1<f64>) -> PhaseFlow<'a, A> {
        let dim = q.len();
        PhaseFlow {
            accel,
            q: q.to_owned(),
            p: p.to_owned(),
            q_next: Array1::zeros(dim),
            p_next: Array1::zeros(dim),
            a: Array1::zeros(dim),
        }
    }

    fn reset(&mut self, q: ArrayView1<f64>, p: ArrayView1<f64>) {
        self.q.assign(&q);
        self.p.assign(&p);
    }
}

impl<'a, A: Acceleration> Flow for PhaseFlow<'a, A> {
    fn drift(&mut self, h: f64) {
        advance_position(self.q.view(), self.p.view(), h, self.q_next.view_mut());
        mem::swap(&mut self.q, &mut self.q_next);
    }

    fn kick(&mut self, h: f64, t: f64) {
        self.accel.acceleration(t, self.q.view(), self.a.view_mut());
        advance_momentum(self.p.view(), h, self.a.view(), self.p_next.view_mut());
        mem::swap(&mut self.p, &mut self.p_next);
    }
}

/// Search for a step size that integrates `(q0, p0)` to within tolerance.
///
/// Like [`drift_kick::estimate_step`](crate::drift_kick::estimate_step), the
/// step is halved from `interval` until one step of size `dt` and two steps of
/// size `dt / 2` agree. Positions are compared against the tolerance
/// `atol + rtol * max|q0|` and momenta against `atol + rtol * max|p0|`; the
/// tolerances and differences are combined as logarithms so that neither
/// overflows.
///
/// Components that agree exactly contribute nothing, so a zero tolerance is
/// only violated by components that actually differ. A NaN error counts as
/// not converged.
///
/// The search stops without complaint once `interval / dt` reaches
/// [`MAX_DT_REDUCE`], returning the smallest step tried.
pub fn estimate_step<A, M>(
    accel: &mut A,
    q0: ArrayView1<f64>,
    p0: ArrayView1<f64>,
    t0: f64,
    interval: f64,
    tolerances: &Tolerances,
) -> f64
where
    A: Acceleration,
    M: CompositionMethod,
{
    let dim = q0.len();
    let (ln_rtol, ln_atol) = (tolerances.ln_rtol(), tolerances.ln_atol());
    let ln_scale_q = ln_scale(q0, ln_rtol, ln_atol);
    let ln_scale_p = ln_scale(p0, ln_rtol, ln_atol);

    let mut flow = PhaseFlow::new(accel, q0, p0);
    let mut q_full = Array1::zeros(dim);
    let mut p_full = Array1::zeros(dim);

    let mut err: f64 = 2.;
    let mut dt = 2. * interval;
    while (err > 1. || err.is_nan()) && interval / dt < MAX_DT_REDUCE {
        dt /= 2.;
        flow.reset(q0, p0);
        compose::<M, _>(&mut flow, t0, dt, 1);
        q_full.assign(&flow.q);
        p_full.assign(&flow.p);

        flow.reset(q0, p0);
        compose::<M, _>(&mut flow, t0, dt / 2., 2);

        let sum = log_scaled_sq_sum(q_full.view(), flow.q.view(), ln_scale_q)
            + log_scaled_sq_sum(p_full.view(), flow.p.view(), ln_scale_p);
        err = (sum / (2 * dim) as f64).sqrt();
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

/// Fixed-step symplectic integrator for forces given as accelerations.
///
/// The state is `[q, p]` with both halves of the same length; output rows
/// have the same layout. `M` defaults to the sixth-order [`Yoshida6`].
pub struct PositionMomentumIntegrator<A, M = Yoshida6>
where
    A: Acceleration,
    M: CompositionMethod,
{
    accel: A,
    method: PhantomData<M>,
    /// Initial positions.
    q0: Array1<f64>,
    /// Initial momenta.
    p0: Array1<f64>,
    grid: TimeGrid,
    /// Step size.
    dt: f64,
    /// Number of steps per output interval.
    ndt: usize,
}

impl<A, M> PositionMomentumIntegrator<A, M>
where
    A: Acceleration,
    M: CompositionMethod,
{
    /// Creates a new integrator.
    ///
    /// # Parameters
    ///
    /// * `accel`: Acceleration as a function of time and position.
    ///
    /// * `y0`: Initial state `[q, p]`.
    ///
    /// * `times`: Equally spaced output times, at least two. The first is the
    ///   initial time.
    ///
    /// * `settings`: Step size (searched for here if `Auto`) and tolerances.
    ///   The angular-momentum transform is not supported.
    pub fn new(
        mut accel: A,
        y0: Array1<f64>,
        times: Array1<f64>,
        settings: Settings,
    ) -> Result<PositionMomentumIntegrator<A, M>, CreateIntegratorError> {
        if y0.is_empty() {
            return Err(CreateIntegratorError::EmptyState);
        }
        if y0.len() % 2 != 0 {
            return Err(CreateIntegratorError::OddState(y0.len()));
        }
        if settings.angular_momentum {
            return Err(CreateIntegratorError::TransformUnsupported);
        }
        let grid = TimeGrid::new(times)?;
        check_settings(&grid, &settings)?;

        let dim = y0.len() / 2;
        let q0 = y0.slice(s![..dim]).to_owned();
        let p0 = y0.slice(s![dim..]).to_owned();

        let dt = match settings.step {
            StepSize::Fixed(dt) => dt,
            StepSize::Auto => estimate_step::<A, M>(
                &mut accel,
                q0.view(),
                p0.view(),
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

        Ok(PositionMomentumIntegrator {
            accel,
            method: PhantomData,
            q0,
            p0,
            grid,
            dt,
            ndt,
        })
    }

    /// Dimension of the positions.
    pub fn dim(&self) -> usize {
        self.q0.len()
    }

    /// Number of steps taken per output interval.
    pub fn steps_per_interval(&self) -> usize {
        self.ndt.max(1)
    }

    /// Returns the force model.
    pub fn into_accel(self) -> A {
        self.accel
    }
}

impl<A, M> SymplecticIntegrate for PositionMomentumIntegrator<A, M>
where
    A: Acceleration,
    M: CompositionMethod,
{
    fn len(&self) -> usize {
        2 * self.q0.len()
    }

    fn times(&self) -> ArrayView1<'_, f64> {
        self.grid.times()
    }

    fn step_size(&self) -> f64 {
        self.dt
    }

    fn integrate_into(&mut self, mut out: ArrayViewMut2<'_, f64>, cancel: &CancelToken) -> Status {
        let dim = self.q0.len();
        assert_eq!(
            out.dim(),
            (self.grid.len(), 2 * dim),
            "output buffer has the wrong shape"
        );
        {
            let mut first = out.index_axis_mut(Axis(0), 0);
            first.slice_mut(s![..dim]).assign(&self.q0);
            first.slice_mut(s![dim..]).assign(&self.p0);
        }

        let mut flow = PhaseFlow::new(&mut self.accel, self.q0.view(), self.p0.view());
        let mut t = self.grid.start();
        for row in 1..self.grid.len() {
            if cancel.take() {
                info!("integration interrupted at t = {}", t);
                return Status::Interrupted { valid_rows: row };
            }
            t = compose::<M, _>(&mut flow, t, self.dt, self.ndt);
            let mut saved = out.index_axis_mut(Axis(0), row);
            saved.slice_mut(s![..dim]).assign(&flow.q);
            saved.slice_mut(s![dim..]).assign(&flow.p);
        }
        Status::Completed
    }
}
