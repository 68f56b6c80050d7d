//! Force models seen by the integrators.

use ndarray::prelude::*;

/// A Hamiltonian split into a drift and a kick acting on a combined state.
///
/// Both operations mutate `y` in place. Any force-model parameters belong to
/// the implementor; the integrators never look at them.
pub trait DriftKick {
    /// Moves the positions in `y` over `dt` using the current momenta.
    fn drift(&mut self, dt: f64, y: ArrayViewMut1<f64>);

    /// Moves the momenta in `y` over `dt` using the force at time `t`.
    fn kick(&mut self, dt: f64, t: f64, y: ArrayViewMut1<f64>);
}

/// A force model that computes accelerations from positions.
pub trait Acceleration {
    /// Fills `a` with the acceleration at time `t` and position `q`.
    fn acceleration(&mut self, t: f64, q: ArrayView1<f64>, a: ArrayViewMut1<f64>);
}

impl<F> Acceleration for F
where
    F: FnMut(f64, ArrayView1<f64>, ArrayViewMut1<f64>),
{
    fn acceleration(&mut self, t: f64, q: ArrayView1<f64>, a: ArrayViewMut1<f64>) {
        self(t, q, a)
    }
}

/// Adapts an [`Acceleration`] to [`DriftKick`] on states laid out as
/// `[q, p]`, each half of length `dim`.
pub struct Split<A> {
    dim: usize,
    accel: A,
    /// Acceleration buffer, length `dim`.
    a: Array1<f64>,
}

impl<A: Acceleration> Split<A> {
    /// Creates a new adapter for positions of dimension `dim`.
    pub fn new(dim: usize, accel: A) -> Split<A> {
        Split {
            dim,
            accel,
            a: Array1::zeros(dim),
        }
    }

    /// Dimension of the position (and momentum) half of the state.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Returns the wrapped force model.
    pub fn into_inner(self) -> A {
        self.accel
    }
}

impl<A: Acceleration> DriftKick for Split<A> {
    fn drift(&mut self, dt: f64, y: ArrayViewMut1<f64>) {
        debug_assert_eq!(y.len(), 2 * self.dim);
        let (mut q, p) = y.split_at(Axis(0), self.dim);
        q.scaled_add(dt, &p);
    }

    fn kick(&mut self, dt: f64, t: f64, y: ArrayViewMut1<f64>) {
        debug_assert_eq!(y.len(), 2 * self.dim);
        let (q, mut p) = y.split_at(Axis(0), self.dim);
        self.accel.acceleration(t, q.view(), self.a.view_mut());
        p.scaled_add(dt, &self.a);
    }
}
