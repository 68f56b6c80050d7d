#![allow(dead_code)]

use ndarray::prelude::*;
use ndarray::{array, s};
use ndarray_symplectic::Acceleration;

/// Unit harmonic oscillator, `a = -q`.
pub fn oscillator(_t: f64, q: ArrayView1<f64>, mut a: ArrayViewMut1<f64>) {
    a.assign(&q.mapv(|x| -x));
}

/// Kepler problem with `GM = 1`.
pub fn kepler(_t: f64, q: ArrayView1<f64>, mut a: ArrayViewMut1<f64>) {
    let r2 = q.dot(&q);
    let r3 = r2 * r2.sqrt();
    a.assign(&q.mapv(|x| -x / r3));
}

/// `[q, p]` at pericentre of a Kepler orbit with semi-major axis 1.
pub fn kepler_pericentre(e: f64) -> Array1<f64> {
    array![1. - e, 0., 0., ((1. + e) / (1. - e)).sqrt()]
}

/// Energy of a Kepler state `[q, p]`.
pub fn kepler_energy(y: ArrayView1<f64>) -> f64 {
    let q = y.slice(s![..2]);
    let p = y.slice(s![2..]);
    0.5 * p.dot(&p) - 1. / q.dot(&q).sqrt()
}

/// Largest phase-space distance between oscillator output `[q, p]` and
/// `(cos t, -sin t)`.
pub fn oscillator_error(times: ArrayView1<f64>, out: ArrayView2<f64>) -> f64 {
    times
        .iter()
        .zip(out.outer_iter())
        .map(|(&t, row)| (row[0] - t.cos()).hypot(row[1] + t.sin()))
        .fold(0., f64::max)
}

/// Counts acceleration evaluations.
pub struct Counted<A> {
    pub accel: A,
    pub calls: usize,
}

impl<A> Counted<A> {
    pub fn new(accel: A) -> Counted<A> {
        Counted { accel, calls: 0 }
    }
}

impl<A: Acceleration> Acceleration for Counted<A> {
    fn acceleration(&mut self, t: f64, q: ArrayView1<f64>, a: ArrayViewMut1<f64>) {
        self.calls += 1;
        self.accel.acceleration(t, q, a);
    }
}
