//! Elementary drift and kick updates.

use ndarray::prelude::*;
use ndarray::azip;

/// Writes `q + dt * p` into `q_new`.
pub fn advance_position(
    q: ArrayView1<f64>,
    p: ArrayView1<f64>,
    dt: f64,
    mut q_new: ArrayViewMut1<f64>,
) {
    debug_assert_eq!(q.len(), p.len());
    azip!((q_new in &mut q_new, &q in &q, &p in &p) *q_new = q + dt * p);
}

/// Writes `p + dt * a` into `p_new`.
pub fn advance_momentum(
    p: ArrayView1<f64>,
    dt: f64,
    a: ArrayView1<f64>,
    mut p_new: ArrayViewMut1<f64>,
) {
    debug_assert_eq!(p.len(), a.len());
    azip!((p_new in &mut p_new, &p in &p, &a in &a) *p_new = p + dt * a);
}
