//! Error metrics used by the step-size searches.

use ndarray::prelude::*;
use ndarray::{azip, FoldWhile, Zip};
use std::f64::consts::PI;

/// Measures the distance between two phase-space states.
///
/// Only used while searching for a step size.
pub trait StepMetric {
    /// Fills `scaling` with the per-component scale of `y`. The tolerance of
    /// component `i` is then `atol + rtol * scaling[i]`.
    fn tol_scaling(&self, y: ArrayView1<f64>, scaling: ArrayViewMut1<f64>);

    /// Fills `delta` with the per-component distance between `x` and `y`.
    fn distance(&self, x: ArrayView1<f64>, y: ArrayView1<f64>, delta: ArrayViewMut1<f64>);
}

/// Plain component-wise metric: scale `|y_i|`, distance `x_i - y_i`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Cartesian;

impl StepMetric for Cartesian {
    fn tol_scaling(&self, y: ArrayView1<f64>, mut scaling: ArrayViewMut1<f64>) {
        azip!((s in &mut scaling, &y in &y) *s = y.abs());
    }

    fn distance(&self, x: ArrayView1<f64>, y: ArrayView1<f64>, mut delta: ArrayViewMut1<f64>) {
        azip!((d in &mut delta, &x in &x, &y in &y) *d = x - y);
    }
}

/// Component-wise metric for states that carry an angle.
///
/// The distance in component `index` is wrapped into `[-pi, pi]`, and the
/// angle does not contribute a relative tolerance (its scale is zero).
#[derive(Clone, Copy, Debug)]
pub struct PeriodicAngle {
    index: usize,
}

impl PeriodicAngle {
    /// Treats component `index` as an angle.
    pub fn new(index: usize) -> PeriodicAngle {
        PeriodicAngle { index }
    }

    /// Index of the angle component.
    pub fn index(&self) -> usize {
        self.index
    }
}

impl StepMetric for PeriodicAngle {
    fn tol_scaling(&self, y: ArrayView1<f64>, mut scaling: ArrayViewMut1<f64>) {
        Cartesian.tol_scaling(y, scaling.view_mut());
        scaling[self.index] = 0.;
    }

    fn distance(&self, x: ArrayView1<f64>, y: ArrayView1<f64>, mut delta: ArrayViewMut1<f64>) {
        Cartesian.distance(x, y, delta.view_mut());
        delta[self.index] = wrap_angle(delta[self.index]);
    }
}

/// Wraps an angle difference into `[-pi, pi]`.
fn wrap_angle(x: f64) -> f64 {
    let wrapped = (x + PI).rem_euclid(2. * PI) - PI;
    if wrapped == -PI && x > 0. {
        PI
    } else {
        wrapped
    }
}

/// Computes RMS norm of scaled values.
///
/// Zero values contribute nothing, even where the scale is zero.
pub(crate) fn norm(x: ArrayView1<f64>, scale: ArrayView1<f64>) -> f64 {
    debug_assert_eq!(x.len(), scale.len());
    (Zip::from(x)
        .and(scale)
        .fold_while(0., |acc, &x, &scale| {
            if x == 0. {
                return FoldWhile::Continue(acc);
            }
            let scaled = x / scale;
            FoldWhile::Continue(acc + scaled * scaled)
        })
        .into_inner()
        / x.len() as f64)
        .sqrt()
}

/// Computes `ln(exp(a) + exp(b))` without overflowing.
pub(crate) fn log_add_exp(a: f64, b: f64) -> f64 {
    let c = a.max(b);
    if c == f64::NEG_INFINITY {
        return c;
    }
    ((a - c).exp() + (b - c).exp()).ln() + c
}

/// Natural log of the tolerance `atol + rtol * max|x|`, computed from the
/// logs of the tolerances.
pub(crate) fn ln_scale(x: ArrayView1<f64>, ln_rtol: f64, ln_atol: f64) -> f64 {
    let max = x.fold(0., |m: f64, &v| m.max(v.abs()));
    log_add_exp(ln_atol, ln_rtol + max.ln())
}

/// Computes `sum((x_i - y_i)^2 / exp(ln_scale)^2)`, working with the log of
/// each difference. Equal components contribute nothing.
pub(crate) fn log_scaled_sq_sum(x: ArrayView1<f64>, y: ArrayView1<f64>, ln_scale: f64) -> f64 {
    debug_assert_eq!(x.len(), y.len());
    Zip::from(x)
        .and(y)
        .fold_while(0., |acc, &x, &y| {
            if x == y {
                return FoldWhile::Continue(acc);
            }
            FoldWhile::Continue(acc + (2. * ((x - y).abs().ln() - ln_scale)).exp())
        })
        .into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn rms_norm() {
        let x = array![3., -4.];
        let scale = array![1., 2.];
        assert!((norm(x.view(), scale.view()) - (13f64 / 2.).sqrt()).abs() < 1e-15);
    }

    #[test]
    fn zero_scale() {
        let scale = array![0., 1.];
        assert_eq!(norm(array![0., 2.].view(), scale.view()), 2f64.sqrt());
        assert_eq!(norm(array![1e-300, 0.].view(), scale.view()), f64::INFINITY);

        let ln_zero = f64::NEG_INFINITY;
        let x = array![0., 1.];
        assert_eq!(log_scaled_sq_sum(x.view(), x.view(), ln_zero), 0.);
        assert_eq!(
            log_scaled_sq_sum(x.view(), array![0., 1.5].view(), ln_zero),
            f64::INFINITY
        );
    }

    #[test]
    fn log_add_exp_is_stable() {
        assert!((log_add_exp(0., 0.) - 2f64.ln()).abs() < 1e-15);
        assert_eq!(log_add_exp(1000., f64::NEG_INFINITY), 1000.);
        assert!((log_add_exp(-1000., -1000.) - (-1000. + 2f64.ln())).abs() < 1e-12);
        assert_eq!(log_add_exp(f64::NEG_INFINITY, f64::NEG_INFINITY), f64::NEG_INFINITY);
    }

    #[test]
    fn log_scale_matches_linear_scale() {
        let x = array![0.5, -2., 1.];
        let (rtol, atol) = (1e-3f64, 1e-6f64);
        let s = ln_scale(x.view(), rtol.ln(), atol.ln()).exp();
        assert!((s - (atol + rtol * 2.)).abs() < 1e-15);
        let zero = array![0., 0.];
        assert!((ln_scale(zero.view(), rtol.ln(), atol.ln()) - atol.ln()).abs() < 1e-12);
    }

    #[test]
    fn log_scaled_sum_ignores_equal_components() {
        let x = array![1., 2., 3.];
        let y = array![1., 2.5, 2.];
        let ln_s = 0.5f64.ln();
        assert!((log_scaled_sq_sum(x.view(), y.view(), ln_s) - 5.).abs() < 1e-12);
    }

    #[test]
    fn periodic_angle_wraps() {
        let metric = PeriodicAngle::new(1);
        let mut delta = Array1::zeros(2);
        metric.distance(
            array![1., 0.1].view(),
            array![0.5, 2. * PI - 0.1].view(),
            delta.view_mut(),
        );
        assert!((delta[0] - 0.5).abs() < 1e-15);
        assert!((delta[1] - 0.2).abs() < 1e-12);
        let mut scaling = Array1::zeros(2);
        metric.tol_scaling(array![-3., 1.].view(), scaling.view_mut());
        assert_eq!(scaling, array![3., 0.]);
    }
}
