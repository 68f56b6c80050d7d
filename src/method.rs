//! Symmetric drift–kick compositions.

use ndarray::aview1;
use ndarray::prelude::*;

/// The step search gives up once the probe interval spans this many steps.
pub const MAX_DT_REDUCE: f64 = 10000.;

/// A symmetric composition of drifts and kicks.
///
/// One elementary step of size `dt` is
///
/// ```text
/// drift(c[0] dt) kick(d[0] dt) drift(c[1] dt) ... kick(d[K-1] dt) drift(c[K] dt)
/// ```
///
/// where `K = kick().len()` and `drift().len() == K + 1`. Each kick is
/// evaluated at the time reached by the drifts before it.
pub trait CompositionMethod {
    /// Order of the method.
    const ORDER: usize;

    /// Drift coefficients, length `kick().len() + 1`.
    fn drift() -> ArrayView1<'static, f64>;

    /// Kick coefficients.
    fn kick() -> ArrayView1<'static, f64>;
}

/// Störmer–Verlet leapfrog (drift–kick–drift) of order 2.
pub struct Leapfrog;

impl CompositionMethod for Leapfrog {
    const ORDER: usize = 2;

    fn drift() -> ArrayView1<'static, f64> {
        aview1(&[0.5, 0.5])
    }

    fn kick() -> ArrayView1<'static, f64> {
        aview1(&[1.])
    }
}

/// Fourth-order composition of three leapfrog steps.
///
/// # References
///
/// 1. E. Forest, R. D. Ruth, "Fourth-order symplectic integration", Physica D,
///    Vol. 43, pp. 105-117, 1990.
///
/// 2. H. Yoshida, "Construction of higher order symplectic integrators",
///    Phys. Lett. A, Vol. 150, pp. 262-268, 1990.
pub struct Yoshida4;

impl CompositionMethod for Yoshida4 {
    const ORDER: usize = 4;

    fn drift() -> ArrayView1<'static, f64> {
        aview1(&[
            0.6756035959798289,
            -0.1756035959798288,
            -0.1756035959798288,
            0.6756035959798289,
        ])
    }

    fn kick() -> ArrayView1<'static, f64> {
        aview1(&[1.3512071919596578, -1.7024143839193153, 1.3512071919596578])
    }
}

/// Sixth-order composition of seven leapfrog steps (Yoshida's solution A).
///
/// # References
///
/// 1. H. Yoshida, "Construction of higher order symplectic integrators",
///    Phys. Lett. A, Vol. 150, pp. 262-268, 1990.
///
/// 2. H. Kinoshita, H. Yoshida, H. Nakai, "Symplectic integrators and their
///    application to dynamical astronomy", Celest. Mech. Dyn. Astron., Vol.
///    50, pp. 59-71, 1991.
pub struct Yoshida6;

impl CompositionMethod for Yoshida6 {
    const ORDER: usize = 6;

    fn drift() -> ArrayView1<'static, f64> {
        aview1(&[
            0.392256805238780,
            0.510043411918458,
            -0.471053385409758,
            0.687531682525198e-1,
            0.687531682525198e-1,
            -0.471053385409758,
            0.510043411918458,
            0.392256805238780,
        ])
    }

    fn kick() -> ArrayView1<'static, f64> {
        aview1(&[
            0.784513610477560,
            0.235573213359357,
            -0.117767998417887e1,
            0.131518632068391e1,
            -0.117767998417887e1,
            0.235573213359357,
            0.784513610477560,
        ])
    }
}

/// Something that can be drifted and kicked in place.
pub(crate) trait Flow {
    fn drift(&mut self, h: f64);
    fn kick(&mut self, h: f64, t: f64);
}

/// Applies `nsteps` elementary steps of size `dt` to `flow`, starting at time
/// `t`, and returns the time reached.
///
/// The closing drift of one step and the opening drift of the next are fused
/// into a single drift. A step count of zero is treated as one step.
pub(crate) fn compose<M, F>(flow: &mut F, t: f64, dt: f64, nsteps: usize) -> f64
where
    M: CompositionMethod,
    F: Flow,
{
    let c = M::drift();
    let d = M::kick();
    let last = c.len() - 1;
    debug_assert_eq!(last, d.len());
    let nsteps = nsteps.max(1);

    let mut t = t;
    flow.drift(c[0] * dt);
    t += c[0] * dt;
    for step in 0..nsteps {
        for (k, &dk) in d.iter().enumerate() {
            flow.kick(dk * dt, t);
            let h = if k + 1 < last || step + 1 == nsteps {
                c[k + 1]
            } else {
                c[last] + c[0]
            };
            flow.drift(h * dt);
            t += h * dt;
        }
    }
    t
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_consistency<M: CompositionMethod>() {
        let c = M::drift();
        let d = M::kick();
        assert_eq!(c.len(), d.len() + 1);
        assert!((c.sum() - 1.).abs() < 1e-14);
        assert!((d.sum() - 1.).abs() < 1e-14);
        for i in 0..c.len() {
            assert_eq!(c[i], c[c.len() - 1 - i]);
        }
        for i in 0..d.len() {
            assert_eq!(d[i], d[d.len() - 1 - i]);
        }
    }

    #[test]
    fn coefficients_are_symmetric_and_consistent() {
        check_consistency::<Leapfrog>();
        check_consistency::<Yoshida4>();
        check_consistency::<Yoshida6>();
    }

    /// Records the sequence of sub-steps.
    struct Recorder(Vec<(char, f64, f64)>);

    impl Flow for Recorder {
        fn drift(&mut self, h: f64) {
            self.0.push(('d', h, 0.));
        }
        fn kick(&mut self, h: f64, t: f64) {
            self.0.push(('k', h, t));
        }
    }

    #[test]
    fn leapfrog_fuses_drifts() {
        let mut rec = Recorder(Vec::new());
        let t = compose::<Leapfrog, _>(&mut rec, 1., 0.5, 3);
        assert_eq!(t, 2.5);
        assert_eq!(
            rec.0,
            vec![
                ('d', 0.25, 0.),
                ('k', 0.5, 1.25),
                ('d', 0.5, 0.),
                ('k', 0.5, 1.75),
                ('d', 0.5, 0.),
                ('k', 0.5, 2.25),
                ('d', 0.25, 0.),
            ]
        );
    }

    #[test]
    fn zero_steps_take_one_step() {
        let mut rec = Recorder(Vec::new());
        compose::<Yoshida4, _>(&mut rec, 0., 1., 0);
        assert_eq!(rec.0.len(), 7);
    }
}
