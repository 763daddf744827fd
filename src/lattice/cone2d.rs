// Copyright 2025 Lars Brubaker
// License: MIT
//
// Hirzebruch-Jung resolution of a two-dimensional lattice cone.
//
// The cone spanned by primitive u and w (|det(u, w)| = n) is subdivided by
// the lattice points on the compact boundary of conv(cone ∩ Z² \ {0}).
// Starting at u, the next boundary ray is the unique lattice point
// (k·u + w)/n with 0 < k < n; it has det(u, ·) = det(u, w)/n, so the cone
// between them is regular and we continue from the new ray until the
// remaining cone is regular.

use num_integer::Integer;
use num_rational::Rational64;
use num_traits::One;
use tracing::trace;

use super::{det2, is_primitive, Vec2};
use crate::error::{Error, Result};

/// A ray inserted by [`resolve_cone`] together with its discrepancy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedRay {
    pub ray: Vec2,
    pub discrepancy: Rational64,
}

/// Resolves the cone spanned by `u` and `w`.
///
/// `log_discrepancies` are the log discrepancies of the boundary rays `u`
/// and `w`. A new ray `v` gets discrepancy `φ(v) - 1`, where `φ` is the
/// linear form with `φ(u)` and `φ(w)` equal to the given values.
///
/// The returned rays are ordered from `u` towards `w`; inserting them
/// between `u` and `w` makes every consecutive pair span a regular cone.
/// An already regular cone yields an empty list.
pub fn resolve_cone(
    u: Vec2,
    w: Vec2,
    log_discrepancies: (Rational64, Rational64),
) -> Result<Vec<ResolvedRay>> {
    if !is_primitive(&u) || !is_primitive(&w) {
        return Err(Error::InvariantViolation(format!(
            "cone generators {:?} and {:?} must be primitive",
            u, w
        )));
    }
    let det = det2(u, w);
    if det == 0 {
        return Err(Error::InvariantViolation(format!(
            "cone generators {:?} and {:?} are collinear",
            u, w
        )));
    }

    let (a_u, a_w) = log_discrepancies;
    let log_discrepancy = |v: Vec2| {
        // v = s·u + t·w
        let s = Rational64::new(det2(v, w), det);
        let t = Rational64::new(det2(u, v), det);
        s * a_u + t * a_w
    };

    let mut rays = Vec::new();
    let mut current = u;
    while det2(current, w).abs() > 1 {
        let next = next_boundary_ray(current, w);
        trace!(?current, ?next, "hirzebruch-jung step");
        rays.push(ResolvedRay {
            ray: next,
            discrepancy: log_discrepancy(next) - Rational64::one(),
        });
        current = next;
    }
    Ok(rays)
}

/// First lattice point after `u` on the boundary of the cone hull.
/// Requires `u` primitive and `|det(u, w)| > 1`.
fn next_boundary_ray(u: Vec2, w: Vec2) -> Vec2 {
    let n = det2(u, w).abs();
    // (x, y) with x·u0 + y·u1 = 1 completes u to a unimodular basis; in
    // that basis w has first coordinate x·w0 + y·w1.
    let egcd = u[0].extended_gcd(&u[1]);
    let (x, y) = if egcd.gcd < 0 {
        (-egcd.x, -egcd.y)
    } else {
        (egcd.x, egcd.y)
    };
    let w_first = x * w[0] + y * w[1];
    let k = (-w_first).mod_floor(&n);
    debug_assert!((k * u[0] + w[0]) % n == 0 && (k * u[1] + w[1]) % n == 0);
    [(k * u[0] + w[0]) / n, (k * u[1] + w[1]) / n]
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::Zero;

    fn one() -> Rational64 {
        Rational64::one()
    }

    fn rays(resolved: &[ResolvedRay]) -> Vec<Vec2> {
        resolved.iter().map(|r| r.ray).collect()
    }

    #[test]
    fn regular_cone_needs_nothing() {
        let out = resolve_cone([1, 0], [0, 1], (one(), one())).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn a2_chain_towards_apex() {
        let out = resolve_cone([3, -2], [0, 1], (one(), one())).unwrap();
        assert_eq!(rays(&out), vec![[2, -1], [1, 0]]);
        assert!(out.iter().all(|r| r.discrepancy.is_zero()));
    }

    #[test]
    fn apex_side_and_reverse_orientation() {
        let out = resolve_cone([0, 1], [3, -2], (one(), one())).unwrap();
        assert_eq!(rays(&out), vec![[1, 0], [2, -1]]);

        let out = resolve_cone([3, 1], [0, -1], (one(), one())).unwrap();
        assert_eq!(rays(&out), vec![[1, 0]]);
    }

    #[test]
    fn consecutive_rays_are_regular() {
        let u = [7, 3];
        let w = [2, -5];
        let out = resolve_cone(u, w, (one(), one())).unwrap();
        let mut chain = vec![u];
        chain.extend(rays(&out));
        chain.push(w);
        for pair in chain.windows(2) {
            assert_eq!(det2(pair[0], pair[1]).abs(), 1, "{:?}", pair);
        }
    }

    #[test]
    fn cyclic_quotient_one_half() {
        // cone((1,1), (1,-1)) is the A1 singularity: one (-2)-curve, crepant.
        let out = resolve_cone([1, 1], [1, -1], (one(), one())).unwrap();
        assert_eq!(rays(&out), vec![[1, 0]]);
        assert!(out[0].discrepancy.is_zero());
    }

    #[test]
    fn a2_is_crepant() {
        let out = resolve_cone([1, 0], [1, 3], (one(), one())).unwrap();
        assert_eq!(rays(&out), vec![[1, 1], [1, 2]]);
        assert!(out.iter().all(|r| r.discrepancy.is_zero()));
    }

    #[test]
    fn weighted_boundary_discrepancy() {
        // 1/3(1,1): a single (-3)-curve with discrepancy -1/3.
        let out = resolve_cone([1, 0], [-1, 3], (one(), one())).unwrap();
        assert_eq!(rays(&out), vec![[0, 1]]);
        assert_eq!(out[0].discrepancy, Rational64::new(-1, 3));

        let weighted = resolve_cone([1, 0], [-1, 3], (one(), Rational64::from(4))).unwrap();
        assert_eq!(weighted[0].discrepancy, Rational64::new(2, 3));
    }

    #[test]
    fn invalid_generators_are_rejected() {
        assert!(matches!(
            resolve_cone([2, 4], [0, 1], (one(), one())),
            Err(Error::InvariantViolation(_))
        ));
        assert!(matches!(
            resolve_cone([1, 2], [-1, -2], (one(), one())),
            Err(Error::InvariantViolation(_))
        ));
    }
}
