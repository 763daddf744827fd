// Copyright 2025 Lars Brubaker
// License: MIT
//
// Resolution of singularities.
//
// The canonical resolution subdivides every 2-dimensional cone around a
// fixed point with the Hirzebruch-Jung algorithm and replaces each elliptic
// point by a parabolic fixed point curve. New rays are appended to the end
// of their block, so the rays of the original surface keep their indices.
// The result always has both apex rays and is smooth.
//
// The minimal resolution then contracts exceptional (-1)-curves one at a
// time until none is left. Each contraction produces a fresh snapshot: a
// new surface with one ray fewer and every surviving divisor re-indexed.

use std::collections::BTreeMap;

use num_rational::Rational64;
use num_traits::One;
use tracing::{debug, trace};

use crate::block::BlockVec;
use crate::divisor::InvariantDivisor;
use crate::error::{Error, Result};
use crate::lattice::{resolve_cone, Vec2};
use crate::surface::{CStarSurface, Case, FixedPoint, FixedPointKind, RayRef};

/// A resolved surface together with the exceptional divisors over each
/// fixed point of the surface it came from.
///
/// `exceptional_divisors[p]` and `discrepancies[p]` have the same length
/// and order. Every fixed point of the original surface is a key, even when
/// nothing lies over it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    surface: CStarSurface,
    exceptional_divisors: BTreeMap<FixedPoint, Vec<InvariantDivisor>>,
    discrepancies: BTreeMap<FixedPoint, Vec<Rational64>>,
}

impl Resolution {
    pub fn surface(&self) -> &CStarSurface {
        &self.surface
    }

    pub fn exceptional_divisors(&self) -> &BTreeMap<FixedPoint, Vec<InvariantDivisor>> {
        &self.exceptional_divisors
    }

    pub fn discrepancies(&self) -> &BTreeMap<FixedPoint, Vec<Rational64>> {
        &self.discrepancies
    }

    /// Exceptional divisors over `point`, or `None` if `point` is not a
    /// fixed point of the original surface.
    pub fn exceptional_divisors_over(&self, point: &FixedPoint) -> Option<&[InvariantDivisor]> {
        self.exceptional_divisors.get(point).map(Vec::as_slice)
    }

    pub fn discrepancies_over(&self, point: &FixedPoint) -> Option<&[Rational64]> {
        self.discrepancies.get(point).map(Vec::as_slice)
    }

    /// Total number of exceptional divisors.
    pub fn exceptional_count(&self) -> usize {
        self.exceptional_divisors.values().map(Vec::len).sum()
    }

    /// Rays of all exceptional divisors, bucket by bucket.
    pub fn exceptional_rays(&self) -> Result<Vec<RayRef>> {
        self.exceptional_divisors
            .values()
            .flatten()
            .map(prime_ray)
            .collect()
    }

    pub fn into_parts(
        self,
    ) -> (
        CStarSurface,
        BTreeMap<FixedPoint, Vec<InvariantDivisor>>,
        BTreeMap<FixedPoint, Vec<Rational64>>,
    ) {
        (self.surface, self.exceptional_divisors, self.discrepancies)
    }

    /// First exceptional (-1)-curve, scanning buckets in key order and each
    /// bucket front to back. Returns the bucket and the position in it.
    pub fn find_minus_one_curve(&self) -> Result<Option<(FixedPoint, usize)>> {
        for (point, divisors) in &self.exceptional_divisors {
            for (position, divisor) in divisors.iter().enumerate() {
                let ray = prime_ray(divisor)?;
                if self.surface.self_intersection(ray)? == -Rational64::one() {
                    return Ok(Some((point.clone(), position)));
                }
            }
        }
        Ok(None)
    }

    pub fn is_minimal(&self) -> Result<bool> {
        Ok(self.find_minus_one_curve()?.is_none())
    }

    /// Contracts the exceptional divisor at `position` over `point`.
    ///
    /// The divisor leaves its bucket, its discrepancy goes with it, and
    /// every other divisor is rewritten for the smaller surface.
    pub fn contract(&self, point: &FixedPoint, position: usize) -> Result<Resolution> {
        let bucket = self
            .exceptional_divisors
            .get(point)
            .ok_or_else(|| Error::InvariantViolation(format!("{} is not a resolved point", point)))?;
        let divisor = bucket.get(position).ok_or_else(|| {
            Error::InvariantViolation(format!("{} has no exceptional divisor {}", point, position))
        })?;
        let ray = prime_ray(divisor)?;
        trace!(%point, position, ?ray, "contracting exceptional curve");

        let surface = self.surface.contract(ray)?;
        let mut exceptional_divisors = BTreeMap::new();
        for (key, divisors) in &self.exceptional_divisors {
            let kept = divisors
                .iter()
                .enumerate()
                .filter(|&(k, _)| !(key == point && k == position))
                .map(|(_, divisor)| divisor.delete_ray(ray))
                .collect::<Result<Vec<_>>>()?;
            exceptional_divisors.insert(key.clone(), kept);
        }
        let mut discrepancies = self.discrepancies.clone();
        if let Some(values) = discrepancies.get_mut(point) {
            if position < values.len() {
                values.remove(position);
            }
        }
        Ok(Resolution {
            surface,
            exceptional_divisors,
            discrepancies,
        })
    }

    /// Contracts exceptional (-1)-curves until none is left.
    pub fn minimize(&self) -> Result<Resolution> {
        let mut current = self.clone();
        let mut steps = 0usize;
        while let Some((point, position)) = current.find_minus_one_curve()? {
            current = current.contract(&point, position)?;
            steps += 1;
        }
        debug!(
            steps,
            remaining = current.exceptional_count(),
            "minimal resolution reached"
        );
        Ok(current)
    }
}

fn prime_ray(divisor: &InvariantDivisor) -> Result<RayRef> {
    divisor.as_prime().ok_or_else(|| {
        Error::InvariantViolation("exceptional divisor is not a prime divisor".into())
    })
}

// ──────────────────────────── Canonical stage ──────────────────────────────

/// Working state of the canonical resolution: the growing block data and
/// the rays inserted over each fixed point.
struct Subdivision {
    l: BlockVec<i64>,
    d: BlockVec<i64>,
    inserted: BTreeMap<FixedPoint, Vec<(RayRef, Rational64)>>,
}

impl Subdivision {
    fn new(surface: &CStarSurface) -> Self {
        Subdivision {
            l: surface.l().clone(),
            d: surface.d().clone(),
            inserted: BTreeMap::new(),
        }
    }

    /// Resolves the cone spanned by `u` and `w` in the plane of block
    /// `block` and appends the new rays to that block.
    fn subdivide(
        &mut self,
        block: usize,
        u: Vec2,
        w: Vec2,
        log_discrepancies: (Rational64, Rational64),
    ) -> Result<Vec<(RayRef, Rational64)>> {
        let mut added = Vec::new();
        for resolved in resolve_cone(u, w, log_discrepancies)? {
            let [l, d] = resolved.ray;
            let index = self.l.push(block, l);
            self.d.push(block, d);
            added.push((RayRef::Block { block, index }, resolved.discrepancy));
        }
        Ok(added)
    }

    fn record(&mut self, point: FixedPoint, rays: Vec<(RayRef, Rational64)>) {
        debug!(%point, count = rays.len(), "resolved fixed point");
        self.inserted.insert(point, rays);
    }
}

impl CStarSurface {
    fn block_vector(&self, i: usize, j: usize) -> Vec2 {
        [self.l()[(i, j)], self.d()[(i, j)]]
    }

    /// The canonical resolution.
    pub fn resolution(&self) -> Result<Resolution> {
        let mut work = Subdivision::new(self);
        let one = Rational64::one();

        for point in self.fixed_points() {
            let rays = match point.kind() {
                FixedPointKind::Hyperbolic { block, position } => {
                    let order = self.descending(block);
                    let u = self.block_vector(block, order[position]);
                    let w = self.block_vector(block, order[position + 1]);
                    work.subdivide(block, u, w, (one, one))?
                }
                FixedPointKind::Parabolic { sign, block } => {
                    let u = self.block_vector(block, self.extreme(sign, block));
                    work.subdivide(block, u, [0, sign.unit()], (one, one))?
                }
                FixedPointKind::Elliptic(sign) => {
                    // log discrepancy of the parabolic curve replacing x±
                    let apex = self.l_sum(sign) / self.slope_sum(sign);
                    let mut rays = Vec::new();
                    for block in 0..=self.r() {
                        let u = self.block_vector(block, self.extreme(sign, block));
                        rays.extend(work.subdivide(block, u, [0, sign.unit()], (one, apex))?);
                    }
                    rays.push((RayRef::Apex(sign), apex - one));
                    rays
                }
            };
            work.record(point, rays);
        }

        let surface = CStarSurface::from_blocks(work.l, work.d, Case::Pp)?;
        debug!(
            rays_before = self.ray_count(),
            rays_after = surface.ray_count(),
            "canonical resolution built"
        );

        let mut exceptional_divisors = BTreeMap::new();
        let mut discrepancies = BTreeMap::new();
        for (point, rays) in work.inserted {
            let divisors = rays
                .iter()
                .map(|&(ray, _)| InvariantDivisor::prime(&surface, ray))
                .collect::<Result<Vec<_>>>()?;
            discrepancies.insert(point.clone(), rays.into_iter().map(|(_, a)| a).collect());
            exceptional_divisors.insert(point, divisors);
        }
        Ok(Resolution {
            surface,
            exceptional_divisors,
            discrepancies,
        })
    }

    /// The minimal resolution: the canonical one with all exceptional
    /// (-1)-curves contracted.
    pub fn minimal_resolution(&self) -> Result<Resolution> {
        self.resolution()?.minimize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::Sign;

    fn quotient_pp() -> CStarSurface {
        // singular at x_00 and at x_0-
        CStarSurface::new(vec![vec![1, 3], vec![1]], vec![vec![1, -2], vec![0]], Case::Pp).unwrap()
    }

    #[test]
    fn hyperbolic_point_gets_a_chain() {
        let x = quotient_pp();
        let res = x.resolution().unwrap();
        let point = x.hyperbolic_fixed_point(0, 0).unwrap();
        // cone((1,1), (3,-2)) has det -5
        let divisors = res.exceptional_divisors_over(&point).unwrap();
        assert!(!divisors.is_empty());
        for divisor in divisors {
            match divisor.as_prime().unwrap() {
                RayRef::Block { block, index } => {
                    assert_eq!(block, 0);
                    assert!(index >= 2);
                }
                other => panic!("unexpected ray {:?}", other),
            }
        }
        assert_eq!(res.discrepancies_over(&point).unwrap().len(), divisors.len());
        assert!(res.surface().is_smooth());
    }

    #[test]
    fn original_rays_keep_their_indices() {
        let x = quotient_pp();
        let y = x.resolution().unwrap().surface().clone();
        for (i, block) in x.l().blocks().iter().enumerate() {
            assert_eq!(&y.l().block(i)[..block.len()], block.as_slice());
            assert_eq!(&y.d().block(i)[..block.len()], x.d().block(i));
        }
    }

    #[test]
    fn elliptic_points_become_parabolic_curves() {
        let x = CStarSurface::new(
            vec![vec![3, 1], vec![3], vec![2]],
            vec![vec![-2, -1], vec![1], vec![1]],
            Case::Ee,
        )
        .unwrap();
        let res = x.resolution().unwrap();
        assert_eq!(res.surface().case(), Case::Pp);
        for sign in Sign::BOTH {
            let point = x.elliptic_fixed_point(sign).unwrap();
            let last = res.exceptional_divisors_over(&point).unwrap().last().unwrap();
            assert_eq!(last.as_prime(), Some(RayRef::Apex(sign)));
        }
    }

    #[test]
    fn contraction_removes_the_entry_and_reindexes() {
        let x = CStarSurface::new(
            vec![vec![3, 1], vec![3], vec![2]],
            vec![vec![-2, -1], vec![1], vec![1]],
            Case::Ee,
        )
        .unwrap();
        let res = x.resolution().unwrap();
        let (point, position) = res.find_minus_one_curve().unwrap().unwrap();
        let before = res.exceptional_count();
        let next = res.contract(&point, position).unwrap();
        assert_eq!(next.exceptional_count(), before - 1);
        assert_eq!(next.surface().ray_count(), res.surface().ray_count() - 1);
        for divisor in next.exceptional_divisors().values().flatten() {
            assert!(divisor.fits(next.surface()));
        }
        assert!(res.contract(&point, 99).is_err());
    }
}
