// Copyright 2025 Lars Brubaker
// License: MIT
//
// Local properties of fixed points. Singular points of a normal C*-surface
// are fixed points, so surface-level predicates quantify over fixed points.
//
// The per-point queries take a FixedPoint by reference and reject points
// that do not belong to this surface.

use num_traits::Zero;

use super::{CStarSurface, FixedPoint, FixedPointKind, Sign};
use crate::error::{Error, Result};

impl CStarSurface {
    fn check_fixed_point(&self, point: &FixedPoint) -> Result<()> {
        if self.fixed_points().contains(point) {
            Ok(())
        } else {
            Err(Error::UnknownFixedPoint(point.to_string()))
        }
    }

    /// Order of the local class group at a fixed point: the index of the
    /// sublattice spanned by the rays of its cone.
    pub fn local_class_group_order(&self, point: &FixedPoint) -> Result<u64> {
        self.check_fixed_point(point)?;
        self.class_group_order(point.kind())
    }

    /// The total coordinate space is smooth over the point. Only elliptic
    /// points can fail: at most two extreme rays may have `l > 1`.
    pub fn is_quasismooth_point(&self, point: &FixedPoint) -> Result<bool> {
        self.check_fixed_point(point)?;
        Ok(self.quasismooth_at(point.kind()))
    }

    /// Hyperbolic and parabolic points are toric and always log terminal;
    /// an elliptic point is log terminal iff `l± > 0`.
    pub fn is_log_terminal_point(&self, point: &FixedPoint) -> Result<bool> {
        self.check_fixed_point(point)?;
        Ok(self.log_terminal_at(point.kind()))
    }

    pub fn is_smooth_point(&self, point: &FixedPoint) -> Result<bool> {
        self.check_fixed_point(point)?;
        Ok(self.smooth_at(point.kind()))
    }

    pub fn is_quasismooth(&self) -> bool {
        self.fixed_points().iter().all(|p| self.quasismooth_at(p.kind()))
    }

    pub fn is_log_terminal(&self) -> bool {
        self.fixed_points().iter().all(|p| self.log_terminal_at(p.kind()))
    }

    pub fn is_smooth(&self) -> bool {
        self.fixed_points().iter().all(|p| self.smooth_at(p.kind()))
    }

    /// Fixed points that are not smooth.
    pub fn singular_points(&self) -> Vec<FixedPoint> {
        self.fixed_points()
            .into_iter()
            .filter(|p| !self.smooth_at(p.kind()))
            .collect()
    }

    // ── unchecked kernels, valid for kinds produced by fixed_points() ──

    fn extreme_vector(&self, sign: Sign, i: usize) -> (i128, i128) {
        let j = self.extreme(sign, i);
        (i128::from(self.l[(i, j)]), i128::from(self.d[(i, j)]))
    }

    fn class_group_order(&self, kind: FixedPointKind) -> Result<u64> {
        let order = match kind {
            FixedPointKind::Hyperbolic { block, position } => {
                let order = &self.slope_order[block];
                let (a, b) = (order[position], order[position + 1]);
                let (l_a, d_a) = (i128::from(self.l[(block, a)]), i128::from(self.d[(block, a)]));
                let (l_b, d_b) = (i128::from(self.l[(block, b)]), i128::from(self.d[(block, b)]));
                l_a * d_b - d_a * l_b
            }
            FixedPointKind::Parabolic { sign, block } => self.extreme_vector(sign, block).0,
            FixedPointKind::Elliptic(sign) => {
                // Π l_i · m± = ±Σ_i d_i Π_{k≠i} l_k
                let extremes: Vec<(i128, i128)> =
                    (0..=self.r()).map(|i| self.extreme_vector(sign, i)).collect();
                let mut sum: i128 = 0;
                for (i, &(_, d_i)) in extremes.iter().enumerate() {
                    let mut term = d_i;
                    for (k, &(l_k, _)) in extremes.iter().enumerate() {
                        if k != i {
                            term = term.checked_mul(l_k).ok_or_else(overflow)?;
                        }
                    }
                    sum = sum.checked_add(term).ok_or_else(overflow)?;
                }
                sum
            }
        };
        u64::try_from(order.unsigned_abs()).map_err(|_| overflow())
    }

    fn quasismooth_at(&self, kind: FixedPointKind) -> bool {
        match kind {
            FixedPointKind::Elliptic(sign) => {
                (0..=self.r())
                    .filter(|&i| self.extreme_vector(sign, i).0 > 1)
                    .count()
                    <= 2
            }
            _ => true,
        }
    }

    fn log_terminal_at(&self, kind: FixedPointKind) -> bool {
        match kind {
            FixedPointKind::Elliptic(sign) => self.l_sum(sign) > Zero::zero(),
            _ => true,
        }
    }

    // an order too large for u64 is not 1
    fn smooth_at(&self, kind: FixedPointKind) -> bool {
        self.quasismooth_at(kind) && matches!(self.class_group_order(kind), Ok(1))
    }
}

fn overflow() -> Error {
    Error::InvariantViolation("local class group order does not fit in 64 bits".into())
}
