// Copyright 2025 Lars Brubaker
// License: MIT
//
// Fixed points of the C*-action, read off the fan.
//
// Which kinds exist is decided by the case alone: an end with an elliptic
// point contributes one cone of all extreme rays, an end with a parabolic
// curve contributes one 2-ray cone per block. Hyperbolic points sit between
// slope-adjacent rays of one block and exist in every case.

use std::fmt;

use super::{CStarSurface, Sign};
use crate::error::{Error, Result};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FixedPointKind {
    /// `x⁺` or `x⁻`.
    Elliptic(Sign),
    /// `x_ij`, between the rays at slope positions `position` and
    /// `position + 1` of block `block`.
    Hyperbolic { block: usize, position: usize },
    /// `x_i⁺` or `x_i⁻` on the parabolic curve of that end.
    Parabolic { sign: Sign, block: usize },
}

/// A fixed point, identified by the (sorted) ray indices of its cone.
///
/// The kind is a function of the cone, so equality, hashing and ordering
/// are effectively those of the index list.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FixedPoint {
    cone: Vec<usize>,
    kind: FixedPointKind,
}

impl FixedPoint {
    fn new(mut cone: Vec<usize>, kind: FixedPointKind) -> Self {
        cone.sort_unstable();
        FixedPoint { cone, kind }
    }

    pub fn cone(&self) -> &[usize] {
        &self.cone
    }

    pub fn kind(&self) -> FixedPointKind {
        self.kind
    }

    pub fn is_elliptic(&self) -> bool {
        matches!(self.kind, FixedPointKind::Elliptic(_))
    }

    pub fn is_hyperbolic(&self) -> bool {
        matches!(self.kind, FixedPointKind::Hyperbolic { .. })
    }

    pub fn is_parabolic(&self) -> bool {
        matches!(self.kind, FixedPointKind::Parabolic { .. })
    }
}

impl fmt::Display for FixedPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            FixedPointKind::Elliptic(sign) => write!(f, "x{}", sign),
            FixedPointKind::Hyperbolic { block, position } => write!(f, "x_{}{}", block, position),
            FixedPointKind::Parabolic { sign, block } => write!(f, "x_{}{}", block, sign),
        }
    }
}

impl CStarSurface {
    pub(crate) fn elliptic_cone(&self, sign: Sign) -> Vec<usize> {
        let mut cone: Vec<usize> = (0..=self.r())
            .filter_map(|i| self.l.flat_index(i, self.extreme(sign, i)))
            .collect();
        cone.sort_unstable();
        cone
    }

    pub(crate) fn parabolic_cone(&self, sign: Sign, i: usize) -> Vec<usize> {
        let mut cone = Vec::with_capacity(2);
        cone.extend(self.l.flat_index(i, self.extreme(sign, i)));
        cone.extend(self.apex_index(sign));
        cone
    }

    pub fn elliptic_fixed_point(&self, sign: Sign) -> Option<FixedPoint> {
        if !self.case.has_elliptic(sign) {
            return None;
        }
        Some(FixedPoint::new(
            self.elliptic_cone(sign),
            FixedPointKind::Elliptic(sign),
        ))
    }

    pub fn elliptic_fixed_points(&self) -> Vec<FixedPoint> {
        Sign::BOTH
            .into_iter()
            .filter_map(|sign| self.elliptic_fixed_point(sign))
            .collect()
    }

    /// Hyperbolic point between slope positions `position` and
    /// `position + 1` of block `block`.
    pub fn hyperbolic_fixed_point(&self, block: usize, position: usize) -> Result<FixedPoint> {
        if block > self.r() || position + 1 >= self.l.block_len(block) {
            return Err(Error::IndexOutOfRange {
                block,
                index: position,
            });
        }
        let order = &self.slope_order[block];
        let cone = [order[position], order[position + 1]]
            .iter()
            .filter_map(|&j| self.l.flat_index(block, j))
            .collect();
        Ok(FixedPoint::new(
            cone,
            FixedPointKind::Hyperbolic { block, position },
        ))
    }

    pub fn hyperbolic_fixed_points(&self) -> Vec<FixedPoint> {
        (0..=self.r())
            .flat_map(|i| (0..self.l.block_len(i).saturating_sub(1)).map(move |p| (i, p)))
            .filter_map(|(i, p)| self.hyperbolic_fixed_point(i, p).ok())
            .collect()
    }

    pub fn parabolic_fixed_point(&self, sign: Sign, block: usize) -> Result<FixedPoint> {
        if !self.case.has_parabolic(sign) {
            return Err(Error::NoParabolicCurve(sign));
        }
        if block > self.r() {
            return Err(Error::IndexOutOfRange { block, index: 0 });
        }
        Ok(FixedPoint::new(
            self.parabolic_cone(sign, block),
            FixedPointKind::Parabolic { sign, block },
        ))
    }

    pub fn parabolic_fixed_points(&self) -> Vec<FixedPoint> {
        Sign::BOTH
            .into_iter()
            .filter(|&sign| self.case.has_parabolic(sign))
            .flat_map(|sign| (0..=self.r()).map(move |i| (sign, i)))
            .filter_map(|(sign, i)| self.parabolic_fixed_point(sign, i).ok())
            .collect()
    }

    /// Elliptic, then hyperbolic, then parabolic fixed points.
    pub fn fixed_points(&self) -> Vec<FixedPoint> {
        let mut points = self.elliptic_fixed_points();
        points.extend(self.hyperbolic_fixed_points());
        points.extend(self.parabolic_fixed_points());
        points
    }
}
