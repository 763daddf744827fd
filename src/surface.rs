// Copyright 2025 Lars Brubaker
// License: MIT
//
// The surface model: a rational C*-surface given by its defining data.
//
// A surface is determined by two block-indexed integer vectors l and d of
// the same shape and a case tag fixing which ends of the C*-action carry
// an elliptic fixed point and which carry a parabolic fixed point curve.
// Ray (i, j) of the fan is l[i][j]·e_i + d[i][j]·e_{r+1} in Z^{r+1}, where
// e_0 = -(e_1 + ... + e_r).
//
// The model is immutable. Everything else in the crate (fan, fixed points,
// intersection numbers, resolution) is derived from it; resolution and
// contraction produce new models instead of mutating one.
//
// The impl of CStarSurface is split across this file and surface/*.rs.

mod fan;
mod fixed_points;
mod intersection;
mod singularities;


use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use num_rational::Rational64;
use num_traits::{One, Zero};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::block::BlockVec;
use crate::error::{Error, Result};
use crate::lattice::{is_coprime, slope, slope_cmp};

pub use fan::Fan;
pub use fixed_points::{FixedPoint, FixedPointKind};

// ─────────────────────────────── Tags ──────────────────────────────────────

/// Which ends of the action carry an elliptic point (`e`) or a parabolic
/// fixed point curve (`p`). The first letter is the source (`+`) end.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Case {
    Ee,
    Pe,
    Ep,
    Pp,
}

impl Case {
    pub fn from_sides(elliptic_plus: bool, elliptic_minus: bool) -> Case {
        match (elliptic_plus, elliptic_minus) {
            (true, true) => Case::Ee,
            (false, true) => Case::Pe,
            (true, false) => Case::Ep,
            (false, false) => Case::Pp,
        }
    }

    pub fn has_elliptic(self, sign: Sign) -> bool {
        match sign {
            Sign::Plus => matches!(self, Case::Ee | Case::Ep),
            Sign::Minus => matches!(self, Case::Ee | Case::Pe),
        }
    }

    pub fn has_parabolic(self, sign: Sign) -> bool {
        !self.has_elliptic(sign)
    }

    /// Number of apex rays `±e_{r+1}` in the fan.
    pub fn parabolic_ray_count(self) -> usize {
        match self {
            Case::Ee => 0,
            Case::Pe | Case::Ep => 1,
            Case::Pp => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Case::Ee => "ee",
            Case::Pe => "pe",
            Case::Ep => "ep",
            Case::Pp => "pp",
        }
    }
}

impl fmt::Display for Case {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Case {
    type Err = Error;

    fn from_str(s: &str) -> Result<Case> {
        match s {
            "ee" => Ok(Case::Ee),
            "pe" => Ok(Case::Pe),
            "ep" => Ok(Case::Ep),
            "pp" => Ok(Case::Pp),
            other => Err(Error::UnknownCase(other.to_string())),
        }
    }
}

/// The source (`+`) or sink (`-`) end of the action.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Sign {
    Plus,
    Minus,
}

impl Sign {
    pub const BOTH: [Sign; 2] = [Sign::Plus, Sign::Minus];

    /// +1 or -1, the sign of the apex ray's last coordinate.
    pub fn unit(self) -> i64 {
        match self {
            Sign::Plus => 1,
            Sign::Minus => -1,
        }
    }
}

impl fmt::Display for Sign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Sign::Plus => "+",
            Sign::Minus => "-",
        })
    }
}

/// Names one ray of the fan, i.e. one invariant prime divisor.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RayRef {
    /// Ray `(i, j)`, with `j` the position inside block `i` as stored in
    /// `l` and `d` (not the slope order).
    Block { block: usize, index: usize },
    /// The apex ray `+e_{r+1}` or `-e_{r+1}` of a parabolic end.
    Apex(Sign),
}

// ─────────────────────────── Surface model ─────────────────────────────────

/// Plain serializable parameters of a surface.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceParams {
    pub l: Vec<Vec<i64>>,
    pub d: Vec<Vec<i64>>,
    pub case: Case,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "SurfaceParams", into = "SurfaceParams")]
pub struct CStarSurface {
    l: BlockVec<i64>,
    d: BlockVec<i64>,
    case: Case,
    slopes: BlockVec<Rational64>,
    /// Per block, element indices sorted by descending slope.
    slope_order: Vec<Vec<usize>>,
    intersection_cache: OnceLock<Vec<Vec<Rational64>>>,
}

impl CStarSurface {
    pub fn new(l: Vec<Vec<i64>>, d: Vec<Vec<i64>>, case: Case) -> Result<Self> {
        Self::from_blocks(BlockVec::new(l), BlockVec::new(d), case)
    }

    pub fn from_blocks(l: BlockVec<i64>, d: BlockVec<i64>, case: Case) -> Result<Self> {
        if !l.same_shape(&d) {
            debug!("rejecting surface: l and d differ in shape");
            return Err(Error::ShapeMismatch);
        }
        if l.block_count() < 2 {
            return Err(Error::TooFewBlocks(l.block_count()));
        }
        if let Some(i) = (0..l.block_count()).find(|&i| l.block_len(i) == 0) {
            return Err(Error::EmptyBlock(i));
        }
        for ((i, j), &lij) in l.iter() {
            let dij = d[(i, j)];
            if lij <= 0 {
                debug!(block = i, index = j, l = lij, "rejecting surface: l not positive");
                return Err(Error::NonPositiveL {
                    block: i,
                    index: j,
                    value: lij,
                });
            }
            if !is_coprime(lij, dij) {
                debug!(block = i, index = j, l = lij, d = dij, "rejecting surface: not coprime");
                return Err(Error::NotCoprime {
                    block: i,
                    index: j,
                    l: lij,
                    d: dij,
                });
            }
        }

        let slopes = l.zip_with(&d, |&l, &d| slope(l, d)).ok_or(Error::ShapeMismatch)?;
        let slope_order: Vec<Vec<usize>> = (0..l.block_count())
            .map(|i| {
                let mut order: Vec<usize> = (0..l.block_len(i)).collect();
                // Descending slope; ties are duplicate rays and rejected below.
                order.sort_by(|&a, &b| {
                    slope_cmp(l[(i, b)], d[(i, b)], l[(i, a)], d[(i, a)]).then(a.cmp(&b))
                });
                order
            })
            .collect();
        for (i, order) in slope_order.iter().enumerate() {
            for pair in order.windows(2) {
                if slopes[(i, pair[0])] == slopes[(i, pair[1])] {
                    let (first, second) = (pair[0].min(pair[1]), pair[0].max(pair[1]));
                    return Err(Error::DuplicateRay {
                        block: i,
                        first,
                        second,
                    });
                }
            }
        }

        let surface = CStarSurface {
            l,
            d,
            case,
            slopes,
            slope_order,
            intersection_cache: OnceLock::new(),
        };
        for sign in Sign::BOTH {
            if case.has_elliptic(sign) {
                let value = surface.slope_sum(sign);
                if value <= Rational64::zero() {
                    debug!(%sign, %value, "rejecting surface: elliptic cone not pointed");
                    return Err(Error::DegenerateEllipticPoint { sign, value });
                }
            }
        }
        Ok(surface)
    }

    // ── defining data ──

    pub fn l(&self) -> &BlockVec<i64> {
        &self.l
    }

    pub fn d(&self) -> &BlockVec<i64> {
        &self.d
    }

    pub fn case(&self) -> Case {
        self.case
    }

    pub fn params(&self) -> SurfaceParams {
        SurfaceParams {
            l: self.l.blocks().to_vec(),
            d: self.d.blocks().to_vec(),
            case: self.case,
        }
    }

    // ── derived sizes ──

    /// Number of blocks minus one.
    pub fn r(&self) -> usize {
        self.l.block_count() - 1
    }

    /// Total number of block rays.
    pub fn n(&self) -> usize {
        self.l.total_len()
    }

    /// Number of apex rays.
    pub fn m(&self) -> usize {
        self.case.parabolic_ray_count()
    }

    pub fn block_sizes(&self) -> Vec<usize> {
        self.l.block_lens()
    }

    pub fn ray_count(&self) -> usize {
        self.n() + self.m()
    }

    /// Rank of the lattice the fan lives in.
    pub fn lattice_rank(&self) -> usize {
        self.r() + 1
    }

    pub fn has_elliptic_point(&self, sign: Sign) -> bool {
        self.case.has_elliptic(sign)
    }

    pub fn has_parabolic_curve(&self, sign: Sign) -> bool {
        self.case.has_parabolic(sign)
    }

    // ── slopes ──

    pub fn slopes(&self) -> &BlockVec<Rational64> {
        &self.slopes
    }

    pub fn slope(&self, i: usize, j: usize) -> Result<Rational64> {
        self.slopes
            .get(i, j)
            .copied()
            .ok_or(Error::IndexOutOfRange { block: i, index: j })
    }

    /// Element indices of block `i` sorted by descending slope.
    pub fn slope_order(&self, i: usize) -> Result<&[usize]> {
        self.slope_order
            .get(i)
            .map(Vec::as_slice)
            .ok_or(Error::IndexOutOfRange { block: i, index: 0 })
    }

    /// Element index of the ray of block `i` closest to the given end:
    /// largest slope for `+`, smallest for `-`.
    pub fn extreme_index(&self, sign: Sign, i: usize) -> Result<usize> {
        if i < self.slope_order.len() {
            Ok(self.extreme(sign, i))
        } else {
            Err(Error::IndexOutOfRange { block: i, index: 0 })
        }
    }

    // Blocks are never empty, so both ends exist for any `i <= r`.
    pub(crate) fn descending(&self, i: usize) -> &[usize] {
        &self.slope_order[i]
    }

    pub(crate) fn extreme(&self, sign: Sign, i: usize) -> usize {
        let order = &self.slope_order[i];
        match sign {
            Sign::Plus => order[0],
            Sign::Minus => order[order.len() - 1],
        }
    }

    /// `m⁺ = Σ_i max_j slope` or `m⁻ = -Σ_i min_j slope`.
    pub fn slope_sum(&self, sign: Sign) -> Rational64 {
        let sum: Rational64 = (0..=self.r())
            .map(|i| self.slopes[(i, self.extreme(sign, i))])
            .sum();
        match sign {
            Sign::Plus => sum,
            Sign::Minus => -sum,
        }
    }

    pub fn m_plus(&self) -> Rational64 {
        self.slope_sum(Sign::Plus)
    }

    pub fn m_minus(&self) -> Rational64 {
        self.slope_sum(Sign::Minus)
    }

    /// `l± = Σ_i 1/l_i,extreme - (r - 1)`.
    pub fn l_sum(&self, sign: Sign) -> Rational64 {
        let inverse_sum: Rational64 = (0..=self.r())
            .map(|i| Rational64::new(1, self.l[(i, self.extreme(sign, i))]))
            .sum();
        inverse_sum - Rational64::from(self.r() as i64) + Rational64::one()
    }

    pub fn l_plus(&self) -> Rational64 {
        self.l_sum(Sign::Plus)
    }

    pub fn l_minus(&self) -> Rational64 {
        self.l_sum(Sign::Minus)
    }

    // ── ray addressing ──

    /// Position of a ray in the fan's ray list: block rays in block-major
    /// order, then `+e_{r+1}`, then `-e_{r+1}`.
    pub fn ray_index(&self, ray: RayRef) -> Result<usize> {
        match ray {
            RayRef::Block { block, index } => self
                .l
                .flat_index(block, index)
                .ok_or(Error::IndexOutOfRange { block, index }),
            RayRef::Apex(sign) => self.apex_index(sign).ok_or(Error::NoParabolicCurve(sign)),
        }
    }

    pub fn apex_index(&self, sign: Sign) -> Option<usize> {
        match sign {
            Sign::Plus if self.case.has_parabolic(Sign::Plus) => Some(self.n()),
            Sign::Minus if self.case.has_parabolic(Sign::Minus) => {
                Some(self.n() + usize::from(self.case.has_parabolic(Sign::Plus)))
            }
            _ => None,
        }
    }

    /// Inverse of [`ray_index`](Self::ray_index).
    pub fn ray_ref(&self, index: usize) -> Option<RayRef> {
        let mut offset = index;
        for (i, len) in self.l.block_lens().into_iter().enumerate() {
            if offset < len {
                return Some(RayRef::Block { block: i, index: offset });
            }
            offset -= len;
        }
        Sign::BOTH
            .into_iter()
            .find(|&sign| self.apex_index(sign) == Some(index))
            .map(RayRef::Apex)
    }

    /// All rays in ray-index order.
    pub fn ray_refs(&self) -> Vec<RayRef> {
        let mut refs: Vec<RayRef> = self
            .l
            .iter()
            .map(|((block, index), _)| RayRef::Block { block, index })
            .collect();
        for sign in Sign::BOTH {
            if self.case.has_parabolic(sign) {
                refs.push(RayRef::Apex(sign));
            }
        }
        refs
    }

    // ── new surfaces ──

    /// The surface obtained by removing one ray from the fan, i.e. by
    /// contracting the corresponding invariant curve. Removing an apex ray
    /// turns that end elliptic.
    pub fn contract(&self, ray: RayRef) -> Result<CStarSurface> {
        let mut l = self.l.clone();
        let mut d = self.d.clone();
        let mut case = self.case;
        match ray {
            RayRef::Block { block, index } => {
                if self.l.block_len(block) <= 1 {
                    return Err(Error::InvariantViolation(format!(
                        "contracting ({}, {}) would empty block {}",
                        block, index, block
                    )));
                }
                l.remove(block, index)
                    .ok_or(Error::IndexOutOfRange { block, index })?;
                d.remove(block, index)
                    .ok_or(Error::IndexOutOfRange { block, index })?;
            }
            RayRef::Apex(sign) => {
                if !case.has_parabolic(sign) {
                    return Err(Error::NoParabolicCurve(sign));
                }
                case = match sign {
                    Sign::Plus => Case::from_sides(true, case.has_elliptic(Sign::Minus)),
                    Sign::Minus => Case::from_sides(case.has_elliptic(Sign::Plus), true),
                };
            }
        }
        CStarSurface::from_blocks(l, d, case)
    }
}

impl PartialEq for CStarSurface {
    fn eq(&self, other: &Self) -> bool {
        self.case == other.case && self.l == other.l && self.d == other.d
    }
}

impl Eq for CStarSurface {}

impl TryFrom<SurfaceParams> for CStarSurface {
    type Error = Error;

    fn try_from(params: SurfaceParams) -> Result<Self> {
        CStarSurface::new(params.l, params.d, params.case)
    }
}

impl From<CStarSurface> for SurfaceParams {
    fn from(surface: CStarSurface) -> Self {
        surface.params()
    }
}
