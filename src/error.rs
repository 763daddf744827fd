// Copyright 2025 Lars Brubaker
// License: MIT
//
// Error type shared by every fallible operation of the crate.

use num_rational::Rational64;
use thiserror::Error;

use crate::surface::Sign;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong when building or querying a surface.
///
/// All variants except [`Error::InvariantViolation`] are rejections of
/// caller input. `InvariantViolation` means a derived computation produced
/// data that breaks the surface invariants and indicates a bug.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Error {
    #[error("l and d do not have the same block structure")]
    ShapeMismatch,

    #[error("a surface needs at least two blocks, got {0}")]
    TooFewBlocks(usize),

    #[error("block {0} is empty")]
    EmptyBlock(usize),

    #[error("l[{block}][{index}] = {value} is not positive")]
    NonPositiveL {
        block: usize,
        index: usize,
        value: i64,
    },

    #[error("l[{block}][{index}] = {l} and d[{block}][{index}] = {d} are not coprime")]
    NotCoprime {
        block: usize,
        index: usize,
        l: i64,
        d: i64,
    },

    #[error("rays {first} and {second} of block {block} coincide")]
    DuplicateRay {
        block: usize,
        first: usize,
        second: usize,
    },

    #[error("elliptic fixed point x{sign} needs m{sign} > 0, got {value}")]
    DegenerateEllipticPoint { sign: Sign, value: Rational64 },

    #[error("index ({block}, {index}) is out of range")]
    IndexOutOfRange { block: usize, index: usize },

    #[error("{0} is not a fixed point of this surface")]
    UnknownFixedPoint(String),

    #[error("surface has no parabolic fixed point curve on the {0} side")]
    NoParabolicCurve(Sign),

    #[error("unknown case {0:?}, expected one of ee, pe, ep, pp")]
    UnknownCase(String),

    #[error("invalid generator matrix: {0}")]
    InvalidGeneratorMatrix(String),

    #[error("internal invariant violated: {0}")]
    InvariantViolation(String),
}
