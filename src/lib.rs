// cstar-surface: combinatorics of rational C*-surfaces
// Copyright 2025 Lars Brubaker
// License: MIT

pub mod block;
pub mod divisor;
pub mod error;
pub mod lattice;
pub mod resolution;
pub mod surface;

pub use block::BlockVec;
pub use divisor::InvariantDivisor;
pub use error::{Error, Result};
pub use num_rational::Rational64;
pub use resolution::Resolution;
pub use surface::{
    CStarSurface, Case, Fan, FixedPoint, FixedPointKind, RayRef, Sign, SurfaceParams,
};
