// Copyright 2025 Lars Brubaker
// License: MIT
//
// Lattice primitives.
//
// Pure integer/rational helpers used by the fan builder and the resolution
// engine. Vectors are plain `i64` slices; 2D vectors are `[l, d]` pairs in
// the plane spanned by a block axis and the last coordinate.

pub mod cone2d;

use std::cmp::Ordering;

use num_integer::Integer;
use num_rational::Rational64;

pub use cone2d::{resolve_cone, ResolvedRay};

/// A lattice vector in the (axis, d)-plane of one block.
pub type Vec2 = [i64; 2];

#[inline]
pub fn is_coprime(a: i64, b: i64) -> bool {
    a.gcd(&b) == 1
}

/// True iff the gcd of all entries is 1.
pub fn is_primitive(v: &[i64]) -> bool {
    v.iter().fold(0i64, |g, x| g.gcd(x)) == 1
}

/// The k-th unit vector of Z^rank.
pub fn basis(rank: usize, k: usize) -> Vec<i64> {
    let mut v = vec![0; rank];
    v[k] = 1;
    v
}

/// Axis vector of block `i` inside the first `r` coordinates:
/// `e_0 = -(e_1 + ... + e_r)` and `e_i` for `i >= 1`.
pub fn axis_vector(r: usize, i: usize) -> Vec<i64> {
    if i == 0 {
        vec![-1; r]
    } else {
        basis(r, i - 1)
    }
}

#[inline]
pub fn slope(l: i64, d: i64) -> Rational64 {
    Rational64::new(d, l)
}

/// Compares d1/l1 with d2/l2 for positive l1, l2 without building rationals.
/// Cross products are taken in `i128`, so any pair of `i64` inputs is exact.
#[inline]
pub fn slope_cmp(l1: i64, d1: i64, l2: i64, d2: i64) -> Ordering {
    debug_assert!(l1 > 0 && l2 > 0);
    (i128::from(d1) * i128::from(l2)).cmp(&(i128::from(d2) * i128::from(l1)))
}

#[inline]
pub fn det2(u: Vec2, w: Vec2) -> i64 {
    u[0] * w[1] - u[1] * w[0]
}
