// Copyright 2025 Lars Brubaker
// Shared surfaces and checks for the cstar-surface integration tests.

#![allow(dead_code)]

use cstar_surface::{CStarSurface, Case, InvariantDivisor, Rational64, RayRef, Resolution};

pub fn q(n: i64, d: i64) -> Rational64 {
    Rational64::new(n, d)
}

pub fn surface(l: Vec<Vec<i64>>, d: Vec<Vec<i64>>, case: Case) -> CStarSurface {
    CStarSurface::new(l, d, case).unwrap_or_else(|e| panic!("bad fixture: {}", e))
}

/// Cubic surface with an E6 singularity at x+ and a smooth x-.
pub fn e6_cubic() -> CStarSurface {
    surface(
        vec![vec![3, 1], vec![3], vec![2]],
        vec![vec![-2, -1], vec![1], vec![1]],
        Case::Ee,
    )
}

/// Quasismooth surface with two elliptic points.
pub fn quasismooth_ee() -> CStarSurface {
    surface(
        vec![vec![2, 1], vec![1, 1], vec![2]],
        vec![vec![3, -1], vec![0, -1], vec![1]],
        Case::Ee,
    )
}

pub fn sample_pe() -> CStarSurface {
    surface(
        vec![vec![1, 1], vec![2], vec![3]],
        vec![vec![0, -1], vec![1], vec![-2]],
        Case::Pe,
    )
}

pub fn sample_ep() -> CStarSurface {
    surface(
        vec![vec![1, 1], vec![2], vec![3]],
        vec![vec![1, 0], vec![1], vec![1]],
        Case::Ep,
    )
}

pub fn sample_pp() -> CStarSurface {
    surface(
        vec![vec![1, 2], vec![3], vec![1]],
        vec![vec![0, 1], vec![1], vec![0]],
        Case::Pp,
    )
}

/// Smooth toric surface with five rays.
pub fn smooth_pp() -> CStarSurface {
    surface(vec![vec![1, 1], vec![1]], vec![vec![1, 0], vec![0]], Case::Pp)
}

/// One surface per case.
pub fn all_cases() -> Vec<CStarSurface> {
    vec![quasismooth_ee(), sample_pe(), sample_ep(), sample_pp()]
}

/// `K·D + D²` for the prime divisor of `ray`.
pub fn adjunction(x: &CStarSurface, ray: RayRef) -> Rational64 {
    let k = x.canonical_divisor().to_flat();
    let m = x.intersection_matrix();
    let i = x.ray_index(ray).unwrap();
    let k_dot_d: Rational64 = k.iter().zip(&m[i]).map(|(a, b)| a * b).sum();
    k_dot_d + m[i][i]
}

/// For every exceptional `E` of `res`, the pair `(K_Y·E, Σ_F a_F·(F·E))`
/// where `F` runs over all exceptional divisors with discrepancy `a_F`.
/// The two sides agree because `π*K_X` is orthogonal to exceptional curves.
pub fn discrepancy_pairings(res: &Resolution) -> Vec<(Rational64, Rational64)> {
    let y = res.surface();
    let k = y.canonical_divisor();
    let weighted: Vec<(&InvariantDivisor, Rational64)> = res
        .exceptional_divisors()
        .iter()
        .flat_map(|(point, divisors)| {
            divisors
                .iter()
                .zip(res.discrepancies_over(point).unwrap().iter().copied())
        })
        .collect();
    weighted
        .iter()
        .map(|(e, _)| {
            let lhs = k.intersection(e, y).unwrap();
            let rhs = weighted
                .iter()
                .map(|(f, a)| *a * f.intersection(e, y).unwrap())
                .fold(Rational64::from(0), |acc, t| acc + t);
            (lhs, rhs)
        })
        .collect()
}
