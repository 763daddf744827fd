// Copyright 2025 Lars Brubaker
// License: MIT
//
// Intersection numbers of the invariant prime divisors.
//
// Closed formulas in terms of the sorted slopes. For block i write
// m_i0 > m_i1 > ... for its slopes in descending order and define the
// boundary weights
//
//   w(i, 0)   = -1/m⁺ if x⁺ exists, else 0
//   w(i, n_i) = -1/m⁻ if x⁻ exists, else 0
//   w(i, j)   = 1/(m_i,j-1 - m_ij)            for 0 < j < n_i
//
// Then D_ij·D_i,j+1 = w/(l·l'), D_ij² = -(w_left + w_right)/l², extreme rays
// of different blocks meet at an elliptic point with -w(i, 0)/(l·l') (resp.
// -w(i, n_i)/(l·l')), an apex ray meets each extreme ray with 1/l and has
// self-intersection -m⁺ (resp. -m⁻).

use num_rational::Rational64;
use num_traits::Zero;

use super::{CStarSurface, RayRef, Sign};
use crate::error::Result;

impl CStarSurface {
    /// Boundary weight `w(i, j)` for `j ∈ 0..=n_i`.
    fn boundary_weight(&self, i: usize, j: usize) -> Rational64 {
        let n_i = self.l.block_len(i);
        let order = &self.slope_order[i];
        if j == 0 || j == n_i {
            let sign = if j == 0 { Sign::Plus } else { Sign::Minus };
            if self.case.has_elliptic(sign) {
                -self.slope_sum(sign).recip()
            } else {
                Rational64::zero()
            }
        } else {
            (self.slopes[(i, order[j - 1])] - self.slopes[(i, order[j])]).recip()
        }
    }

    fn compute_intersection_matrix(&self) -> Vec<Vec<Rational64>> {
        let size = self.ray_count();
        let mut matrix = vec![vec![Rational64::zero(); size]; size];
        let mut add_symmetric = |a: usize, b: usize, value: Rational64| {
            matrix[a][b] += value;
            if a != b {
                matrix[b][a] += value;
            }
        };

        let flat = |i: usize, j: usize| self.l.flat_index(i, j).unwrap_or(usize::MAX);
        let l = |i: usize, j: usize| Rational64::from(self.l[(i, j)]);

        for i in 0..=self.r() {
            let order = &self.slope_order[i];
            let n_i = order.len();
            for (k, &j) in order.iter().enumerate() {
                let self_weight = self.boundary_weight(i, k) + self.boundary_weight(i, k + 1);
                add_symmetric(flat(i, j), flat(i, j), -self_weight / (l(i, j) * l(i, j)));
                if k + 1 < n_i {
                    let next = order[k + 1];
                    add_symmetric(
                        flat(i, j),
                        flat(i, next),
                        self.boundary_weight(i, k + 1) / (l(i, j) * l(i, next)),
                    );
                }
            }
        }

        for sign in Sign::BOTH {
            if self.case.has_elliptic(sign) {
                let boundary = |i: usize| match sign {
                    Sign::Plus => 0,
                    Sign::Minus => self.l.block_len(i),
                };
                for i in 0..=self.r() {
                    let a = self.extreme(sign, i);
                    for k in (i + 1)..=self.r() {
                        let b = self.extreme(sign, k);
                        add_symmetric(
                            flat(i, a),
                            flat(k, b),
                            -self.boundary_weight(i, boundary(i)) / (l(i, a) * l(k, b)),
                        );
                    }
                }
            } else if let Some(apex) = self.apex_index(sign) {
                add_symmetric(apex, apex, -self.slope_sum(sign));
                for i in 0..=self.r() {
                    let a = self.extreme(sign, i);
                    add_symmetric(apex, flat(i, a), l(i, a).recip());
                }
            }
        }
        matrix
    }

    /// Intersection matrix of all invariant prime divisors, indexed by
    /// [`ray_index`](Self::ray_index). Computed once per surface.
    pub fn intersection_matrix(&self) -> &[Vec<Rational64>] {
        self.intersection_cache
            .get_or_init(|| self.compute_intersection_matrix())
    }

    pub fn intersection_number(&self, a: RayRef, b: RayRef) -> Result<Rational64> {
        let (a, b) = (self.ray_index(a)?, self.ray_index(b)?);
        Ok(self.intersection_matrix()[a][b])
    }

    pub fn self_intersection(&self, ray: RayRef) -> Result<Rational64> {
        self.intersection_number(ray, ray)
    }
}
