// Copyright 2025 Lars Brubaker
// License: MIT
//
// Fan construction and generator-matrix parsing for CStarSurface.

use super::{CStarSurface, Case, Sign};
use crate::block::BlockVec;
use crate::error::{Error, Result};
use crate::lattice::axis_vector;

/// Rays and maximal cones of the fan of a surface.
///
/// Ray order matches [`CStarSurface::ray_index`]. Cones are sorted lists
/// of ray indices.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fan {
    pub rays: Vec<Vec<i64>>,
    pub cones: Vec<Vec<usize>>,
}

/// What a single generator-matrix column turned out to be.
enum Column {
    Block { block: usize, l: i64, d: i64 },
    Apex(Sign),
}

impl CStarSurface {
    /// Ray `(i, j)` as a vector of Z^{r+1}.
    pub fn block_ray(&self, i: usize, j: usize) -> Result<Vec<i64>> {
        match (self.l.get(i, j), self.d.get(i, j)) {
            (Some(&l), Some(&d)) => Ok(self.axis_ray(i, l, d)),
            _ => Err(Error::IndexOutOfRange { block: i, index: j }),
        }
    }

    fn axis_ray(&self, i: usize, l: i64, d: i64) -> Vec<i64> {
        let mut ray: Vec<i64> = axis_vector(self.r(), i).into_iter().map(|x| x * l).collect();
        ray.push(d);
        ray
    }

    fn apex_ray(&self, sign: Sign) -> Vec<i64> {
        let mut ray = vec![0; self.r()];
        ray.push(sign.unit());
        ray
    }

    /// All rays in ray-index order.
    pub fn rays(&self) -> Vec<Vec<i64>> {
        let mut rays: Vec<Vec<i64>> = self
            .l
            .iter()
            .map(|((i, j), &l)| self.axis_ray(i, l, self.d[(i, j)]))
            .collect();
        for sign in Sign::BOTH {
            if self.case.has_parabolic(sign) {
                rays.push(self.apex_ray(sign));
            }
        }
        rays
    }

    /// The generator matrix: `r + 1` rows, one column per ray.
    pub fn generator_matrix(&self) -> Vec<Vec<i64>> {
        let rays = self.rays();
        (0..self.lattice_rank())
            .map(|row| rays.iter().map(|ray| ray[row]).collect())
            .collect()
    }

    /// Maximal cones: the 2-ray cones between slope-adjacent rays of each
    /// block, then for each end either the elliptic cone of all extreme
    /// rays or one 2-ray cone per block joining the extreme ray to the apex.
    pub fn maximal_cones(&self) -> Vec<Vec<usize>> {
        let mut cones: Vec<Vec<usize>> = self
            .hyperbolic_fixed_points()
            .into_iter()
            .map(|fp| fp.cone().to_vec())
            .collect();
        for sign in Sign::BOTH {
            if self.case.has_elliptic(sign) {
                cones.push(self.elliptic_cone(sign));
            } else {
                for i in 0..=self.r() {
                    cones.push(self.parabolic_cone(sign, i));
                }
            }
        }
        cones
    }

    pub fn fan(&self) -> Fan {
        Fan {
            rays: self.rays(),
            cones: self.maximal_cones(),
        }
    }

    /// Rebuilds a surface from its generator matrix (given as rows).
    ///
    /// Every column must be `l·e_i + d·e_{r+1}` with `l > 0` (where
    /// `e_0 = -(e_1 + ... + e_r)`); columns of one block are consecutive and
    /// blocks appear in order `0..=r`. Up to two trailing columns `+e_{r+1}`
    /// and/or `-e_{r+1}` (in that order) fix the case.
    pub fn from_generator_matrix(rows: &[Vec<i64>]) -> Result<CStarSurface> {
        if rows.len() < 2 {
            return Err(Error::InvalidGeneratorMatrix(format!(
                "need at least 2 rows, got {}",
                rows.len()
            )));
        }
        let width = rows[0].len();
        if rows.iter().any(|row| row.len() != width) {
            return Err(Error::InvalidGeneratorMatrix("rows differ in length".into()));
        }
        let r = rows.len() - 1;

        let mut l: Vec<Vec<i64>> = vec![Vec::new(); r + 1];
        let mut d: Vec<Vec<i64>> = vec![Vec::new(); r + 1];
        let mut apexes: Vec<Sign> = Vec::new();
        let mut current_block = 0;
        for col in 0..width {
            let column: Vec<i64> = rows.iter().map(|row| row[col]).collect();
            match classify_column(&column)? {
                Column::Block { block, l: lij, d: dij } => {
                    if !apexes.is_empty() {
                        return Err(Error::InvalidGeneratorMatrix(format!(
                            "column {} follows an apex column",
                            col
                        )));
                    }
                    if block < current_block || (block > current_block && l[current_block].is_empty()) {
                        return Err(Error::InvalidGeneratorMatrix(format!(
                            "column {} belongs to block {} out of order",
                            col, block
                        )));
                    }
                    if block > current_block + 1 {
                        return Err(Error::InvalidGeneratorMatrix(format!(
                            "block {} is missing",
                            current_block + 1
                        )));
                    }
                    current_block = block;
                    l[block].push(lij);
                    d[block].push(dij);
                }
                Column::Apex(sign) => apexes.push(sign),
            }
        }
        if current_block != r {
            return Err(Error::InvalidGeneratorMatrix(format!(
                "expected {} blocks, found {}",
                r + 1,
                current_block + 1
            )));
        }
        let case = match apexes.as_slice() {
            [] => Case::Ee,
            [Sign::Plus] => Case::Pe,
            [Sign::Minus] => Case::Ep,
            [Sign::Plus, Sign::Minus] => Case::Pp,
            other => {
                return Err(Error::InvalidGeneratorMatrix(format!(
                    "unexpected apex columns {:?}",
                    other
                )))
            }
        };
        CStarSurface::from_blocks(BlockVec::new(l), BlockVec::new(d), case)
    }
}

fn classify_column(column: &[i64]) -> Result<Column> {
    let (&d, head) = column
        .split_last()
        .ok_or_else(|| Error::InvalidGeneratorMatrix("empty column".into()))?;
    if head.iter().all(|&x| x == 0) {
        return match d {
            1 => Ok(Column::Apex(Sign::Plus)),
            -1 => Ok(Column::Apex(Sign::Minus)),
            _ => Err(Error::InvalidGeneratorMatrix(format!(
                "column {:?} is not a block ray nor ±e_last",
                column
            ))),
        };
    }
    if head[0] < 0 && head.iter().all(|&x| x == head[0]) {
        return Ok(Column::Block {
            block: 0,
            l: -head[0],
            d,
        });
    }
    let nonzero: Vec<usize> = (0..head.len()).filter(|&k| head[k] != 0).collect();
    match nonzero.as_slice() {
        [k] if head[*k] > 0 => Ok(Column::Block {
            block: k + 1,
            l: head[*k],
            d,
        }),
        _ => Err(Error::InvalidGeneratorMatrix(format!(
            "column {:?} is not a multiple of a block axis",
            column
        ))),
    }
}
