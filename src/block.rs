// Copyright 2025 Lars Brubaker
// License: MIT
//
// Block-indexed vectors.
//
// Almost every quantity attached to a C*-surface is addressed by a pair
// (i, j): the block i in 0..=r and the element j inside that block. Blocks
// may have different lengths. BlockVec stores one Vec per block and keeps
// the flat (block-major) order used for ray numbering.

use std::ops::Index;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockVec<T> {
    blocks: Vec<Vec<T>>,
}

impl<T> BlockVec<T> {
    pub fn new(blocks: Vec<Vec<T>>) -> Self {
        BlockVec { blocks }
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Length `n_i` of block `i`, or 0 when the block does not exist.
    pub fn block_len(&self, i: usize) -> usize {
        self.blocks.get(i).map_or(0, Vec::len)
    }

    pub fn block_lens(&self) -> Vec<usize> {
        self.blocks.iter().map(Vec::len).collect()
    }

    pub fn total_len(&self) -> usize {
        self.blocks.iter().map(Vec::len).sum()
    }

    pub fn block(&self, i: usize) -> &[T] {
        &self.blocks[i]
    }

    pub fn blocks(&self) -> &[Vec<T>] {
        &self.blocks
    }

    pub fn into_blocks(self) -> Vec<Vec<T>> {
        self.blocks
    }

    pub fn get(&self, i: usize, j: usize) -> Option<&T> {
        self.blocks.get(i)?.get(j)
    }

    pub fn get_mut(&mut self, i: usize, j: usize) -> Option<&mut T> {
        self.blocks.get_mut(i)?.get_mut(j)
    }

    /// Position of `(i, j)` in block-major order.
    pub fn flat_index(&self, i: usize, j: usize) -> Option<usize> {
        if j >= self.block_len(i) {
            return None;
        }
        Some(self.blocks[..i].iter().map(Vec::len).sum::<usize>() + j)
    }

    pub fn same_shape<U>(&self, other: &BlockVec<U>) -> bool {
        self.blocks.len() == other.blocks.len()
            && self
                .blocks
                .iter()
                .zip(&other.blocks)
                .all(|(a, b)| a.len() == b.len())
    }

    /// Elementwise combination of two vectors of identical shape.
    /// Returns `None` on a shape mismatch.
    pub fn zip_with<U, V, F>(&self, other: &BlockVec<U>, mut f: F) -> Option<BlockVec<V>>
    where
        F: FnMut(&T, &U) -> V,
    {
        if !self.same_shape(other) {
            return None;
        }
        let blocks = self
            .blocks
            .iter()
            .zip(&other.blocks)
            .map(|(a, b)| a.iter().zip(b).map(|(x, y)| f(x, y)).collect())
            .collect();
        Some(BlockVec { blocks })
    }

    pub fn map<U, F>(&self, mut f: F) -> BlockVec<U>
    where
        F: FnMut(&T) -> U,
    {
        BlockVec {
            blocks: self
                .blocks
                .iter()
                .map(|b| b.iter().map(&mut f).collect())
                .collect(),
        }
    }

    /// Iterates `((i, j), value)` in block-major order.
    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), &T)> + '_ {
        self.blocks
            .iter()
            .enumerate()
            .flat_map(|(i, b)| b.iter().enumerate().map(move |(j, v)| ((i, j), v)))
    }

    pub fn values(&self) -> impl Iterator<Item = &T> + '_ {
        self.blocks.iter().flatten()
    }

    pub(crate) fn push(&mut self, i: usize, value: T) -> usize {
        self.blocks[i].push(value);
        self.blocks[i].len() - 1
    }

    pub(crate) fn remove(&mut self, i: usize, j: usize) -> Option<T> {
        let block = self.blocks.get_mut(i)?;
        if j < block.len() {
            Some(block.remove(j))
        } else {
            None
        }
    }
}

impl<T: Clone> BlockVec<T> {
    /// A vector with the shape of `shape`, every entry set to `value`.
    pub fn filled_like<U>(shape: &BlockVec<U>, value: T) -> Self {
        BlockVec {
            blocks: shape
                .blocks
                .iter()
                .map(|b| vec![value.clone(); b.len()])
                .collect(),
        }
    }
}

impl<T> From<Vec<Vec<T>>> for BlockVec<T> {
    fn from(blocks: Vec<Vec<T>>) -> Self {
        BlockVec::new(blocks)
    }
}

impl<T> Index<(usize, usize)> for BlockVec<T> {
    type Output = T;

    fn index(&self, (i, j): (usize, usize)) -> &T {
        &self.blocks[i][j]
    }
}
