//! Distance functions over perceptual hashes.
//!
//! Everything in this crate measures dissimilarity through two seams:
//!
//! - [`HashMetric`]: distance between two [`PerceptualHash`] values.
//! - [`MetricSpace`]: distance between two *positions* in a collection.
//!   The VP-tree and the ordering strategies only ever see positions.
//!
//! ## Important nuance
//!
//! Hashes of different lengths are not comparable. Every metric here returns
//! `f32::INFINITY` for them, so such a pair is never selected as a nearest
//! neighbor and never contributes an edge to the similarity graph.

use std::cell::Cell;

use crate::hash::PerceptualHash;

/// Distance between two hashes.
///
/// Implementations must be symmetric and return `f32::INFINITY` for pairs
/// they cannot compare. VP-tree pruning additionally relies on the triangle
/// inequality holding for finite distances.
pub trait HashMetric {
    fn distance(&self, a: &PerceptualHash, b: &PerceptualHash) -> f32;
}

/// Symbol-wise Hamming distance: count of positions whose symbols differ.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Hamming;

impl HashMetric for Hamming {
    #[inline]
    fn distance(&self, a: &PerceptualHash, b: &PerceptualHash) -> f32 {
        if a.len() != b.len() {
            return f32::INFINITY;
        }
        a.as_bytes()
            .iter()
            .zip(b.as_bytes())
            .filter(|(x, y)| x != y)
            .count() as f32
    }
}

/// Bitwise Hamming distance over packed bytes (XOR + popcount).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BitHamming;

impl HashMetric for BitHamming {
    #[inline]
    fn distance(&self, a: &PerceptualHash, b: &PerceptualHash) -> f32 {
        if a.len() != b.len() {
            return f32::INFINITY;
        }
        a.as_bytes()
            .iter()
            .zip(b.as_bytes())
            .map(|(x, y)| (x ^ y).count_ones())
            .sum::<u32>() as f32
    }
}

/// A finite collection of points addressed by position.
pub trait MetricSpace {
    /// Number of points.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Distance between the points at positions `a` and `b`.
    fn distance(&self, a: usize, b: usize) -> f32;
}

/// [`MetricSpace`] over borrowed hashes that counts every comparison.
///
/// The counter is a `Cell` because an ordering run is single-threaded and
/// queries take `&self`.
pub struct HashSpace<'a, M> {
    hashes: Vec<&'a PerceptualHash>,
    metric: M,
    comparisons: Cell<u64>,
}

impl<'a, M: HashMetric> HashSpace<'a, M> {
    pub fn new(hashes: Vec<&'a PerceptualHash>, metric: M) -> Self {
        Self {
            hashes,
            metric,
            comparisons: Cell::new(0),
        }
    }

    /// Distance computations performed so far.
    pub fn comparisons(&self) -> u64 {
        self.comparisons.get()
    }
}

impl<M: HashMetric> MetricSpace for HashSpace<'_, M> {
    fn len(&self) -> usize {
        self.hashes.len()
    }

    #[inline]
    fn distance(&self, a: usize, b: usize) -> f32 {
        self.comparisons.set(self.comparisons.get() + 1);
        self.metric.distance(self.hashes[a], self.hashes[b])
    }
}
