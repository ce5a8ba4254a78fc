//! Permutation/rank bookkeeping for weights kept in sorted storage order.
//!
//! Sorting weights in descending order shortens chop-down searches and is what the binned
//! sampler packs from. Callers still address weights by their external index, so the
//! storage order is tracked by two arrays that are mutual inverses:
//! `permutation[rank[i]] == i` and `rank[permutation[i]] == i`.
use crate::error::Result;
use crate::weights::{validate_weight, WeightVector};

/// A permutation of `0..n` together with its inverse.
///
/// `permutation[position]` is the external index stored at `position`;
/// `rank[index]` is the storage position of an external index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RankedPermutation {
    permutation: Vec<usize>,
    rank: Vec<usize>,
}

impl RankedPermutation {
    /// The identity permutation on `len` elements.
    pub fn identity(len: usize) -> Self {
        Self {
            permutation: (0..len).collect(),
            rank: (0..len).collect(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.permutation.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.permutation.is_empty()
    }

    #[inline]
    pub fn permutation(&self) -> &[usize] {
        &self.permutation
    }

    #[inline]
    pub fn rank(&self) -> &[usize] {
        &self.rank
    }

    /// External index stored at `position`.
    #[inline]
    pub fn index_at(&self, position: usize) -> usize {
        self.permutation[position]
    }

    /// Storage position of external `index`.
    #[inline]
    pub fn position_of(&self, index: usize) -> usize {
        self.rank[index]
    }

    /// Check that the two arrays are inverses of each other.
    pub fn is_consistent(&self) -> bool {
        if self.permutation.len() != self.rank.len() {
            return false;
        }
        let n = self.permutation.len();
        (0..n).all(|i| {
            let p = self.permutation[i];
            let r = self.rank[i];
            p < n && r < n && self.rank[p] == i && self.permutation[r] == i
        })
    }

    /// Compose with a reordering of storage: new position `j` takes old position `order[j]`.
    pub(crate) fn apply(&mut self, order: &[usize]) {
        debug_assert_eq!(order.len(), self.permutation.len());
        self.permutation = order.iter().map(|&p| self.permutation[p]).collect();
        for (position, &index) in self.permutation.iter().enumerate() {
            self.rank[index] = position;
        }
    }
}

/// Weights held in storage order alongside the permutation that maps them back.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SortedWeights {
    storage: WeightVector,
    order: RankedPermutation,
}

impl SortedWeights {
    /// Store `weights` in their given order. Call [SortedWeights::sort_descending] to sort.
    pub fn new(weights: &[f64]) -> Result<Self> {
        let storage = WeightVector::new(weights)?;
        let order = RankedPermutation::identity(storage.len());
        Ok(Self { storage, order })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Weight of external `index`.
    #[inline]
    pub fn get(&self, index: usize) -> f64 {
        self.storage.get(self.order.position_of(index))
    }

    /// Replace the weight of external `index`, returning the storage position and old value.
    pub fn set(&mut self, index: usize, value: f64) -> Result<(usize, f64)> {
        self.storage.check_index(index)?;
        validate_weight(index, value)?;
        let position = self.order.position_of(index);
        let old = self.storage.set(position, value)?;
        Ok((position, old))
    }

    #[inline]
    pub fn sum(&self) -> f64 {
        self.storage.sum()
    }

    pub fn recompute_sum(&mut self) -> f64 {
        self.storage.recompute_sum()
    }

    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.storage.is_degenerate()
    }

    /// Weights in storage order.
    #[inline]
    pub fn storage(&self) -> &WeightVector {
        &self.storage
    }

    #[inline]
    pub fn order(&self) -> &RankedPermutation {
        &self.order
    }

    /// External index stored at `position`.
    #[inline]
    pub fn index_at(&self, position: usize) -> usize {
        self.order.index_at(position)
    }

    /// Sort storage by descending weight. Equal weights keep their relative order.
    pub fn sort_descending(&mut self) {
        let values = self.storage.as_slice();
        let mut order: Vec<usize> = (0..values.len()).collect();
        order.sort_by(|&a, &b| values[b].total_cmp(&values[a]));
        self.storage.reorder(&order);
        self.order.apply(&order);
    }
}
