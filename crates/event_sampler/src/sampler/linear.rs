//! Chop-down linear search, optionally over weights sorted by descending value.
use rand::Rng;

use crate::error::{Error, Result};
use crate::permutation::SortedWeights;
use crate::sampler::{chop_down, DiscreteSampler};
use crate::uniform::unit_f64;
use crate::weights::WeightVector;

/// Linear search over weights in index order. O(N) draw, O(1) update.
#[derive(Debug, Clone, Default)]
pub struct LinearSearch {
    weights: WeightVector,
}

impl LinearSearch {
    pub fn new(weights: &[f64]) -> Result<Self> {
        Ok(Self {
            weights: WeightVector::new(weights)?,
        })
    }

    /// Map a scaled variate `r` in `[0, weight_sum())` to an index.
    pub fn locate(&self, r: f64) -> usize {
        chop_down(self.weights.as_slice(), r)
            .or_else(|| self.weights.last_positive())
            .unwrap_or(0)
    }
}

impl DiscreteSampler for LinearSearch {
    fn initialize(&mut self, weights: &[f64]) -> Result<()> {
        self.weights = WeightVector::new(weights)?;
        Ok(())
    }

    fn draw<R: Rng + ?Sized>(&mut self, rng: &mut R) -> usize {
        if self.weights.is_degenerate() {
            return 0;
        }
        let r = unit_f64(rng) * self.weights.sum();
        self.locate(r)
    }

    fn set_weight(&mut self, index: usize, value: f64) -> Result<()> {
        self.weights.set(index, value).map(|_| ())
    }

    fn weight(&self, index: usize) -> f64 {
        self.weights.get(index)
    }

    fn weight_sum(&self) -> f64 {
        self.weights.sum()
    }

    fn len(&self) -> usize {
        self.weights.len()
    }
}

/// Linear search over weights kept in approximately descending order.
///
/// Heavy events sit near the front, which shortens the expected search when weights
/// differ by orders of magnitude. Storage is re-sorted after a fixed number of updates.
#[derive(Debug, Clone)]
pub struct SortedLinearSearch {
    weights: SortedWeights,
    steps_between_sorts: u32,
    steps_until_sort: i64,
}

impl Default for SortedLinearSearch {
    fn default() -> Self {
        Self {
            weights: SortedWeights::default(),
            steps_between_sorts: 1000,
            steps_until_sort: 1000,
        }
    }
}

impl SortedLinearSearch {
    pub fn new(weights: &[f64]) -> Result<Self> {
        let mut out = Self::default();
        out.initialize(weights)?;
        Ok(out)
    }

    /// Sets the number of updates between re-sorts.
    pub fn with_steps_between_sorts(mut self, steps: u32) -> Result<Self> {
        if steps == 0 {
            return Err(Error::InvalidConfig(
                "steps_between_sorts must be > 0".into(),
            ));
        }
        self.steps_between_sorts = steps;
        self.steps_until_sort = steps as i64;
        Ok(self)
    }

    /// Re-sort storage by descending weight now.
    pub fn sort(&mut self) {
        self.weights.sort_descending();
        self.weights.recompute_sum();
        self.steps_until_sort = self.steps_between_sorts as i64;
    }

    /// Weights in storage order together with their permutation/rank pair.
    pub fn sorted_weights(&self) -> &SortedWeights {
        &self.weights
    }

    /// Map a scaled variate `r` to an external index using the current storage order.
    pub fn locate(&self, r: f64) -> usize {
        let storage = self.weights.storage();
        chop_down(storage.as_slice(), r)
            .or_else(|| storage.last_positive())
            .map(|position| self.weights.index_at(position))
            .unwrap_or(0)
    }
}

impl DiscreteSampler for SortedLinearSearch {
    fn initialize(&mut self, weights: &[f64]) -> Result<()> {
        self.weights = SortedWeights::new(weights)?;
        self.sort();
        Ok(())
    }

    fn draw<R: Rng + ?Sized>(&mut self, rng: &mut R) -> usize {
        if self.weights.is_degenerate() {
            return 0;
        }
        if self.steps_until_sort <= 0 {
            self.sort();
        }
        let r = unit_f64(rng) * self.weights.sum();
        self.locate(r)
    }

    fn set_weight(&mut self, index: usize, value: f64) -> Result<()> {
        self.weights.set(index, value)?;
        self.steps_until_sort -= 1;
        Ok(())
    }

    fn weight(&self, index: usize) -> f64 {
        self.weights.get(index)
    }

    fn weight_sum(&self) -> f64 {
        self.weights.sum()
    }

    fn len(&self) -> usize {
        self.weights.len()
    }
}
