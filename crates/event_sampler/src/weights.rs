//! Mutable weight storage shared by every sampler strategy.
//!
//! Weights are scaled probabilities: they need not sum to one, the samplers divide by the
//! running sum. [WeightVector] validates every value it stores and caches the sum so that
//! drawing never has to walk the whole vector just to normalise.
use crate::error::{Error, Result};

/// A cached sum that shrinks below this fraction of itself in one update has lost too many
/// significant bits to be trusted and is recomputed.
const CANCELLATION_RATIO: f64 = 1e-6;

/// Updates between exact recomputations never drop below this.
const MIN_STEPS_BETWEEN_RESUMS: usize = 1024;

/// Add `delta` to a cached `sum`, or `None` if the result cancels most of `sum`.
#[inline]
pub(crate) fn accumulate(sum: f64, delta: f64) -> Option<f64> {
    let next = sum + delta;
    if delta < 0.0 && next < sum * CANCELLATION_RATIO {
        None
    } else {
        Some(next.max(0.0))
    }
}

/// Updates to allow between exact recomputations of sums over `len` values.
///
/// Growing with `len` keeps the recomputation O(1) amortized per update.
#[inline]
pub(crate) fn resum_interval(len: usize) -> i64 {
    len.max(MIN_STEPS_BETWEEN_RESUMS) as i64
}

/// Check that `value` is usable as a weight for `index`.
#[inline]
pub fn validate_weight(index: usize, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidWeight { index, value })
    }
}

/// Ordered non-negative weights with a cached sum.
///
/// The cached sum is adjusted incrementally on [WeightVector::set] and recomputed exactly
/// when an update cancels most of it, or after [resum_interval] updates. The vector also
/// counts its positive entries; once that count drops to zero the sum is reset to exactly
/// `0.0`, so callers can detect an all-zero distribution without worrying about round-off.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightVector {
    values: Vec<f64>,
    sum: f64,
    positive: usize,
    steps_until_resum: i64,
}

impl WeightVector {
    /// Build from a slice of weights, rejecting negative and non-finite values.
    pub fn new(weights: &[f64]) -> Result<Self> {
        for (index, &value) in weights.iter().enumerate() {
            validate_weight(index, value)?;
        }
        let mut out = Self {
            values: weights.to_vec(),
            sum: 0.0,
            positive: 0,
            steps_until_resum: 0,
        };
        out.recompute_sum();
        Ok(out)
    }

    /// A vector of `len` zero weights.
    pub fn zeros(len: usize) -> Self {
        Self {
            values: vec![0.0; len],
            sum: 0.0,
            positive: 0,
            steps_until_resum: resum_interval(len),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Weight at `index`.
    ///
    /// # Panics
    /// Panics if `index` is out of range.
    #[inline]
    pub fn get(&self, index: usize) -> f64 {
        self.values[index]
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Cached sum of all weights.
    #[inline]
    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// Number of strictly positive weights.
    #[inline]
    pub fn positive_count(&self) -> usize {
        self.positive
    }

    /// True when no weight is positive, so there is nothing to draw.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.positive == 0
    }

    /// Bounds-check `index` against this vector.
    #[inline]
    pub fn check_index(&self, index: usize) -> Result<()> {
        if index < self.values.len() {
            Ok(())
        } else {
            Err(Error::IndexOutOfRange {
                index,
                len: self.values.len(),
            })
        }
    }

    /// Replace the weight at `index` and return the previous value.
    pub fn set(&mut self, index: usize, value: f64) -> Result<f64> {
        self.check_index(index)?;
        validate_weight(index, value)?;

        let old = self.values[index];
        self.values[index] = value;
        match (old > 0.0, value > 0.0) {
            (false, true) => self.positive += 1,
            (true, false) => self.positive -= 1,
            _ => {}
        }

        self.steps_until_resum -= 1;
        if self.positive == 0 {
            self.sum = 0.0;
        } else if self.steps_until_resum <= 0 {
            self.recompute_sum();
        } else {
            match accumulate(self.sum, value - old) {
                Some(sum) => self.sum = sum,
                None => {
                    self.recompute_sum();
                }
            }
        }
        Ok(old)
    }

    /// Recompute the cached sum exactly and return it.
    pub fn recompute_sum(&mut self) -> f64 {
        self.positive = self.values.iter().filter(|&&w| w > 0.0).count();
        self.sum = self.values.iter().sum();
        self.steps_until_resum = resum_interval(self.values.len());
        self.sum
    }

    /// Rearrange storage so that slot `j` holds what was at `order[j]`.
    pub(crate) fn reorder(&mut self, order: &[usize]) {
        debug_assert_eq!(order.len(), self.values.len());
        self.values = order.iter().map(|&p| self.values[p]).collect();
    }

    /// Index of the last positive weight, if any.
    pub fn last_positive(&self) -> Option<usize> {
        self.values.iter().rposition(|&w| w > 0.0)
    }
}
