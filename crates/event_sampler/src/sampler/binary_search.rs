//! Binary search on the cumulative mass function.
use rand::Rng;

use crate::error::Result;
use crate::sampler::DiscreteSampler;
use crate::uniform::unit_f64;
use crate::weights::WeightVector;

/// Stores prefix sums and inverts them by binary search.
///
/// Drawing is O(log N). Changing a weight recomputes every prefix sum at and after the
/// changed index, so updates are O(N) in the worst case.
#[derive(Debug, Clone, Default)]
pub struct BinarySearchCdf {
    weights: WeightVector,
    cdf: Vec<f64>,
}

impl BinarySearchCdf {
    pub fn new(weights: &[f64]) -> Result<Self> {
        let mut out = Self::default();
        out.initialize(weights)?;
        Ok(out)
    }

    /// Cumulative sums, `cdf()[i] == weight(0) + … + weight(i)`.
    pub fn cdf(&self) -> &[f64] {
        &self.cdf
    }

    /// Map a scaled variate `r` to the smallest index whose cumulative sum exceeds it.
    pub fn locate(&self, r: f64) -> usize {
        let i = self.cdf.partition_point(|&c| c <= r);
        if i < self.cdf.len() {
            i
        } else {
            self.weights.last_positive().unwrap_or(0)
        }
    }

    fn recompute_from(&mut self, start: usize) {
        let mut acc = if start == 0 { 0.0 } else { self.cdf[start - 1] };
        for (c, &w) in self.cdf[start..]
            .iter_mut()
            .zip(&self.weights.as_slice()[start..])
        {
            acc += w;
            *c = acc;
        }
    }
}

impl DiscreteSampler for BinarySearchCdf {
    fn initialize(&mut self, weights: &[f64]) -> Result<()> {
        self.weights = WeightVector::new(weights)?;
        self.cdf = vec![0.0; self.weights.len()];
        self.recompute_from(0);
        Ok(())
    }

    fn draw<R: Rng + ?Sized>(&mut self, rng: &mut R) -> usize {
        if self.weights.is_degenerate() {
            return 0;
        }
        let total = self.cdf.last().copied().unwrap_or(0.0);
        self.locate(unit_f64(rng) * total)
    }

    fn set_weight(&mut self, index: usize, value: f64) -> Result<()> {
        self.weights.set(index, value)?;
        self.recompute_from(index);
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cdf_is_prefix_sum() {
        let s = BinarySearchCdf::new(&[1.0, 2.0, 0.0, 4.0]).unwrap();
        assert_eq!(s.cdf(), &[1.0, 3.0, 3.0, 7.0]);
    }

    #[test]
    fn update_recomputes_suffix_only() {
        let mut s = BinarySearchCdf::new(&[1.0, 2.0, 3.0]).unwrap();
        s.set_weight(1, 5.0).unwrap();
        assert_eq!(s.cdf(), &[1.0, 6.0, 9.0]);
        s.set_weight(0, 0.0).unwrap();
        assert_eq!(s.cdf(), &[0.0, 5.0, 8.0]);
    }

    #[test]
    fn locate_skips_zero_weights() {
        let mut s = BinarySearchCdf::new(&[1.0, 1.0, 1.0, 1.0]).unwrap();
        assert_eq!(s.locate(2.4), 2);
        s.set_weight(2, 0.0).unwrap();
        assert_eq!(s.locate(2.4), 3);
        assert_eq!(s.locate(0.0), 0);
        assert_eq!(s.locate(1.0), 1);
    }

    #[test]
    fn leading_zero_never_selected() {
        let s = BinarySearchCdf::new(&[0.0, 0.0, 3.0]).unwrap();
        assert_eq!(s.locate(0.0), 2);
    }

    #[test]
    fn overshoot_falls_back_to_last_positive() {
        let s = BinarySearchCdf::new(&[1.0, 1.0, 0.0]).unwrap();
        assert_eq!(s.locate(2.0), 1);
    }
}
