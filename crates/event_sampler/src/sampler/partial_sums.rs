//! Double linear search over partial PMF sums.
use rand::Rng;

use crate::error::Result;
use crate::sampler::{chop_down, DiscreteSampler};
use crate::uniform::unit_f64;
use crate::weights::{accumulate, resum_interval, WeightVector};

/// Weights grouped into blocks of about √N with a cached sum per block.
///
/// A draw first chops down the block sums, then the weights inside the chosen block, so it
/// costs O(√N). An update adjusts a single block sum by the difference between the old
/// and new weight, so it is O(1). A block whose sum cancels on update is summed again from
/// its weights, and every block is re-summed periodically to clear accumulated drift.
#[derive(Debug, Clone, Default)]
pub struct PartialPmfSums {
    weights: WeightVector,
    block_size: usize,
    block_sums: Vec<f64>,
    steps_until_repair: i64,
}

impl PartialPmfSums {
    pub fn new(weights: &[f64]) -> Result<Self> {
        let mut out = Self::default();
        out.initialize(weights)?;
        Ok(out)
    }

    #[inline]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn block_sums(&self) -> &[f64] {
        &self.block_sums
    }

    /// Recompute every block sum and the total from the weights.
    pub fn repair(&mut self) {
        let values = self.weights.as_slice();
        self.block_sums = values
            .chunks(self.block_size.max(1))
            .map(|block| block.iter().sum())
            .collect();
        self.weights.recompute_sum();
        self.steps_until_repair = resum_interval(self.weights.len());
    }

    fn block_total(&self, block: usize) -> f64 {
        let values = self.weights.as_slice();
        let start = block * self.block_size;
        let end = (start + self.block_size).min(values.len());
        values[start..end].iter().sum()
    }

    /// Map a scaled variate `r` to an index.
    pub fn locate(&self, mut r: f64) -> usize {
        let values = self.weights.as_slice();
        for (block, &block_sum) in self.block_sums.iter().enumerate() {
            if r < block_sum {
                let start = block * self.block_size;
                let end = (start + self.block_size).min(values.len());
                if let Some(offset) = chop_down(&values[start..end], r) {
                    return start + offset;
                }
                // Block sum ran ahead of its contents; take the next positive weight.
                r = 0.0;
                continue;
            }
            r -= block_sum;
        }
        self.weights.last_positive().unwrap_or(0)
    }
}

impl DiscreteSampler for PartialPmfSums {
    fn initialize(&mut self, weights: &[f64]) -> Result<()> {
        self.weights = WeightVector::new(weights)?;
        self.block_size = (self.weights.len() as f64).sqrt().ceil().max(1.0) as usize;
        self.repair();
        Ok(())
    }

    fn draw<R: Rng + ?Sized>(&mut self, rng: &mut R) -> usize {
        if self.weights.is_degenerate() {
            return 0;
        }
        self.locate(unit_f64(rng) * self.weights.sum())
    }

    fn set_weight(&mut self, index: usize, value: f64) -> Result<()> {
        let old = self.weights.set(index, value)?;
        self.steps_until_repair -= 1;
        if self.steps_until_repair <= 0 {
            self.repair();
            return Ok(());
        }
        let block = index / self.block_size;
        self.block_sums[block] = match accumulate(self.block_sums[block], value - old) {
            Some(sum) => sum,
            None => self.block_total(block),
        };
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
    fn blocks_are_about_sqrt_n() {
        let s = PartialPmfSums::new(&[1.0; 10]).unwrap();
        assert_eq!(s.block_size(), 4);
        assert_eq!(s.block_sums(), &[4.0, 4.0, 2.0]);
    }

    #[test]
    fn update_adjusts_one_block() {
        let mut s = PartialPmfSums::new(&[1.0; 9]).unwrap();
        s.set_weight(4, 3.0).unwrap();
        assert_eq!(s.block_sums(), &[3.0, 5.0, 3.0]);
        assert!((s.weight_sum() - 11.0).abs() < 1e-12);
    }

    #[test]
    fn locate_matches_cumulative_inversion() {
        let mut s = PartialPmfSums::new(&[1.0, 1.0, 1.0, 1.0]).unwrap();
        assert_eq!(s.locate(0.4), 0);
        assert_eq!(s.locate(1.4), 1);
        assert_eq!(s.locate(2.4), 2);
        assert_eq!(s.locate(3.6), 3);
        s.set_weight(2, 0.0).unwrap();
        assert_eq!(s.locate(2.4), 3);
    }

    #[test]
    fn stale_block_sum_moves_to_next_positive() {
        let mut s = PartialPmfSums::new(&[1.0, 1.0, 1.0, 1.0]).unwrap();
        s.weights.set(0, 0.0).unwrap();
        s.weights.set(1, 0.0).unwrap();
        s.block_sums[0] = 1e-9;
        assert_eq!(s.locate(0.0), 2);
    }

    #[test]
    fn removing_a_dominant_weight_resums_its_block() {
        let mut s = PartialPmfSums::new(&[1e20, 1.0, 1.0, 1.0]).unwrap();
        s.set_weight(0, 0.0).unwrap();
        assert_eq!(s.block_sums(), &[1.0, 2.0]);
        assert_eq!(s.weight_sum(), 3.0);
        assert_eq!(s.locate(0.5), 1);
        assert_eq!(s.locate(1.5), 2);
        assert_eq!(s.locate(2.5), 3);
    }

    #[test]
    fn periodic_repair_clears_drift() {
        let mut s = PartialPmfSums::new(&[0.1, 0.2, 0.3, 0.4]).unwrap();
        for _ in 0..resum_interval(4) {
            s.set_weight(0, 0.7).unwrap();
            s.set_weight(0, 0.1).unwrap();
        }
        let fresh = PartialPmfSums::new(&[0.1, 0.2, 0.3, 0.4]).unwrap();
        assert_eq!(s.block_sums(), fresh.block_sums());
    }

    #[test]
    fn repair_recomputes_sums() {
        let mut s = PartialPmfSums::new(&[2.0, 2.0, 2.0, 2.0]).unwrap();
        s.block_sums[1] = 100.0;
        s.repair();
        assert_eq!(s.block_sums(), &[4.0, 4.0]);
    }
}
