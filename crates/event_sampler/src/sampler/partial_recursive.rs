//! CDF inversion with a partial recursive CDF.
//!
//! Starting from the PMF, every second element gets the element before it added, then
//! every fourth element gets the element two places back, then every eighth gets the
//! element four places back, and so on. After log₂N passes the last slot holds the total
//! and slot `i` holds the sum of a power-of-two run ending at `i`. A draw walks down from
//! the largest run in log₂N steps; an update walks up through the runs containing the
//! changed index.
//!
//! A partial sum that cancels on update is summed again from the runs beneath it, and
//! the whole table is rebuilt periodically to clear accumulated drift.
use rand::Rng;

use crate::error::Result;
use crate::sampler::DiscreteSampler;
use crate::uniform::unit_f64;
use crate::weights::{accumulate, resum_interval, WeightVector};

#[derive(Debug, Clone, Default)]
pub struct PartialRecursiveCdf {
    weights: WeightVector,
    /// Partial sums, padded with zeros to a power-of-two length.
    partial: Vec<f64>,
    steps_until_rebuild: i64,
}

impl PartialRecursiveCdf {
    pub fn new(weights: &[f64]) -> Result<Self> {
        let mut out = Self::default();
        out.initialize(weights)?;
        Ok(out)
    }

    /// The partial sums, including the zero padding.
    pub fn partial_sums(&self) -> &[f64] {
        &self.partial
    }

    /// Recompute every partial sum from the weights.
    pub fn rebuild(&mut self) {
        let n = self.weights.len();
        let size = if n == 0 { 0 } else { n.next_power_of_two() };
        self.partial.clear();
        self.partial.extend_from_slice(self.weights.as_slice());
        self.partial.resize(size, 0.0);

        let mut step = 1;
        while step < size {
            let mut i = 2 * step - 1;
            while i < size {
                self.partial[i] += self.partial[i - step];
                i += 2 * step;
            }
            step *= 2;
        }
        self.weights.recompute_sum();
        self.steps_until_rebuild = resum_interval(n);
    }

    /// Sum for 1-based `slot` from its own weight and the runs directly beneath it.
    fn resum_slot(&self, slot: usize) -> f64 {
        let own = self.weights.as_slice().get(slot - 1).copied().unwrap_or(0.0);
        let run = slot & slot.wrapping_neg();
        let mut sum = own;
        let mut step = 1;
        while step < run {
            sum += self.partial[slot - 1 - step];
            step *= 2;
        }
        sum
    }

    #[inline]
    fn total(&self) -> f64 {
        self.partial.last().copied().unwrap_or(0.0)
    }

    /// Map a scaled variate `r` to the smallest index whose cumulative sum exceeds it.
    pub fn locate(&self, mut r: f64) -> usize {
        let size = self.partial.len();
        let mut position = 0;
        let mut step = size;
        while step > 0 {
            let next = position + step;
            if next <= size && self.partial[next - 1] <= r {
                r -= self.partial[next - 1];
                position = next;
            }
            step /= 2;
        }
        if position < self.weights.len() {
            position
        } else {
            self.weights.last_positive().unwrap_or(0)
        }
    }
}

impl DiscreteSampler for PartialRecursiveCdf {
    fn initialize(&mut self, weights: &[f64]) -> Result<()> {
        self.weights = WeightVector::new(weights)?;
        self.rebuild();
        Ok(())
    }

    fn draw<R: Rng + ?Sized>(&mut self, rng: &mut R) -> usize {
        if self.weights.is_degenerate() {
            return 0;
        }
        self.locate(unit_f64(rng) * self.total())
    }

    fn set_weight(&mut self, index: usize, value: f64) -> Result<()> {
        let old = self.weights.set(index, value)?;
        if self.weights.is_degenerate() {
            self.partial.iter_mut().for_each(|p| *p = 0.0);
            return Ok(());
        }

        self.steps_until_rebuild -= 1;
        if self.steps_until_rebuild <= 0 {
            self.rebuild();
            return Ok(());
        }

        let delta = value - old;
        let size = self.partial.len();
        let mut slot = index + 1;
        while slot <= size {
            self.partial[slot - 1] = match accumulate(self.partial[slot - 1], delta) {
                Some(sum) => sum,
                None => self.resum_slot(slot),
            };
            slot += slot & slot.wrapping_neg();
        }
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
    fn build_produces_power_of_two_runs() {
        let s = PartialRecursiveCdf::new(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert_eq!(
            s.partial_sums(),
            &[1.0, 3.0, 3.0, 10.0, 5.0, 5.0, 0.0, 15.0]
        );
    }

    #[test]
    fn update_touches_enclosing_runs() {
        let mut s = PartialRecursiveCdf::new(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        s.set_weight(2, 0.0).unwrap();
        assert_eq!(
            s.partial_sums(),
            &[1.0, 3.0, 0.0, 7.0, 5.0, 5.0, 0.0, 12.0]
        );
        assert!((s.weight_sum() - 12.0).abs() < 1e-12);
    }

    #[test]
    fn locate_inverts_cumulative_sums() {
        let s = PartialRecursiveCdf::new(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert_eq!(s.locate(0.0), 0);
        assert_eq!(s.locate(0.99), 0);
        assert_eq!(s.locate(1.0), 1);
        assert_eq!(s.locate(5.5), 2);
        assert_eq!(s.locate(6.0), 3);
        assert_eq!(s.locate(14.9), 4);
    }

    #[test]
    fn zeroed_weight_shifts_variate_to_next_index() {
        let mut s = PartialRecursiveCdf::new(&[1.0, 1.0, 1.0, 1.0]).unwrap();
        assert_eq!(s.locate(2.4), 2);
        s.set_weight(2, 0.0).unwrap();
        assert_eq!(s.locate(2.4), 3);
    }

    #[test]
    fn removing_a_dominant_weight_resums_its_runs() {
        let mut s = PartialRecursiveCdf::new(&[1e20, 1.0, 1.0, 1.0]).unwrap();
        s.set_weight(0, 0.0).unwrap();
        assert_eq!(s.partial_sums(), &[0.0, 1.0, 1.0, 3.0]);
        assert_eq!(s.weight_sum(), 3.0);
        assert_eq!(s.locate(0.5), 1);
        assert_eq!(s.locate(1.5), 2);
        assert_eq!(s.locate(2.5), 3);
    }

    #[test]
    fn zeroing_a_lone_run_keeps_other_sums() {
        let mut s = PartialRecursiveCdf::new(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        s.set_weight(4, 0.0).unwrap();
        assert_eq!(
            s.partial_sums(),
            &[1.0, 3.0, 3.0, 10.0, 0.0, 0.0, 0.0, 10.0]
        );
    }

    #[test]
    fn overshoot_never_lands_in_padding() {
        let s = PartialRecursiveCdf::new(&[1.0, 1.0, 1.0]).unwrap();
        assert_eq!(s.locate(3.0), 2);
        assert_eq!(s.locate(100.0), 2);
    }

    #[test]
    fn rebuild_removes_accumulated_drift() {
        let mut s = PartialRecursiveCdf::new(&[0.1, 0.2, 0.3]).unwrap();
        for _ in 0..1000 {
            s.set_weight(0, 0.7).unwrap();
            s.set_weight(0, 0.1).unwrap();
        }
        s.rebuild();
        let fresh = PartialRecursiveCdf::new(&[0.1, 0.2, 0.3]).unwrap();
        assert_eq!(s.partial_sums(), fresh.partial_sums());
    }

    #[test]
    fn empty_vector_has_no_partial_sums() {
        let s = PartialRecursiveCdf::new(&[]).unwrap();
        assert!(s.partial_sums().is_empty());
        assert_eq!(s.locate(0.0), 0);
    }
}
