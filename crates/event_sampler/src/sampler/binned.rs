//! Rejection sampling over weights packed into a fixed number of bins.
//!
//! The weights, sorted by descending value, are packed into [BIN_COUNT] bins so that no
//! bin holds more than a common height bound. Heavy weights are split across several
//! consecutive bins; light weights are stacked several to a bin. A draw picks a random
//! point in the `BIN_COUNT × height_upper_bound` box and accepts it if it lands on a
//! weight, otherwise it tries again. A single 32-bit word supplies both coordinates:
//! the low [INDEX_BITS] bits choose the bin and the remaining [HEIGHT_BITS] bits the
//! height.
//!
//! The expected number of tries is `1 / efficiency`, with
//! `efficiency = weight_sum / (height_upper_bound · BIN_COUNT)`. Updating a weight
//! touches only the bins holding it, so both drawing and updating are O(1) as long as
//! the packing stays efficient. An [EfficiencyMonitor] schedules repairs (recompute bin
//! contents) and rebuilds (re-sort and repack) to keep it that way.
use rand::Rng;
use tracing::{debug, warn};

use crate::error::Result;
use crate::monitor::{EfficiencyMonitor, Maintenance, MaintenanceConfig};
use crate::permutation::SortedWeights;
use crate::sampler::{chop_down, DiscreteSampler};
use crate::uniform::discrete_u32;

/// Bits of the random word used to pick a bin.
pub const INDEX_BITS: u32 = 8;
/// Number of bins, one per value of the index bits.
pub const BIN_COUNT: usize = 1 << INDEX_BITS;
/// Mask extracting the bin index from a random word.
pub const INDEX_MASK: u32 = (BIN_COUNT as u32) - 1;
/// Bits of the random word left over for the height.
pub const HEIGHT_BITS: u32 = u32::BITS - INDEX_BITS;

const HEIGHT_SCALE: f64 = 1.0 / (1u64 << HEIGHT_BITS) as f64;

/// Bisection steps when searching for the smallest feasible height bound.
const PACKING_ITERATIONS: usize = 64;

/// Snapshot of the binned sampler's state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinnedDiagnostics {
    pub efficiency: f64,
    pub height_upper_bound: f64,
    pub weight_sum: f64,
    /// Weights spread over more than one bin.
    pub split_weights: usize,
    /// Bins holding at least one weight.
    pub occupied_bins: usize,
    pub repairs: u64,
    pub rebuilds: u64,
    /// Observed fraction of accepted draw attempts.
    pub acceptance_rate: Option<f64>,
}

/// Binned rejection sampler with splitting.
#[derive(Debug, Clone)]
pub struct BinnedRejection {
    weights: SortedWeights,
    /// Sum of the weight held by each bin.
    bin_contents: Vec<f64>,
    /// First storage position of each bin; `BIN_COUNT + 1` entries.
    deviate_starts: Vec<usize>,
    /// First bin of each storage position; `len + 1` entries.
    bin_starts: Vec<usize>,
    /// Storage positions `[0, split_end)` are split across several bins.
    split_end: usize,
    /// Bins `[0, split_bins_end)` each hold part of one split weight.
    split_bins_end: usize,
    occupied_bins: usize,
    height_upper_bound: f64,
    monitor: EfficiencyMonitor,
    /// Deferred updates are waiting for [BinnedRejection::commit].
    pending_commit: bool,
}

impl Default for BinnedRejection {
    fn default() -> Self {
        Self {
            weights: SortedWeights::default(),
            bin_contents: vec![0.0; BIN_COUNT],
            deviate_starts: vec![0; BIN_COUNT + 1],
            bin_starts: vec![0],
            split_end: 0,
            split_bins_end: 0,
            occupied_bins: 0,
            height_upper_bound: 0.0,
            monitor: EfficiencyMonitor::default(),
            pending_commit: false,
        }
    }
}

impl BinnedRejection {
    pub fn new(weights: &[f64]) -> Result<Self> {
        let mut out = Self::default();
        out.initialize(weights)?;
        Ok(out)
    }

    /// Use the given repair/rebuild schedule.
    pub fn with_maintenance(mut self, config: MaintenanceConfig) -> Result<Self> {
        self.set_maintenance(config)?;
        Ok(self)
    }

    pub fn set_maintenance(&mut self, config: MaintenanceConfig) -> Result<()> {
        self.monitor.set_config(config)
    }

    pub fn monitor(&self) -> &EfficiencyMonitor {
        &self.monitor
    }

    /// Weights in storage order together with their permutation/rank pair.
    pub fn sorted_weights(&self) -> &SortedWeights {
        &self.weights
    }

    pub fn bin_contents(&self) -> &[f64] {
        &self.bin_contents
    }

    pub fn height_upper_bound(&self) -> f64 {
        self.height_upper_bound
    }

    /// Expected fraction of accepted draw attempts. An all-zero vector reports `1.0`.
    pub fn efficiency(&self) -> f64 {
        if self.weights.is_degenerate() || self.height_upper_bound <= 0.0 {
            return 1.0;
        }
        self.weights.sum() / (self.height_upper_bound * BIN_COUNT as f64)
    }

    pub fn diagnostics(&self) -> BinnedDiagnostics {
        BinnedDiagnostics {
            efficiency: self.efficiency(),
            height_upper_bound: self.height_upper_bound,
            weight_sum: self.weights.sum(),
            split_weights: self.split_end,
            occupied_bins: self.occupied_bins,
            repairs: self.monitor.repairs(),
            rebuilds: self.monitor.rebuilds(),
            acceptance_rate: self.monitor.acceptance_rate(),
        }
    }

    /// Replace a weight without refreshing its bins.
    ///
    /// [BinnedRejection::commit] must run before the next draw; [DiscreteSampler::draw]
    /// commits on its own if it finds pending updates.
    pub fn set_weight_deferred(&mut self, index: usize, value: f64) -> Result<()> {
        self.weights.set(index, value)?;
        self.monitor.record_deferred_update();
        self.pending_commit = true;
        Ok(())
    }

    /// Refresh bin contents, the weight sum and the height bound after deferred updates.
    pub fn commit(&mut self) {
        self.weights.recompute_sum();
        self.bin_contents.iter_mut().for_each(|c| *c = 0.0);

        let values = self.weights.storage().as_slice();
        for (position, &w) in values.iter().enumerate() {
            if position < self.split_end {
                let (start, end) = (self.bin_starts[position], self.bin_starts[position + 1]);
                let share = w / (end - start) as f64;
                self.bin_contents[start..end].iter_mut().for_each(|c| *c = share);
            } else {
                self.bin_contents[self.bin_starts[position]] += w;
            }
        }
        self.height_upper_bound = self.bin_contents.iter().copied().fold(0.0, f64::max);
        self.pending_commit = false;
    }

    /// Recompute cached bin data without changing the packing.
    pub fn repair(&mut self) {
        self.commit();
        self.monitor.repaired();
        debug!(efficiency = self.efficiency(), "binned sampler repaired");
    }

    /// Re-sort the weights and pack them into bins from scratch.
    pub fn rebuild(&mut self) {
        self.repack();
        self.monitor.rebuilt();

        let efficiency = self.efficiency();
        let config = *self.monitor.config();
        if efficiency < config.minimum_efficiency {
            warn!(
                efficiency,
                minimum = config.minimum_efficiency,
                "binned sampler efficiency below minimum after rebuild"
            );
        } else {
            debug!(efficiency, "binned sampler rebuilt");
        }
    }

    fn repack(&mut self) {
        self.weights.sort_descending();
        self.weights.recompute_sum();
        self.pending_commit = false;

        let n = self.weights.len();
        self.bin_contents.iter_mut().for_each(|c| *c = 0.0);
        self.deviate_starts.iter_mut().for_each(|d| *d = n);
        self.bin_starts.clear();
        self.bin_starts.resize(n + 1, 0);
        self.split_end = 0;
        self.split_bins_end = 0;
        self.occupied_bins = 0;
        self.height_upper_bound = 0.0;

        if n == 0 {
            return;
        }
        if self.weights.is_degenerate() {
            self.pack_by_count();
        } else {
            let height = minimal_height(self.weights.storage().as_slice(), self.weights.sum());
            self.pack_with_height(height);
        }
        self.height_upper_bound = self.bin_contents.iter().copied().fold(0.0, f64::max);
    }

    /// Spread an all-zero vector evenly so every position has a bin.
    fn pack_by_count(&mut self) {
        let n = self.weights.len();
        let per_bin = n.div_ceil(BIN_COUNT);
        for position in 0..n {
            let bin = position / per_bin;
            if position % per_bin == 0 {
                self.deviate_starts[bin] = position;
            }
            self.bin_starts[position] = bin;
        }
        self.occupied_bins = n.div_ceil(per_bin);
        self.bin_starts[n] = self.occupied_bins;
    }

    /// Pack sorted weights under `height`, which [minimal_height] has shown to fit.
    fn pack_with_height(&mut self, height: f64) {
        let values = self.weights.storage().as_slice();
        let n = values.len();

        let mut bin = 0;
        let mut position = 0;
        while position < n && values[position] > height {
            let w = values[position];
            let count = split_count(w, height);
            self.bin_starts[position] = bin;
            let share = w / count as f64;
            for b in bin..bin + count {
                self.deviate_starts[b] = position;
                self.bin_contents[b] = share;
            }
            bin += count;
            position += 1;
        }
        self.split_end = position;
        self.split_bins_end = bin;

        let mut fill = 0.0;
        let mut open = false;
        for (offset, &w) in values[position..].iter().enumerate() {
            let q = position + offset;
            if open && fill + w <= height {
                fill += w;
            } else {
                if open {
                    bin += 1;
                }
                open = true;
                fill = w;
                self.deviate_starts[bin] = q;
            }
            self.bin_starts[q] = bin;
            self.bin_contents[bin] += w;
        }

        self.occupied_bins = if open { bin + 1 } else { bin };
        self.bin_starts[n] = self.occupied_bins;
        debug_assert!(self.occupied_bins <= BIN_COUNT);
        self.spread_zero_tail();
    }

    /// Move trailing zero weights out of the last stacked bin into unused bins.
    ///
    /// Zeros stack freely under any height, so packing leaves them all in one bin. Raising
    /// several of them would then pile their new weights onto that bin.
    fn spread_zero_tail(&mut self) {
        let values = self.weights.storage().as_slice();
        let n = values.len();
        let first_zero = values.partition_point(|&w| w > 0.0);
        if first_zero == n {
            return;
        }
        let last = self.bin_starts[first_zero];
        let first_bin = if self.deviate_starts[last] == first_zero {
            last
        } else {
            last + 1
        };
        let free = BIN_COUNT - first_bin;
        if free == 0 {
            return;
        }

        let zeros = n - first_zero;
        let per_bin = zeros.div_ceil(free);
        for k in 0..zeros {
            let bin = first_bin + k / per_bin;
            if k % per_bin == 0 {
                self.deviate_starts[bin] = first_zero + k;
            }
            self.bin_starts[first_zero + k] = bin;
        }
        self.occupied_bins = first_bin + zeros.div_ceil(per_bin);
        self.bin_starts[n] = self.occupied_bins;
    }

    /// Refresh the bins holding storage `position` after its weight went from `old` to `new`.
    fn refresh_position(&mut self, position: usize, old: f64, new: f64) {
        if position < self.split_end {
            let (start, end) = (self.bin_starts[position], self.bin_starts[position + 1]);
            let share = new / (end - start) as f64;
            self.bin_contents[start..end].iter_mut().for_each(|c| *c = share);
            self.height_upper_bound = self.height_upper_bound.max(share);
        } else {
            let bin = self.bin_starts[position];
            let content = (self.bin_contents[bin] + (new - old)).max(0.0);
            self.bin_contents[bin] = content;
            self.height_upper_bound = self.height_upper_bound.max(content);
        }
    }

    /// Map an accepted point to an external index, or `None` if round-off left a gap.
    #[inline]
    fn resolve(&self, bin: usize, height: f64) -> Option<usize> {
        if bin < self.split_bins_end {
            return Some(self.weights.index_at(self.deviate_starts[bin]));
        }
        let start = self.deviate_starts[bin];
        let end = self.deviate_starts[bin + 1];
        let values = self.weights.storage().as_slice();
        chop_down(&values[start..end], height).map(|offset| self.weights.index_at(start + offset))
    }
}

impl DiscreteSampler for BinnedRejection {
    fn initialize(&mut self, weights: &[f64]) -> Result<()> {
        self.weights = SortedWeights::new(weights)?;
        self.repack();
        self.monitor.restart();
        Ok(())
    }

    fn draw<R: Rng + ?Sized>(&mut self, rng: &mut R) -> usize {
        if self.weights.is_degenerate() {
            return 0;
        }
        if self.pending_commit {
            self.commit();
        }
        match self.monitor.poll(self.efficiency()) {
            Maintenance::Rebuild => self.rebuild(),
            Maintenance::Repair => self.repair(),
            Maintenance::None => {}
        }

        let mut attempts = 0;
        loop {
            attempts += 1;
            let word = discrete_u32(rng);
            let bin = (word & INDEX_MASK) as usize;
            let height = (word >> INDEX_BITS) as f64 * HEIGHT_SCALE * self.height_upper_bound;
            if height >= self.bin_contents[bin] {
                continue;
            }
            if let Some(index) = self.resolve(bin, height) {
                self.monitor.record_attempts(attempts);
                return index;
            }
        }
    }

    fn set_weight(&mut self, index: usize, value: f64) -> Result<()> {
        let (position, old) = self.weights.set(index, value)?;
        self.monitor.record_update();
        self.refresh_position(position, old, value);
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

#[inline]
fn split_count(weight: f64, height: f64) -> usize {
    ((weight / height).ceil() as usize).max(1)
}

/// Number of bins needed to pack descending `values` with no bin above `height`.
///
/// Mirrors [BinnedRejection::pack_with_height] and stops counting past [BIN_COUNT].
fn bins_required(values: &[f64], height: f64) -> usize {
    let mut bins = 0;
    let mut position = 0;
    while position < values.len() && values[position] > height {
        bins += split_count(values[position], height);
        if bins > BIN_COUNT {
            return bins;
        }
        position += 1;
    }

    let mut fill = 0.0;
    let mut open = false;
    for &w in &values[position..] {
        if open && fill + w <= height {
            fill += w;
        } else {
            bins += 1;
            if bins > BIN_COUNT {
                return bins;
            }
            open = true;
            fill = w;
        }
    }
    bins
}

/// Smallest height bound (up to bisection precision) under which `values` fit the bins.
fn minimal_height(values: &[f64], sum: f64) -> f64 {
    let mut lo = sum / BIN_COUNT as f64;
    if bins_required(values, lo) <= BIN_COUNT {
        return lo;
    }
    let mut hi = sum;
    for _ in 0..PACKING_ITERATIONS {
        let mid = 0.5 * (lo + hi);
        if mid <= lo || mid >= hi {
            break;
        }
        if bins_required(values, mid) <= BIN_COUNT {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    hi
}
