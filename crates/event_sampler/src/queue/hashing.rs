//! Indexed priority queue backed by a hash table with chaining.
//!
//! Keys are hashed by value into buckets of equal width covering a window that starts at
//! the smallest live key. The bucket width is chosen from the propensities so that about
//! `target_load` elements land in each bucket: in a next-reaction simulation the keys are
//! firing times, and the total propensity is the rate at which they are consumed.
//! Finding the minimum then means scanning the first non-empty bucket, and updating a key
//! means moving one index between two short chains.
//!
//! Keys beyond the window are not stored. Once every bucket up to the end of the window
//! has been consumed, [HashingQueue] rebuilds the table from the key array with a new
//! window starting at the smallest live key.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{Error, Result};
use crate::queue::{assert_not_sentinel, IndexedPriorityQueue, SENTINEL};

/// Hash table sizing.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HashingConfig {
    /// Number of buckets. `None` uses one bucket per element.
    pub table_size: Option<usize>,
    /// Expected number of elements per bucket.
    pub target_load: f64,
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            table_size: None,
            target_load: 2.0,
        }
    }
}

impl HashingConfig {
    /// Sets the number of buckets.
    pub fn with_table_size(mut self, table_size: usize) -> Self {
        self.table_size = Some(table_size);
        self
    }

    /// Sets the target load factor.
    pub fn with_target_load(mut self, target_load: f64) -> Self {
        self.target_load = target_load;
        self
    }

    /// Validates the configuration, returning an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.table_size == Some(0) {
            return Err(Error::InvalidConfig("table_size must be > 0".into()));
        }
        if !(self.target_load.is_finite() && self.target_load > 0.0) {
            return Err(Error::InvalidConfig(
                "target_load must be finite and > 0".into(),
            ));
        }
        Ok(())
    }

    /// Bucket count for a queue of `len` elements.
    pub fn buckets_for(&self, len: usize) -> usize {
        self.table_size.unwrap_or(len).max(1)
    }
}

/// Priority queue that finds the minimum by hashing keys into a bucketed window.
#[derive(Debug, Clone)]
pub struct HashingQueue {
    config: HashingConfig,
    keys: Vec<f64>,
    buckets: Vec<Vec<usize>>,
    /// Bucket holding each index, if it is stored in the table.
    slots: Vec<Option<usize>>,
    /// Key at the start of bucket 0.
    lower: f64,
    /// Buckets per unit of key.
    inverse_length: f64,
    /// Buckets before this one are empty.
    cursor: usize,
    /// Cached minimum, dropped whenever a key changes.
    top: Option<usize>,
    /// Index that `pop_top` and `push_top` act on.
    last_top: Option<usize>,
    rebuilds: u64,
}

impl HashingQueue {
    /// Queue of `len` absent elements with the default table sizing.
    pub fn new(len: usize) -> Self {
        let config = HashingConfig::default();
        let table_size = config.buckets_for(len);
        Self {
            config,
            keys: vec![SENTINEL; len],
            buckets: vec![Vec::new(); table_size],
            slots: vec![None; len],
            lower: 0.0,
            inverse_length: 0.0,
            // Exhausted until the first rebuild.
            cursor: table_size,
            top: None,
            last_top: None,
            rebuilds: 0,
        }
    }

    pub fn with_config(len: usize, config: HashingConfig) -> Result<Self> {
        config.validate()?;
        let mut out = Self::new(len);
        let table_size = config.buckets_for(len);
        out.config = config;
        out.buckets = vec![Vec::new(); table_size];
        out.cursor = table_size;
        Ok(out)
    }

    pub fn config(&self) -> &HashingConfig {
        &self.config
    }

    #[inline]
    pub fn table_size(&self) -> usize {
        self.buckets.len()
    }

    /// Number of times the table has been rebuilt.
    #[inline]
    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }

    /// Number of indices currently stored in the table.
    pub fn stored(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Bucket for `key`, or `None` if it falls outside the window.
    #[inline]
    fn bucket_for(&self, key: f64) -> Option<usize> {
        if key == SENTINEL || self.cursor >= self.buckets.len() {
            return None;
        }
        let offset = (key - self.lower) * self.inverse_length;
        if offset < self.cursor as f64 {
            return Some(self.cursor);
        }
        if offset < self.buckets.len() as f64 {
            Some(offset as usize)
        } else {
            None
        }
    }

    fn insert(&mut self, index: usize) {
        if let Some(bucket) = self.bucket_for(self.keys[index]) {
            self.buckets[bucket].push(index);
            self.slots[index] = Some(bucket);
        }
    }

    fn remove(&mut self, index: usize) {
        if let Some(bucket) = self.slots[index].take() {
            let chain = &mut self.buckets[bucket];
            if let Some(p) = chain.iter().position(|&i| i == index) {
                chain.swap_remove(p);
            }
        }
    }

    fn place(&mut self, index: usize, key: f64) {
        assert_not_sentinel(index, key);
        self.remove(index);
        self.keys[index] = key;
        self.insert(index);
        self.top = None;
    }

    /// Rehash every live key into a window starting at the smallest one.
    fn rebuild(&mut self, propensity_sum: f64) {
        let inverse_length = propensity_sum / self.config.target_load;
        assert!(
            inverse_length.is_finite(),
            "hashing queue needs a finite propensity sum, got {propensity_sum}"
        );
        let lower = self
            .keys
            .iter()
            .copied()
            .filter(|k| k.is_finite() && *k != SENTINEL)
            .min_by(f64::total_cmp);
        let Some(lower) = lower else {
            panic!("hashing queue has positive propensities but no element with a finite key");
        };

        self.buckets.iter_mut().for_each(Vec::clear);
        self.slots.iter_mut().for_each(|s| *s = None);
        self.lower = lower;
        self.inverse_length = inverse_length;
        self.cursor = 0;
        for index in 0..self.keys.len() {
            self.insert(index);
        }
        self.rebuilds += 1;
        trace!(
            lower,
            stored = self.stored(),
            table_size = self.buckets.len(),
            "hashing queue rebuilt"
        );
    }

    /// Minimum-key index in the first non-empty bucket at or after the cursor.
    fn scan(&mut self) -> Option<usize> {
        while self.cursor < self.buckets.len() {
            let keys = &self.keys;
            let found = self.buckets[self.cursor]
                .iter()
                .copied()
                .min_by(|&a, &b| keys[a].total_cmp(&keys[b]));
            if found.is_some() {
                return found;
            }
            self.cursor += 1;
        }
        None
    }
}

impl IndexedPriorityQueue for HashingQueue {
    const USES_PROPENSITIES: bool = true;

    fn len(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    fn get(&self, index: usize) -> f64 {
        self.keys[index]
    }

    fn push(&mut self, index: usize, key: f64) {
        self.place(index, key);
    }

    fn set(&mut self, index: usize, key: f64) {
        self.place(index, key);
    }

    /// Returns `0` without touching the table when the window is exhausted and every
    /// propensity is zero; `pop_top` and `push_top` then act on index `0`.
    ///
    /// # Panics
    ///
    /// If the propensities sum to a positive value but no element has a finite key, or
    /// if their sum is not finite.
    fn top(&mut self, propensities: &[f64]) -> usize {
        if let Some(index) = self.top {
            self.last_top = Some(index);
            return index;
        }
        loop {
            if let Some(index) = self.scan() {
                self.top = Some(index);
                self.last_top = Some(index);
                return index;
            }
            let sum: f64 = propensities.iter().sum();
            if sum <= 0.0 {
                self.last_top = Some(0);
                return 0;
            }
            self.rebuild(sum);
        }
    }

    fn pop_top(&mut self) {
        let Some(index) = self.last_top.take() else {
            panic!("pop_top called before top");
        };
        self.pop(index);
    }

    fn pop(&mut self, index: usize) {
        self.remove(index);
        self.keys[index] = SENTINEL;
        if self.top == Some(index) {
            self.top = None;
        }
        if self.last_top == Some(index) {
            self.last_top = None;
        }
    }

    fn push_top(&mut self, key: f64) {
        let Some(index) = self.last_top.take() else {
            panic!("push_top called before top");
        };
        self.place(index, key);
    }

    fn clear(&mut self) {
        self.keys.iter_mut().for_each(|k| *k = SENTINEL);
        self.buckets.iter_mut().for_each(Vec::clear);
        self.slots.iter_mut().for_each(|s| *s = None);
        self.cursor = self.buckets.len();
        self.top = None;
        self.last_top = None;
    }
}
