//! Indexed priority queues for next-reaction scheduling.
//!
//! Every element is addressed by a fixed index in `0..len()` and carries an `f64` key.
//! A key equal to [SENTINEL] marks the element as absent, so each index moves through
//! `absent -> present(key) -> absent` as it is pushed and popped. A simulation loop asks
//! for [IndexedPriorityQueue::top], fires that event, then either pops it or pushes it
//! back with its next key via [IndexedPriorityQueue::push_top].
//!
//! Keys equal to [SENTINEL] are rejected with a panic: they would make a present
//! element indistinguishable from an absent one.
pub mod hashing;
pub mod placebo;

pub use hashing::{HashingConfig, HashingQueue};
pub use placebo::PlaceboQueue;

/// Key of an absent element.
pub const SENTINEL: f64 = f64::MAX;

/// Common capability of the indexed priority queues.
pub trait IndexedPriorityQueue {
    /// Whether [IndexedPriorityQueue::top] reads the propensities it is given.
    const USES_PROPENSITIES: bool;

    /// Number of index slots, present or not.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Key at `index`; [SENTINEL] if absent.
    fn get(&self, index: usize) -> f64;

    fn is_present(&self, index: usize) -> bool {
        self.get(index) != SENTINEL
    }

    /// Insert `index` with `key`.
    fn push(&mut self, index: usize, key: f64);

    /// Replace the key of a present `index`.
    fn set(&mut self, index: usize, key: f64);

    /// Index of the next element to fire. It stays in the queue until popped.
    fn top(&mut self, propensities: &[f64]) -> usize;

    /// Remove the element last returned by [IndexedPriorityQueue::top].
    fn pop_top(&mut self);

    /// Remove `index`.
    fn pop(&mut self, index: usize);

    /// Give the element last returned by [IndexedPriorityQueue::top] a new key.
    fn push_top(&mut self, key: f64);

    /// Mark every element absent.
    fn clear(&mut self);
}

#[inline]
pub(crate) fn assert_not_sentinel(index: usize, key: f64) {
    assert!(
        key != SENTINEL,
        "key for index {index} collides with the absent-element sentinel"
    );
}
