//! A FIFO standing in for a priority queue.
use std::collections::VecDeque;

use crate::queue::{assert_not_sentinel, IndexedPriorityQueue, SENTINEL};

/// Hands out indices in the order they were pushed, ignoring their keys.
///
/// Useful when every pending event shares the same key, or as a baseline when measuring
/// what priority ordering costs. Removing an arbitrary index is not supported.
#[derive(Debug, Clone, Default)]
pub struct PlaceboQueue {
    keys: Vec<f64>,
    queue: VecDeque<usize>,
    top: Option<usize>,
}

impl PlaceboQueue {
    pub fn new(len: usize) -> Self {
        Self {
            keys: vec![SENTINEL; len],
            queue: VecDeque::with_capacity(len),
            top: None,
        }
    }

    /// Indices waiting behind the current top.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl IndexedPriorityQueue for PlaceboQueue {
    const USES_PROPENSITIES: bool = false;

    fn len(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    fn get(&self, index: usize) -> f64 {
        self.keys[index]
    }

    fn push(&mut self, index: usize, key: f64) {
        assert_not_sentinel(index, key);
        self.keys[index] = key;
        self.queue.push_back(index);
    }

    fn set(&mut self, index: usize, key: f64) {
        assert_not_sentinel(index, key);
        self.keys[index] = key;
    }

    /// # Panics
    ///
    /// If nothing has been pushed since the last top was popped.
    fn top(&mut self, _propensities: &[f64]) -> usize {
        if let Some(index) = self.top {
            return index;
        }
        let Some(index) = self.queue.pop_front() else {
            panic!("top called on an empty placebo queue");
        };
        self.top = Some(index);
        index
    }

    fn pop_top(&mut self) {
        let Some(index) = self.top.take() else {
            panic!("pop_top called before top");
        };
        self.keys[index] = SENTINEL;
    }

    /// Always panics: a FIFO cannot remove from the middle.
    fn pop(&mut self, index: usize) {
        panic!("placebo queue cannot pop arbitrary index {index}; use pop_top");
    }

    fn push_top(&mut self, key: f64) {
        let Some(index) = self.top.take() else {
            panic!("push_top called before top");
        };
        self.push(index, key);
    }

    fn clear(&mut self) {
        self.keys.iter_mut().for_each(|k| *k = SENTINEL);
        self.queue.clear();
        self.top = None;
    }
}
