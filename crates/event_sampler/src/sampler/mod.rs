//! Strategies for drawing an index with probability proportional to its weight.
//!
//! Every strategy implements [DiscreteSampler] over the same data: a vector of
//! non-negative weights that can be changed one at a time between draws. They differ in
//! how they trade draw cost against update cost:
//!
//! | strategy                | draw            | update          |
//! |-------------------------|-----------------|-----------------|
//! | [LinearSearch]          | O(N)            | O(1)            |
//! | [SortedLinearSearch]    | O(N), shorter   | O(1) amortized  |
//! | [BinarySearchCdf]       | O(log N)        | O(N)            |
//! | [PartialPmfSums]        | O(√N)           | O(1)            |
//! | [PartialRecursiveCdf]   | O(log N)        | O(log N)        |
//! | [BinnedRejection]       | O(1/efficiency) | O(1) amortized  |
//!
//! [Sampler] wraps the closed set of strategies behind one type chosen at runtime with
//! [SamplerKind], dispatching with a `match` rather than a vtable.
//!
//! When every weight is zero there is no valid event; `draw` then returns index `0`
//! without touching the RNG.
use std::fmt;
use std::str::FromStr;

use rand::Rng;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub mod binary_search;
pub mod binned;
pub mod linear;
pub mod partial_recursive;
pub mod partial_sums;

pub use binary_search::BinarySearchCdf;
pub use binned::{BinnedDiagnostics, BinnedRejection};
pub use linear::{LinearSearch, SortedLinearSearch};
pub use partial_recursive::PartialRecursiveCdf;
pub use partial_sums::PartialPmfSums;

/// Common capability of every sampling strategy.
pub trait DiscreteSampler {
    /// Replace all weights and rebuild auxiliary structures.
    fn initialize(&mut self, weights: &[f64]) -> Result<()>;

    /// Draw an index `i` with probability `weight(i) / weight_sum()`.
    fn draw<R: Rng + ?Sized>(&mut self, rng: &mut R) -> usize;

    /// Replace the weight at `index`. The sampler is ready to draw on return.
    fn set_weight(&mut self, index: usize, value: f64) -> Result<()>;

    /// Current weight at `index`.
    fn weight(&self, index: usize) -> f64;

    /// Sum of all weights.
    fn weight_sum(&self) -> f64;

    /// Number of possible outcomes.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True if the weights sum to a positive value.
    fn is_valid(&self) -> bool {
        self.weight_sum() > 0.0
    }
}

/// Chop-down search: the smallest `i` whose cumulative weight exceeds `r`.
///
/// Returns `None` when round-off carries `r` past the end.
#[inline]
pub(crate) fn chop_down(values: &[f64], mut r: f64) -> Option<usize> {
    for (i, &w) in values.iter().enumerate() {
        if r < w {
            return Some(i);
        }
        r -= w;
    }
    None
}

/// Selects one of the built-in strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SamplerKind {
    LinearSearch,
    SortedLinearSearch,
    BinarySearchCdf,
    PartialPmfSums,
    PartialRecursiveCdf,
    BinnedRejection,
}

impl SamplerKind {
    pub const ALL: [SamplerKind; 6] = [
        SamplerKind::LinearSearch,
        SamplerKind::SortedLinearSearch,
        SamplerKind::BinarySearchCdf,
        SamplerKind::PartialPmfSums,
        SamplerKind::PartialRecursiveCdf,
        SamplerKind::BinnedRejection,
    ];

    /// Short kebab-case name, accepted back by [FromStr].
    pub fn name(self) -> &'static str {
        match self {
            SamplerKind::LinearSearch => "linear-search",
            SamplerKind::SortedLinearSearch => "sorted-linear-search",
            SamplerKind::BinarySearchCdf => "binary-search",
            SamplerKind::PartialPmfSums => "partial-pmf-sums",
            SamplerKind::PartialRecursiveCdf => "partial-recursive-cdf",
            SamplerKind::BinnedRejection => "binned-rejection",
        }
    }
}

impl fmt::Display for SamplerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SamplerKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        SamplerKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| Error::InvalidConfig(format!("unknown sampler kind '{s}'")))
    }
}

/// One of the built-in strategies, chosen at runtime.
#[derive(Debug, Clone)]
pub enum Sampler {
    LinearSearch(LinearSearch),
    SortedLinearSearch(SortedLinearSearch),
    BinarySearchCdf(BinarySearchCdf),
    PartialPmfSums(PartialPmfSums),
    PartialRecursiveCdf(PartialRecursiveCdf),
    BinnedRejection(BinnedRejection),
}

impl Sampler {
    /// Build the strategy selected by `kind` over `weights`.
    pub fn new(kind: SamplerKind, weights: &[f64]) -> Result<Self> {
        Ok(match kind {
            SamplerKind::LinearSearch => Sampler::LinearSearch(LinearSearch::new(weights)?),
            SamplerKind::SortedLinearSearch => {
                Sampler::SortedLinearSearch(SortedLinearSearch::new(weights)?)
            }
            SamplerKind::BinarySearchCdf => {
                Sampler::BinarySearchCdf(BinarySearchCdf::new(weights)?)
            }
            SamplerKind::PartialPmfSums => Sampler::PartialPmfSums(PartialPmfSums::new(weights)?),
            SamplerKind::PartialRecursiveCdf => {
                Sampler::PartialRecursiveCdf(PartialRecursiveCdf::new(weights)?)
            }
            SamplerKind::BinnedRejection => {
                Sampler::BinnedRejection(BinnedRejection::new(weights)?)
            }
        })
    }

    pub fn kind(&self) -> SamplerKind {
        match self {
            Sampler::LinearSearch(_) => SamplerKind::LinearSearch,
            Sampler::SortedLinearSearch(_) => SamplerKind::SortedLinearSearch,
            Sampler::BinarySearchCdf(_) => SamplerKind::BinarySearchCdf,
            Sampler::PartialPmfSums(_) => SamplerKind::PartialPmfSums,
            Sampler::PartialRecursiveCdf(_) => SamplerKind::PartialRecursiveCdf,
            Sampler::BinnedRejection(_) => SamplerKind::BinnedRejection,
        }
    }
}

macro_rules! dispatch {
    ($self:expr, $s:ident => $body:expr) => {
        match $self {
            Sampler::LinearSearch($s) => $body,
            Sampler::SortedLinearSearch($s) => $body,
            Sampler::BinarySearchCdf($s) => $body,
            Sampler::PartialPmfSums($s) => $body,
            Sampler::PartialRecursiveCdf($s) => $body,
            Sampler::BinnedRejection($s) => $body,
        }
    };
}

impl DiscreteSampler for Sampler {
    fn initialize(&mut self, weights: &[f64]) -> Result<()> {
        dispatch!(self, s => s.initialize(weights))
    }

    #[inline]
    fn draw<R: Rng + ?Sized>(&mut self, rng: &mut R) -> usize {
        dispatch!(self, s => s.draw(rng))
    }

    #[inline]
    fn set_weight(&mut self, index: usize, value: f64) -> Result<()> {
        dispatch!(self, s => s.set_weight(index, value))
    }

    fn weight(&self, index: usize) -> f64 {
        dispatch!(self, s => s.weight(index))
    }

    fn weight_sum(&self) -> f64 {
        dispatch!(self, s => s.weight_sum())
    }

    fn len(&self) -> usize {
        dispatch!(self, s => s.len())
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::uniform::ReplayRng;

    #[test]
    fn chop_down_picks_first_bucket_exceeding_variate() {
        let w = [1.0, 1.0, 0.0, 1.0];
        assert_eq!(chop_down(&w, 0.0), Some(0));
        assert_eq!(chop_down(&w, 0.99), Some(0));
        assert_eq!(chop_down(&w, 1.0), Some(1));
        assert_eq!(chop_down(&w, 2.4), Some(3));
        assert_eq!(chop_down(&w, 3.0), None);
    }

    #[test]
    fn chop_down_skips_leading_zero_at_zero_variate() {
        assert_eq!(chop_down(&[0.0, 5.0], 0.0), Some(1));
    }

    #[test]
    fn kind_names_round_trip() {
        for kind in SamplerKind::ALL {
            assert_eq!(kind.name().parse::<SamplerKind>().unwrap(), kind);
            assert_eq!(kind.to_string(), kind.name());
        }
        assert!(matches!(
            "walker".parse::<SamplerKind>(),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn every_kind_builds_and_reports_itself() {
        for kind in SamplerKind::ALL {
            let s = Sampler::new(kind, &[1.0, 2.0, 3.0]).unwrap();
            assert_eq!(s.kind(), kind);
            assert_eq!(s.len(), 3);
            assert!((s.weight_sum() - 6.0).abs() < 1e-12);
        }
    }

    #[test]
    fn every_kind_rejects_invalid_weights() {
        for kind in SamplerKind::ALL {
            assert!(Sampler::new(kind, &[1.0, -2.0]).is_err(), "{kind}");
            let mut s = Sampler::new(kind, &[1.0, 2.0]).unwrap();
            assert!(s.set_weight(0, f64::NAN).is_err(), "{kind}");
            assert!(s.set_weight(5, 1.0).is_err(), "{kind}");
            assert_eq!(s.weight(0), 1.0, "{kind}");
        }
    }

    #[test]
    fn scenario_equal_weights_follow_replayed_units() {
        for kind in SamplerKind::ALL {
            if kind == SamplerKind::BinnedRejection {
                continue;
            }
            let mut s = Sampler::new(kind, &[1.0, 1.0, 1.0, 1.0]).unwrap();
            let mut rng = ReplayRng::from_units(&[0.1, 0.35, 0.6, 0.9]);
            let draws: Vec<usize> = (0..4).map(|_| s.draw(&mut rng)).collect();
            assert_eq!(draws, vec![0, 1, 2, 3], "{kind}");
        }
    }

    #[test]
    fn single_positive_weight_always_wins() {
        let mut rng = StdRng::seed_from_u64(5);
        for kind in SamplerKind::ALL {
            let mut s = Sampler::new(kind, &[0.0, 0.0, 2.0, 0.0]).unwrap();
            for _ in 0..500 {
                assert_eq!(s.draw(&mut rng), 2, "{kind}");
            }
        }
    }

    #[test]
    fn all_zero_weights_fall_back_to_index_zero() {
        for kind in SamplerKind::ALL {
            let mut s = Sampler::new(kind, &[0.0; 10]).unwrap();
            let mut rng = ReplayRng::from_units(&[0.7]);
            for _ in 0..100 {
                assert_eq!(s.draw(&mut rng), 0, "{kind}");
            }
            assert_eq!(rng.consumed(), 0, "{kind}");
            assert!(!s.is_valid());
        }
    }

    #[test]
    fn updates_are_visible_through_accessors() {
        for kind in SamplerKind::ALL {
            let mut s = Sampler::new(kind, &[1.0, 2.0, 3.0, 4.0]).unwrap();
            s.set_weight(2, 0.5).unwrap();
            s.set_weight(0, 9.0).unwrap();
            assert_eq!(s.weight(2), 0.5, "{kind}");
            assert_eq!(s.weight(0), 9.0, "{kind}");
            assert!((s.weight_sum() - 15.5).abs() < 1e-9, "{kind}");
        }
    }

    #[test]
    fn initialize_replaces_weights() {
        for kind in SamplerKind::ALL {
            let mut s = Sampler::new(kind, &[1.0]).unwrap();
            s.initialize(&[0.0, 4.0, 0.0]).unwrap();
            assert_eq!(s.len(), 3, "{kind}");
            let mut rng = StdRng::seed_from_u64(1);
            assert_eq!(s.draw(&mut rng), 1, "{kind}");
        }
    }
}
