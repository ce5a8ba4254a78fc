#![forbid(unsafe_code)]
//! event_sampler: dynamic weighted discrete-event sampling for stochastic simulation.
//!
//! Modules:
//! - uniform: helpers over [rand::Rng] and a replaying test source
//! - weights: validated weight storage with a cached sum, plus the permutation/rank pair
//! - sampler: interchangeable strategies for drawing an index proportional to its weight
//! - monitor: repair/rebuild scheduling for the binned rejection sampler
//! - queue: indexed priority queues for next-reaction scheduling
//!
//! A simulation loop borrows one RNG, asks a sampler for an event index, and updates the
//! weights that changed through the same sampler:
//!
//! ```
//! use event_sampler::prelude::*;
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! let mut rng = StdRng::seed_from_u64(7);
//! let mut sampler = Sampler::new(SamplerKind::BinnedRejection, &[1.0, 3.0, 0.5])?;
//! let event = sampler.draw(&mut rng);
//! assert!(event < 3);
//! sampler.set_weight(event, 0.0)?;
//! assert_eq!(sampler.weight(event), 0.0);
//! # Ok::<(), event_sampler::error::Error>(())
//! ```
pub mod error;
pub mod monitor;
pub mod permutation;
pub mod queue;
pub mod sampler;
pub mod uniform;
pub mod weights;

/// Convenient re-exports for common types. Import with `use event_sampler::prelude::*;`.
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::monitor::{EfficiencyMonitor, Maintenance, MaintenanceConfig};
    pub use crate::permutation::{RankedPermutation, SortedWeights};
    pub use crate::queue::{
        HashingConfig, HashingQueue, IndexedPriorityQueue, PlaceboQueue, SENTINEL,
    };
    pub use crate::sampler::{
        BinarySearchCdf, BinnedDiagnostics, BinnedRejection, DiscreteSampler, LinearSearch,
        PartialPmfSums, PartialRecursiveCdf, Sampler, SamplerKind, SortedLinearSearch,
    };
    pub use crate::uniform::{discrete_u32, unit_f64, ReplayRng};
    pub use crate::weights::WeightVector;
}
