//! Incremental population indexing and weighted sampling for
//! discrete-event simulations
//!
//! Agent-based models repeatedly ask the same two questions of their
//! population: "who currently satisfies this predicate, broken down by these
//! attributes?" and "pick me one such person at random". Answering either by
//! scanning every person on every query does not scale, so this crate
//! maintains the answers incrementally:
//! * A [`Partition`] declares a membership [`Filter`](filters::Filter) and a
//!   set of [`Labeler`](labeler::Labeler)s, one per classification dimension.
//! * A [`PopulationPartition`] is the live index built from that declaration.
//!   The host simulation forwards person additions, removals, and the
//!   attribute-change events the declaration is sensitive to, and the index
//!   stays consistent with fresh evaluation at all times.
//! * [`PartitionSampler`] and [`sample_group`] draw one person at random,
//!   optionally restricted by a [`LabelSet`], excluding a person, and
//!   weighted per bucket or group, consuming exactly one value from the
//!   caller's seeded random stream per draw.
//!
//! The crate owns no people, attributes, or clock of its own; it sees the
//! simulation through a caller-supplied context type implementing
//! [`SimContext`] (and [`GroupContext`] for group sampling).

pub mod context;
pub mod equality;
pub mod error;
pub mod events;
pub mod filters;
pub mod groups;
pub mod hashing;
pub mod label_set;
pub mod labeler;
pub mod partitions;
pub mod people;
pub mod sampling;
pub mod tuplator;

#[cfg(test)]
pub(crate) mod testing;

pub use context::{RngStreamId, SimContext};
pub use equality::Equality;
pub use error::SimdexError;
pub use events::FilterSensitivity;
pub use filters::{
    AndFilter, Filter, FilterExt, MatchAllFilter, MatchNoneFilter, NotFilter, OrFilter,
    PropertyFilter,
};
pub use groups::{sample_group, GroupContext, GroupId, GroupSampler};
pub use hashing::{hash_str, one_shot_128, HashMap, HashSet};
pub use label_set::{Label, LabelSet};
pub use labeler::{DimensionId, FunctionalLabeler, Labeler};
pub use partitions::{
    Partition, PartitionBuilder, PartitionSampler, PopulationPartition,
};
pub use people::PersonId;
pub use sampling::{sample_weighted, WeightedCandidates};
pub use tuplator::{Tuplator, TuplatorBuilder};

// Re-exported so callers can construct generators compatible with
// `SimContext::with_rng` without pinning their own rand version.
pub use rand;
