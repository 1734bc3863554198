//! Weighted random selection of one partition member.
//!
//! A [`PartitionSampler`] gathers the optional request parameters (a label-set
//! restriction, an excluded person, a per-bucket weighting function, a named
//! random stream) and [`PopulationPartition::sample_partition`] runs the
//! shared single-draw algorithm over the matching buckets.

use std::rc::Rc;

use crate::context::{RngStreamId, SimContext};
use crate::error::SimdexError;
use crate::label_set::LabelSet;
use crate::partitions::{Inner, PopulationPartition};
use crate::people::PersonId;
use crate::sampling::{check_weight, sample_weighted, WeightedCandidates};

/// Parameters for one sampling request. All of them are optional; the default
/// request draws uniformly from the whole partition using the caller's
/// unnamed random stream.
pub struct PartitionSampler<C> {
    label_set: Option<LabelSet>,
    excluded_person: Option<PersonId>,
    weighting: Option<Rc<dyn Fn(&C, &LabelSet) -> f64>>,
    rng_stream: Option<RngStreamId>,
}

impl<C> Default for PartitionSampler<C> {
    fn default() -> Self {
        Self {
            label_set: None,
            excluded_person: None,
            weighting: None,
            rng_stream: None,
        }
    }
}

impl<C> PartitionSampler<C> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts candidates to the buckets matching `label_set`.
    #[must_use]
    pub fn set_label_set(mut self, label_set: LabelSet) -> Self {
        self.label_set = Some(label_set);
        self
    }

    /// Removes one person from candidacy. The person must exist in the
    /// population, whether or not they are a partition member.
    #[must_use]
    pub fn set_excluded_person(mut self, person_id: PersonId) -> Self {
        self.excluded_person = Some(person_id);
        self
    }

    /// Weights each candidate by their bucket's realized label set. Weights
    /// must be finite and non-negative; zero removes the bucket from
    /// candidacy.
    #[must_use]
    pub fn set_weighting(mut self, weighting: impl Fn(&C, &LabelSet) -> f64 + 'static) -> Self {
        self.weighting = Some(Rc::new(weighting));
        self
    }

    /// Draws from the named stream instead of the default one.
    #[must_use]
    pub fn set_rng_stream(mut self, rng_stream: RngStreamId) -> Self {
        self.rng_stream = Some(rng_stream);
        self
    }
}

impl<C: SimContext> PopulationPartition<C> {
    /// Draws one member according to the sampler's parameters. `Ok(None)`
    /// means no eligible candidate existed, which is a normal outcome of a
    /// narrow restriction or exclusion, not a fault.
    pub fn sample_partition(
        &self,
        context: &C,
        sampler: &PartitionSampler<C>,
    ) -> Result<Option<PersonId>, SimdexError> {
        if let Some(excluded) = sampler.excluded_person {
            if !context.contains_person(excluded) {
                return Err(SimdexError::UnknownPerson(excluded));
            }
        }

        let weighting = sampler.weighting.as_deref();
        let sources = match &self.inner {
            Inner::Degenerate(partition) => {
                if let Some(label_set) = &sampler.label_set {
                    partition.validate_label_set(label_set)?;
                }
                let weight = match weighting {
                    Some(weighting) => check_weight(weighting(context, &LabelSet::new()))?,
                    None => 1.0,
                };
                vec![(weight, WeightedCandidates::Set(partition.members()))]
            }
            Inner::General(partition) => {
                partition.collect_sources(context, sampler.label_set.as_ref(), weighting)?
            }
        };

        context.with_rng(sampler.rng_stream, |rng| {
            sample_weighted(rng, &sources, sampler.excluded_person)
        })
    }
}
