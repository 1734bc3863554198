//! Weighted random selection of one member of a group.
//!
//! Groups are collective entities (households, schools, workplaces) owned by
//! the host simulation; this crate only needs their member lists, obtained
//! through [`GroupContext`]. Selection runs the same single-draw algorithm as
//! partition sampling, with the whole group as one weighted candidate
//! collection.

use std::fmt::{Debug, Display, Formatter};
use std::rc::Rc;

use crate::context::{RngStreamId, SimContext};
use crate::error::SimdexError;
use crate::people::PersonId;
use crate::sampling::{check_weight, sample_weighted, WeightedCandidates};

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(pub usize);

impl Display for GroupId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Debug for GroupId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Group {}", self.0)
    }
}

/// Access to group membership, on top of the base simulation services.
/// `None` means the group id is unknown, which sampling reports as a fault.
pub trait GroupContext: SimContext {
    fn group_members(&self, group_id: GroupId) -> Option<Vec<PersonId>>;
}

/// Parameters for one group-sampling request. All optional; the default
/// request draws uniformly from the whole group using the caller's unnamed
/// random stream.
pub struct GroupSampler<C> {
    excluded_person: Option<PersonId>,
    weighting: Option<Rc<dyn Fn(&C, GroupId) -> f64>>,
    rng_stream: Option<RngStreamId>,
}

impl<C> Default for GroupSampler<C> {
    fn default() -> Self {
        Self {
            excluded_person: None,
            weighting: None,
            rng_stream: None,
        }
    }
}

impl<C> GroupSampler<C> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes one person from candidacy. The person must exist in the
    /// population, whether or not they belong to the group.
    #[must_use]
    pub fn set_excluded_person(mut self, person_id: PersonId) -> Self {
        self.excluded_person = Some(person_id);
        self
    }

    /// Weights every member of the group uniformly by the group-level weight.
    /// Weights must be finite and non-negative; zero makes the draw come up
    /// empty.
    #[must_use]
    pub fn set_weighting(mut self, weighting: impl Fn(&C, GroupId) -> f64 + 'static) -> Self {
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

/// Draws one member of `group_id` according to the sampler's parameters.
/// `Ok(None)` means no eligible candidate existed (an empty group, a zero
/// weight, or the exclusion removing the only member), which is a normal
/// outcome rather than a fault.
pub fn sample_group<C: GroupContext>(
    context: &C,
    group_id: GroupId,
    sampler: &GroupSampler<C>,
) -> Result<Option<PersonId>, SimdexError> {
    let members = context
        .group_members(group_id)
        .ok_or(SimdexError::UnknownGroup(group_id))?;
    if let Some(excluded) = sampler.excluded_person {
        if !context.contains_person(excluded) {
            return Err(SimdexError::UnknownPerson(excluded));
        }
    }

    let weight = match &sampler.weighting {
        Some(weighting) => check_weight(weighting(context, group_id))?,
        None => 1.0,
    };
    let sources = [(weight, WeightedCandidates::List(members))];
    context.with_rng(sampler.rng_stream, |rng| {
        sample_weighted(rng, &sources, sampler.excluded_person)
    })
}
