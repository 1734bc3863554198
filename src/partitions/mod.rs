//! Incrementally-maintained population indexes.
//!
//! A [`Partition`] is the declaration: an optional membership filter, zero or
//! more labelers (one per dimension), and a storage policy. A
//! [`PopulationPartition`] is the live index built from a declaration over the
//! current population, kept current by forwarding person additions, removals,
//! and the events the declaration is sensitive to.
//!
//! A declaration with no labelers gets the degenerate implementation (one
//! maintained set); any labelers at all get the general bucketed one. The
//! facade hides which is active.

use std::any::{Any, TypeId};
use std::rc::Rc;

use log::trace;

use crate::error::SimdexError;
use crate::filters::Filter;
use crate::hashing::{HashMap, HashSet};
use crate::label_set::LabelSet;
use crate::labeler::{DimensionId, Labeler};
use crate::people::PersonId;

mod degenerate;
mod general;
pub mod sampler;

use degenerate::DegeneratePartition;
use general::GeneralPartition;
pub use sampler::PartitionSampler;

use crate::context::SimContext;

/// The declarative description of a partition.
pub struct Partition<C> {
    pub(crate) filter: Option<Rc<dyn Filter<C>>>,
    pub(crate) labelers: Vec<Rc<dyn Labeler<C>>>,
    pub(crate) retain_person_keys: bool,
}

impl<C> Partition<C> {
    #[must_use]
    pub fn builder() -> PartitionBuilder<C> {
        PartitionBuilder::default()
    }

    /// No labelers: the index is a single set rather than a bucket map.
    pub(crate) fn is_degenerate(&self) -> bool {
        self.labelers.is_empty()
    }
}

pub struct PartitionBuilder<C> {
    filter: Option<Rc<dyn Filter<C>>>,
    labelers: Vec<Rc<dyn Labeler<C>>>,
    retain_person_keys: bool,
}

impl<C> Default for PartitionBuilder<C> {
    fn default() -> Self {
        Self {
            filter: None,
            labelers: Vec::new(),
            retain_person_keys: true,
        }
    }
}

impl<C> PartitionBuilder<C> {
    #[must_use]
    pub fn set_filter(mut self, filter: impl Filter<C> + 'static) -> Self {
        self.filter = Some(Rc::new(filter));
        self
    }

    #[must_use]
    pub fn add_labeler(mut self, labeler: impl Labeler<C> + 'static) -> Self {
        self.labelers.push(Rc::new(labeler));
        self
    }

    /// Whether buckets keep explicit member sets (the default) or only counts.
    /// Count-only buckets use less memory but answer person-enumeration
    /// queries by scanning, and cannot be declared together with per-person
    /// retrieval-heavy workloads cheaply.
    #[must_use]
    pub fn set_retain_person_keys(mut self, retain_person_keys: bool) -> Self {
        self.retain_person_keys = retain_person_keys;
        self
    }

    /// Finalizes the declaration. Two labelers on the same dimension are a
    /// misuse fault.
    pub fn build(self) -> Result<Partition<C>, SimdexError> {
        let mut seen: HashSet<DimensionId> = HashSet::default();
        for labeler in &self.labelers {
            if !seen.insert(labeler.dimension()) {
                return Err(SimdexError::PartitionMisuse(format!(
                    "duplicate labeler for dimension {}",
                    labeler.dimension()
                )));
            }
        }
        Ok(Partition {
            filter: self.filter,
            labelers: self.labelers,
            retain_person_keys: self.retain_person_keys,
        })
    }
}

enum Inner<C> {
    Degenerate(DegeneratePartition<C>),
    General(GeneralPartition<C>),
}

/// A live partition over the population.
pub struct PopulationPartition<C> {
    inner: Inner<C>,
}

impl<C: SimContext> PopulationPartition<C> {
    /// Builds the index and bulk-loads every current person through the same
    /// path later additions take.
    pub fn new(context: &C, partition: Partition<C>) -> Result<Self, SimdexError> {
        let degenerate = partition.is_degenerate();
        let mut inner = if degenerate {
            Inner::Degenerate(DegeneratePartition::new(partition)?)
        } else {
            Inner::General(GeneralPartition::new(partition)?)
        };
        let people = context.people();
        trace!(
            "activating {} partition over {} people",
            if degenerate { "degenerate" } else { "general" },
            people.len()
        );
        for person_id in people {
            match &mut inner {
                Inner::Degenerate(partition) => {
                    partition.handle_person_addition(context, person_id);
                }
                Inner::General(partition) => {
                    partition.handle_person_addition(context, person_id);
                }
            }
        }
        Ok(Self { inner })
    }

    pub fn handle_person_addition(&mut self, context: &C, person_id: PersonId) {
        match &mut self.inner {
            Inner::Degenerate(partition) => partition.handle_person_addition(context, person_id),
            Inner::General(partition) => partition.handle_person_addition(context, person_id),
        }
    }

    pub fn handle_person_removal(&mut self, person_id: PersonId) {
        match &mut self.inner {
            Inner::Degenerate(partition) => partition.handle_person_removal(person_id),
            Inner::General(partition) => partition.handle_person_removal(person_id),
        }
    }

    /// Forwards an event the caller's event loop routed here. Events whose
    /// type no declared sensitivity names are ignored.
    pub fn handle_event(&mut self, context: &C, event: &dyn Any) {
        match &mut self.inner {
            Inner::Degenerate(partition) => partition.handle_event(context, event),
            Inner::General(partition) => partition.handle_event(context, event),
        }
    }

    /// The event types worth routing to [`Self::handle_event`].
    pub fn sensitive_event_types(&self) -> Vec<TypeId> {
        match &self.inner {
            Inner::Degenerate(partition) => partition.sensitive_event_types(),
            Inner::General(partition) => partition.sensitive_event_types(),
        }
    }

    pub fn contains(&self, person_id: PersonId) -> bool {
        match &self.inner {
            Inner::Degenerate(partition) => partition.contains(person_id),
            Inner::General(partition) => partition.contains(person_id),
        }
    }

    pub fn contains_with(
        &self,
        person_id: PersonId,
        label_set: &LabelSet,
    ) -> Result<bool, SimdexError> {
        match &self.inner {
            Inner::Degenerate(partition) => partition.contains_with(person_id, label_set),
            Inner::General(partition) => partition.contains_with(person_id, label_set),
        }
    }

    pub fn get_people_count(&self) -> usize {
        match &self.inner {
            Inner::Degenerate(partition) => partition.get_people_count(),
            Inner::General(partition) => partition.get_people_count(),
        }
    }

    pub fn get_people(&self) -> Vec<PersonId> {
        match &self.inner {
            Inner::Degenerate(partition) => partition.get_people(),
            Inner::General(partition) => partition.get_people(),
        }
    }

    pub fn get_people_count_for(&self, label_set: &LabelSet) -> Result<usize, SimdexError> {
        match &self.inner {
            Inner::Degenerate(partition) => partition.get_people_count_for(label_set),
            Inner::General(partition) => partition.get_people_count_for(label_set),
        }
    }

    pub fn get_people_for(&self, label_set: &LabelSet) -> Result<Vec<PersonId>, SimdexError> {
        match &self.inner {
            Inner::Degenerate(partition) => partition.get_people_for(label_set),
            Inner::General(partition) => partition.get_people_for(label_set),
        }
    }

    pub fn get_people_count_map(
        &self,
        label_set: &LabelSet,
    ) -> Result<HashMap<LabelSet, usize>, SimdexError> {
        match &self.inner {
            Inner::Degenerate(partition) => partition.get_people_count_map(label_set),
            Inner::General(partition) => partition.get_people_count_map(label_set),
        }
    }

    /// Checks a query label set against the declared dimensions without
    /// running the query.
    pub fn validate_label_set(&self, label_set: &LabelSet) -> Result<(), SimdexError> {
        match &self.inner {
            Inner::Degenerate(partition) => partition.validate_label_set(label_set),
            Inner::General(partition) => partition.validate_label_set(label_set),
        }
    }

}
