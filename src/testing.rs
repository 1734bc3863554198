//! A reference context used by unit tests across the crate: an in-memory
//! population with integer attributes, an attribute-change event, seeded
//! named random streams, and a static group store.

use std::cell::RefCell;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::context::{RngStreamId, SimContext};
use crate::equality::Equality;
use crate::error::SimdexError;
use crate::events::FilterSensitivity;
use crate::filters::PropertyFilter;
use crate::groups::{GroupContext, GroupId};
use crate::hashing::{hash_str, HashMap};
use crate::label_set::Label;
use crate::labeler::{DimensionId, FunctionalLabeler};
use crate::people::PersonId;

/// Emitted by the test harness when a person attribute is set.
pub struct AttributeChangeEvent {
    pub person_id: PersonId,
    pub attribute: &'static str,
}

pub struct TestPopulation {
    base_seed: u64,
    next_id: usize,
    people: HashMap<PersonId, HashMap<&'static str, i64>>,
    groups: HashMap<GroupId, Vec<PersonId>>,
    default_rng: RefCell<StdRng>,
    named_rngs: HashMap<RngStreamId, RefCell<StdRng>>,
}

impl TestPopulation {
    pub fn new(base_seed: u64) -> Self {
        Self {
            base_seed,
            next_id: 0,
            people: HashMap::default(),
            groups: HashMap::default(),
            default_rng: RefCell::new(StdRng::seed_from_u64(base_seed)),
            named_rngs: HashMap::default(),
        }
    }

    /// Registers a named stream, seeded from the base seed offset by the hash
    /// of the stream name so streams are independent but reproducible.
    pub fn register_stream(&mut self, stream: RngStreamId) {
        let seed = self.base_seed.wrapping_add(hash_str(stream.0));
        self.named_rngs
            .insert(stream, RefCell::new(StdRng::seed_from_u64(seed)));
    }

    pub fn add_person(&mut self, attributes: &[(&'static str, i64)]) -> PersonId {
        let person_id = PersonId(self.next_id);
        self.next_id += 1;
        self.people
            .insert(person_id, attributes.iter().copied().collect());
        person_id
    }

    pub fn remove_person(&mut self, person_id: PersonId) {
        self.people.remove(&person_id);
        for members in self.groups.values_mut() {
            members.retain(|member| *member != person_id);
        }
    }

    /// Sets an attribute and returns the notification the engine would route
    /// to sensitive partitions.
    pub fn set_attribute(
        &mut self,
        person_id: PersonId,
        attribute: &'static str,
        value: i64,
    ) -> AttributeChangeEvent {
        self.people
            .get_mut(&person_id)
            .unwrap()
            .insert(attribute, value);
        AttributeChangeEvent {
            person_id,
            attribute,
        }
    }

    pub fn attribute(&self, person_id: PersonId, attribute: &'static str) -> i64 {
        *self.people[&person_id].get(attribute).unwrap()
    }

    pub fn set_group(&mut self, group_id: GroupId, members: Vec<PersonId>) {
        self.groups.insert(group_id, members);
    }
}

impl SimContext for TestPopulation {
    fn contains_person(&self, person_id: PersonId) -> bool {
        self.people.contains_key(&person_id)
    }

    fn people(&self) -> Vec<PersonId> {
        let mut people: Vec<PersonId> = self.people.keys().copied().collect();
        people.sort();
        people
    }

    fn with_rng<T>(
        &self,
        stream: Option<RngStreamId>,
        sample: impl FnOnce(&mut dyn RngCore) -> T,
    ) -> Result<T, SimdexError> {
        let rng = match stream {
            None => &self.default_rng,
            Some(stream) => self
                .named_rngs
                .get(&stream)
                .ok_or(SimdexError::UnknownRngStream(stream.0))?,
        };
        Ok(sample(&mut *rng.borrow_mut()))
    }
}

impl GroupContext for TestPopulation {
    fn group_members(&self, group_id: GroupId) -> Option<Vec<PersonId>> {
        self.groups.get(&group_id).cloned()
    }
}

/// A filter over one integer attribute, sensitive to [`AttributeChangeEvent`]s
/// for that attribute.
pub fn attribute_filter(
    attribute: &'static str,
    equality: Equality,
    value: i64,
) -> PropertyFilter<TestPopulation, i64> {
    PropertyFilter::new(
        attribute,
        move |context: &TestPopulation, person_id| context.attribute(person_id, attribute),
        equality,
        value,
    )
    .with_sensitivity(FilterSensitivity::new(
        move |_context, event: &AttributeChangeEvent| {
            (event.attribute == attribute).then_some(event.person_id)
        },
    ))
}

/// A labeler over one integer attribute, sensitive to [`AttributeChangeEvent`]s
/// for that attribute.
pub fn attribute_labeler(
    dimension: DimensionId,
    attribute: &'static str,
    label_fn: impl Fn(i64) -> Label + 'static,
) -> FunctionalLabeler<TestPopulation> {
    FunctionalLabeler::new(dimension, move |context: &TestPopulation, person_id| {
        label_fn(context.attribute(person_id, attribute))
    })
    .with_sensitivity(FilterSensitivity::new(
        move |_context, event: &AttributeChangeEvent| {
            (event.attribute == attribute).then_some(event.person_id)
        },
    ))
}
