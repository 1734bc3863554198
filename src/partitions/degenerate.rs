//! The degenerate partition implementation: a filter but no labelers, so the
//! whole index collapses to one maintained set of matching people.

use std::any::{Any, TypeId};
use std::rc::Rc;

use crate::error::SimdexError;
use crate::events::FilterSensitivity;
use crate::filters::Filter;
use crate::hashing::{HashMap, HashSet};
use crate::label_set::LabelSet;
use crate::people::PersonId;
use crate::partitions::Partition;

pub(crate) struct DegeneratePartition<C> {
    filter: Option<Rc<dyn Filter<C>>>,
    sensitivities: HashMap<TypeId, Vec<FilterSensitivity<C>>>,
    members: HashSet<PersonId>,
}

impl<C> DegeneratePartition<C> {
    pub(crate) fn new(partition: Partition<C>) -> Result<Self, SimdexError> {
        if !partition.is_degenerate() {
            return Err(SimdexError::PartitionMisuse(
                "degenerate partition implementation given a declaration with labelers".to_string(),
            ));
        }
        let mut sensitivities: HashMap<TypeId, Vec<FilterSensitivity<C>>> = HashMap::default();
        if let Some(filter) = &partition.filter {
            for sensitivity in filter.filter_sensitivities() {
                sensitivities
                    .entry(sensitivity.event_type())
                    .or_default()
                    .push(sensitivity);
            }
        }
        Ok(Self {
            filter: partition.filter,
            sensitivities,
            members: HashSet::default(),
        })
    }

    fn passes(&self, context: &C, person_id: PersonId) -> bool {
        self.filter
            .as_ref()
            .is_none_or(|filter| filter.evaluate(context, person_id))
    }

    /// Evaluates the filter once and inserts iff it passes. A failing filter is
    /// a no-op, not a fault.
    pub(crate) fn handle_person_addition(&mut self, context: &C, person_id: PersonId) {
        if self.passes(context, person_id) {
            self.members.insert(person_id);
        }
    }

    /// Unconditionally discards the person.
    pub(crate) fn handle_person_removal(&mut self, person_id: PersonId) {
        self.members.remove(&person_id);
    }

    /// Re-evaluates the filter for each person a sensitivity derives from the
    /// event, and inserts or removes to match.
    pub(crate) fn handle_event(&mut self, context: &C, event: &dyn Any) {
        let affected: Vec<PersonId> = match self.sensitivities.get(&Any::type_id(event)) {
            Some(list) => list
                .iter()
                .filter_map(|sensitivity| sensitivity.affected_person(context, event))
                .collect(),
            None => return,
        };
        for person_id in affected {
            if self.passes(context, person_id) {
                self.members.insert(person_id);
            } else {
                self.members.remove(&person_id);
            }
        }
    }

    pub(crate) fn sensitive_event_types(&self) -> Vec<TypeId> {
        self.sensitivities.keys().copied().collect()
    }

    pub(crate) fn contains(&self, person_id: PersonId) -> bool {
        self.members.contains(&person_id)
    }

    pub(crate) fn contains_with(
        &self,
        person_id: PersonId,
        label_set: &LabelSet,
    ) -> Result<bool, SimdexError> {
        self.validate_label_set(label_set)?;
        Ok(self.contains(person_id))
    }

    pub(crate) fn get_people_count(&self) -> usize {
        self.members.len()
    }

    pub(crate) fn get_people(&self) -> Vec<PersonId> {
        self.members.iter().copied().collect()
    }

    pub(crate) fn get_people_count_for(&self, label_set: &LabelSet) -> Result<usize, SimdexError> {
        self.validate_label_set(label_set)?;
        Ok(self.get_people_count())
    }

    pub(crate) fn get_people_for(
        &self,
        label_set: &LabelSet,
    ) -> Result<Vec<PersonId>, SimdexError> {
        self.validate_label_set(label_set)?;
        Ok(self.get_people())
    }

    pub(crate) fn get_people_count_map(
        &self,
        label_set: &LabelSet,
    ) -> Result<HashMap<LabelSet, usize>, SimdexError> {
        self.validate_label_set(label_set)?;
        let mut counts = HashMap::default();
        counts.insert(LabelSet::new(), self.get_people_count());
        Ok(counts)
    }

    /// A degenerate partition declares no dimensions, so only the empty label
    /// set is a valid query.
    pub(crate) fn validate_label_set(&self, label_set: &LabelSet) -> Result<(), SimdexError> {
        if label_set.is_empty() {
            Ok(())
        } else {
            Err(SimdexError::InvalidLabelSet(
                "non-empty label set queried against a degenerate partition".to_string(),
            ))
        }
    }

    pub(crate) fn members(&self) -> &HashSet<PersonId> {
        &self.members
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equality::Equality;
    use crate::label_set::Label;
    use crate::labeler::DimensionId;
    use crate::testing::{attribute_filter, attribute_labeler, TestPopulation};

    fn adult_partition() -> Partition<TestPopulation> {
        Partition::builder()
            .set_filter(attribute_filter("age", Equality::GreaterThanEqual, 18))
            .build()
            .unwrap()
    }

    #[test]
    fn addition_respects_the_filter() {
        let mut population = TestPopulation::new(42);
        let child = population.add_person(&[("age", 10)]);
        let adult = population.add_person(&[("age", 40)]);

        let mut partition = DegeneratePartition::new(adult_partition()).unwrap();
        partition.handle_person_addition(&population, child);
        partition.handle_person_addition(&population, adult);

        assert!(!partition.contains(child));
        assert!(partition.contains(adult));
        assert_eq!(partition.get_people_count(), 1);
        assert_eq!(partition.get_people(), vec![adult]);
    }

    #[test]
    fn removal_is_unconditional() {
        let mut population = TestPopulation::new(42);
        let adult = population.add_person(&[("age", 40)]);

        let mut partition = DegeneratePartition::new(adult_partition()).unwrap();
        partition.handle_person_addition(&population, adult);
        partition.handle_person_removal(adult);
        // Removing someone who was never a member is a no-op.
        partition.handle_person_removal(PersonId(99));

        assert_eq!(partition.get_people_count(), 0);
    }

    #[test]
    fn events_track_fresh_evaluation() {
        let mut population = TestPopulation::new(42);
        let person = population.add_person(&[("age", 10)]);

        let mut partition = DegeneratePartition::new(adult_partition()).unwrap();
        partition.handle_person_addition(&population, person);
        assert!(!partition.contains(person));

        let event = population.set_attribute(person, "age", 21);
        partition.handle_event(&population, &event);
        assert!(partition.contains(person));

        let event = population.set_attribute(person, "age", 15);
        partition.handle_event(&population, &event);
        assert!(!partition.contains(person));
    }

    #[test]
    fn irrelevant_events_are_ignored() {
        let mut population = TestPopulation::new(42);
        let person = population.add_person(&[("age", 40), ("height", 170)]);

        let mut partition = DegeneratePartition::new(adult_partition()).unwrap();
        partition.handle_person_addition(&population, person);

        struct OtherEvent;
        partition.handle_event(&population, &OtherEvent);
        assert!(partition.contains(person));
    }

    #[test]
    fn non_empty_label_set_faults() {
        let partition = DegeneratePartition::new(adult_partition()).unwrap();
        let query = LabelSet::new().with_label(DimensionId("age_group"), Label::new(true));
        assert!(matches!(
            partition.get_people_count_for(&query),
            Err(SimdexError::InvalidLabelSet(_))
        ));
        assert!(matches!(
            partition.get_people_for(&query),
            Err(SimdexError::InvalidLabelSet(_))
        ));
        assert!(partition.get_people_count_for(&LabelSet::new()).is_ok());
    }

    #[test]
    fn rejects_declarations_with_labelers() {
        let labeled = Partition::<TestPopulation>::builder()
            .add_labeler(attribute_labeler(DimensionId("age_group"), "age", |age| {
                Label::new(age >= 18)
            }))
            .build()
            .unwrap();
        assert!(matches!(
            DegeneratePartition::new(labeled),
            Err(SimdexError::PartitionMisuse(_))
        ));
    }

    #[test]
    fn count_map_is_the_single_empty_bucket() {
        let mut population = TestPopulation::new(42);
        let adult = population.add_person(&[("age", 40)]);
        let mut partition = DegeneratePartition::new(adult_partition()).unwrap();
        partition.handle_person_addition(&population, adult);

        let counts = partition.get_people_count_map(&LabelSet::new()).unwrap();
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[&LabelSet::new()], 1);
    }
}
