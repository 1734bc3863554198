//! Labelers map one attribute's current value to a label along one named
//! dimension. A partition's labelers, taken together, classify each member
//! into one bucket per realized label-tuple.

use std::fmt::{Display, Formatter};
use std::rc::Rc;

use crate::events::FilterSensitivity;
use crate::label_set::Label;
use crate::people::PersonId;

/// The identity of one axis of classification.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct DimensionId(pub &'static str);

impl Display for DimensionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub trait Labeler<C> {
    /// The dimension this labeler serves.
    fn dimension(&self) -> DimensionId;

    /// The person's current label on this dimension. Must be pure given the
    /// governing attribute's current value.
    fn get_label(&self, context: &C, person_id: PersonId) -> Label;

    /// The event types that can change this labeler's output for a person.
    fn labeler_sensitivities(&self) -> Vec<FilterSensitivity<C>>;
}

/// A labeler backed by a closure over the context.
pub struct FunctionalLabeler<C> {
    dimension: DimensionId,
    labeler: Rc<dyn Fn(&C, PersonId) -> Label>,
    sensitivities: Vec<FilterSensitivity<C>>,
}

impl<C> FunctionalLabeler<C> {
    pub fn new(dimension: DimensionId, labeler: impl Fn(&C, PersonId) -> Label + 'static) -> Self {
        Self {
            dimension,
            labeler: Rc::new(labeler),
            sensitivities: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_sensitivity(mut self, sensitivity: FilterSensitivity<C>) -> Self {
        self.sensitivities.push(sensitivity);
        self
    }
}

impl<C> Labeler<C> for FunctionalLabeler<C> {
    fn dimension(&self) -> DimensionId {
        self.dimension
    }

    fn get_label(&self, context: &C, person_id: PersonId) -> Label {
        (self.labeler)(context, person_id)
    }

    fn labeler_sensitivities(&self) -> Vec<FilterSensitivity<C>> {
        self.sensitivities.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{attribute_labeler, AttributeChangeEvent, TestPopulation};

    #[test]
    fn labels_follow_the_attribute() {
        let mut population = TestPopulation::new(42);
        let child = population.add_person(&[("age", 12)]);
        let adult = population.add_person(&[("age", 40)]);

        let age_group = attribute_labeler(DimensionId("age_group"), "age", |age| {
            Label::new(age >= 18)
        });
        assert_eq!(age_group.dimension(), DimensionId("age_group"));
        assert_eq!(age_group.get_label(&population, child), Label::new(false));
        assert_eq!(age_group.get_label(&population, adult), Label::new(true));

        population.set_attribute(child, "age", 18);
        assert_eq!(age_group.get_label(&population, child), Label::new(true));
    }

    #[test]
    fn declares_its_sensitivities() {
        let age_group =
            attribute_labeler(DimensionId("age_group"), "age", |age| Label::new(age / 10));
        let sensitivities = age_group.labeler_sensitivities();
        assert_eq!(sensitivities.len(), 1);
        assert_eq!(
            sensitivities[0].event_type(),
            std::any::TypeId::of::<AttributeChangeEvent>()
        );
    }
}
