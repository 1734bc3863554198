//! Composable boolean predicates over a single person.
//!
//! A filter's verdict is a pure function of current external state, read
//! through the context type `C`. Each filter declares which event types can
//! invalidate its verdict for which person (its sensitivities), which is what
//! lets a partition recheck membership incrementally instead of re-scanning
//! the population.

use std::cmp::Ordering;
use std::rc::Rc;

use crate::equality::Equality;
use crate::events::FilterSensitivity;
use crate::people::PersonId;

pub trait Filter<C> {
    /// Whether `person_id` currently satisfies the predicate. Must be pure and
    /// must not fault for any person that exists in the population.
    fn evaluate(&self, context: &C, person_id: PersonId) -> bool;

    /// The deduplicated set of event sensitivities for the whole predicate
    /// tree, keyed by event type.
    fn filter_sensitivities(&self) -> Vec<FilterSensitivity<C>>;
}

/// Combinators available on every sized filter. Consuming the operands keeps
/// composite filters immutable once built.
pub trait FilterExt<C>: Filter<C> + Sized + 'static {
    fn and(self, other: impl Filter<C> + 'static) -> AndFilter<C> {
        AndFilter {
            left: Box::new(self),
            right: Box::new(other),
        }
    }

    fn or(self, other: impl Filter<C> + 'static) -> OrFilter<C> {
        OrFilter {
            left: Box::new(self),
            right: Box::new(other),
        }
    }

    fn negate(self) -> NotFilter<C> {
        NotFilter {
            inner: Box::new(self),
        }
    }
}

impl<C, F: Filter<C> + Sized + 'static> FilterExt<C> for F {}

/// Merges sensitivity lists, deduplicating shared entries by identity. Two
/// leaves watching different attributes through the same event type both
/// survive the merge.
fn merged_sensitivities<C>(
    left: Vec<FilterSensitivity<C>>,
    right: Vec<FilterSensitivity<C>>,
) -> Vec<FilterSensitivity<C>> {
    let mut merged = left;
    for sensitivity in right {
        if !merged.iter().any(|existing| existing.same_as(&sensitivity)) {
            merged.push(sensitivity);
        }
    }
    merged
}

/// Matches every person. Ignores state, so no event can change its verdict.
#[derive(Copy, Clone, Debug)]
pub struct MatchAllFilter;

impl<C> Filter<C> for MatchAllFilter {
    fn evaluate(&self, _context: &C, _person_id: PersonId) -> bool {
        true
    }

    fn filter_sensitivities(&self) -> Vec<FilterSensitivity<C>> {
        Vec::new()
    }
}

/// Matches no person. Ignores state, so no event can change its verdict.
#[derive(Copy, Clone, Debug)]
pub struct MatchNoneFilter;

impl<C> Filter<C> for MatchNoneFilter {
    fn evaluate(&self, _context: &C, _person_id: PersonId) -> bool {
        false
    }

    fn filter_sensitivities(&self) -> Vec<FilterSensitivity<C>> {
        Vec::new()
    }
}

pub struct AndFilter<C> {
    left: Box<dyn Filter<C>>,
    right: Box<dyn Filter<C>>,
}

impl<C> Filter<C> for AndFilter<C> {
    fn evaluate(&self, context: &C, person_id: PersonId) -> bool {
        self.left.evaluate(context, person_id) && self.right.evaluate(context, person_id)
    }

    fn filter_sensitivities(&self) -> Vec<FilterSensitivity<C>> {
        merged_sensitivities(
            self.left.filter_sensitivities(),
            self.right.filter_sensitivities(),
        )
    }
}

pub struct OrFilter<C> {
    left: Box<dyn Filter<C>>,
    right: Box<dyn Filter<C>>,
}

impl<C> Filter<C> for OrFilter<C> {
    fn evaluate(&self, context: &C, person_id: PersonId) -> bool {
        self.left.evaluate(context, person_id) || self.right.evaluate(context, person_id)
    }

    fn filter_sensitivities(&self) -> Vec<FilterSensitivity<C>> {
        merged_sensitivities(
            self.left.filter_sensitivities(),
            self.right.filter_sensitivities(),
        )
    }
}

/// Negation flips the verdict; it neither adds nor removes sensitivities.
pub struct NotFilter<C> {
    inner: Box<dyn Filter<C>>,
}

impl<C> Filter<C> for NotFilter<C> {
    fn evaluate(&self, context: &C, person_id: PersonId) -> bool {
        !self.inner.evaluate(context, person_id)
    }

    fn filter_sensitivities(&self) -> Vec<FilterSensitivity<C>> {
        self.inner.filter_sensitivities()
    }
}

/// A leaf filter: compares one attribute's current value against a fixed
/// comparison value under an [`Equality`] operator.
pub struct PropertyFilter<C, V: Ord + 'static> {
    #[allow(dead_code)]
    name: &'static str,
    accessor: Rc<dyn Fn(&C, PersonId) -> V>,
    equality: Equality,
    value: V,
    sensitivities: Vec<FilterSensitivity<C>>,
}

impl<C, V: Ord + 'static> PropertyFilter<C, V> {
    pub fn new(
        name: &'static str,
        accessor: impl Fn(&C, PersonId) -> V + 'static,
        equality: Equality,
        value: V,
    ) -> Self {
        Self {
            name,
            accessor: Rc::new(accessor),
            equality,
            value,
            sensitivities: Vec::new(),
        }
    }

    /// Declares an event type whose instances can change this filter's verdict.
    #[must_use]
    pub fn with_sensitivity(mut self, sensitivity: FilterSensitivity<C>) -> Self {
        self.sensitivities.push(sensitivity);
        self
    }
}

impl<C, V: Ord + 'static> Filter<C> for PropertyFilter<C, V> {
    fn evaluate(&self, context: &C, person_id: PersonId) -> bool {
        let current: V = (self.accessor)(context, person_id);
        let ordering: Ordering = current.cmp(&self.value);
        self.equality.is_compatible(ordering)
    }

    fn filter_sensitivities(&self) -> Vec<FilterSensitivity<C>> {
        self.sensitivities.clone()
    }
}
