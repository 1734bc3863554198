//! Event sensitivity declarations.
//!
//! The discrete-event engine delivers attribute-change notifications as typed
//! values; a partition receives them type-erased (`&dyn Any`) and consults the
//! sensitivities declared by its filter and labelers to decide whose membership
//! or labels might have changed. The engine is expected to route only events
//! whose type appears in [`crate::PopulationPartition::sensitive_event_types`].

use std::any::{Any, TypeId};
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

use crate::people::PersonId;

type Extractor<C> = dyn Fn(&C, &dyn Any) -> Option<PersonId>;

/// Declares that one event type can invalidate a filter's (or labeler's)
/// verdict, together with how to derive the affected person from an event
/// instance. `None` from the extractor means "re-evaluate nothing".
pub struct FilterSensitivity<C> {
    event_type: TypeId,
    event_name: &'static str,
    extractor: Rc<Extractor<C>>,
}

impl<C> Clone for FilterSensitivity<C> {
    fn clone(&self) -> Self {
        Self {
            event_type: self.event_type,
            event_name: self.event_name,
            extractor: Rc::clone(&self.extractor),
        }
    }
}

impl<C> Debug for FilterSensitivity<C> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterSensitivity")
            .field("event", &self.event_name)
            .finish()
    }
}

impl<C> FilterSensitivity<C> {
    /// Declares sensitivity to events of type `E`. The extractor receives the
    /// downcast event and names the person whose membership might have changed.
    pub fn new<E: Any>(extractor: impl Fn(&C, &E) -> Option<PersonId> + 'static) -> Self {
        Self {
            event_type: TypeId::of::<E>(),
            event_name: std::any::type_name::<E>(),
            extractor: Rc::new(move |context: &C, event: &dyn Any| {
                event
                    .downcast_ref::<E>()
                    .and_then(|event| extractor(context, event))
            }),
        }
    }

    #[must_use]
    pub fn event_type(&self) -> TypeId {
        self.event_type
    }

    /// Identity comparison: two sensitivities are the same entry iff they share
    /// one extractor. Distinct sensitivities for the same event type are kept
    /// apart when filter trees are merged.
    #[must_use]
    pub fn same_as(&self, other: &FilterSensitivity<C>) -> bool {
        self.event_type == other.event_type && Rc::ptr_eq(&self.extractor, &other.extractor)
    }

    /// Derives the person affected by `event`, or `None` if the event is of a
    /// different type or names nobody.
    pub fn affected_person(&self, context: &C, event: &dyn Any) -> Option<PersonId> {
        (self.extractor)(context, event)
    }
}
