use std::fmt::{Debug, Display, Formatter};

/// An opaque handle for a member of the simulated population.
///
/// Ids are assigned densely by the external population store; this crate never
/// creates or destroys them, it only reacts to addition and removal
/// notifications that carry them.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PersonId(pub usize);

impl Display for PersonId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Debug for PersonId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Person {}", self.0)
    }
}
