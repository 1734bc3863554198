use std::cmp::Ordering;

/// The six comparison operators used by attribute-based filters.
///
/// An operator accepts or rejects the result of a three-way comparison between
/// an attribute's current value and the filter's comparison value.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Equality {
    Equal,
    NotEqual,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
}

impl Equality {
    /// Returns whether `ordering` (attribute value compared to the filter's
    /// comparison value) is compatible with this operator.
    #[must_use]
    pub fn is_compatible(self, ordering: Ordering) -> bool {
        match self {
            Equality::Equal => ordering == Ordering::Equal,
            Equality::NotEqual => ordering != Ordering::Equal,
            Equality::LessThan => ordering == Ordering::Less,
            Equality::LessThanEqual => ordering != Ordering::Greater,
            Equality::GreaterThan => ordering == Ordering::Greater,
            Equality::GreaterThanEqual => ordering != Ordering::Less,
        }
    }

    /// The logical complement: for every ordering, exactly one of `self` and
    /// `self.negation()` is compatible.
    #[must_use]
    pub fn negation(self) -> Equality {
        match self {
            Equality::Equal => Equality::NotEqual,
            Equality::NotEqual => Equality::Equal,
            Equality::LessThan => Equality::GreaterThanEqual,
            Equality::LessThanEqual => Equality::GreaterThan,
            Equality::GreaterThan => Equality::LessThanEqual,
            Equality::GreaterThanEqual => Equality::LessThan,
        }
    }
}
