//! Labels and label sets.
//!
//! A label is an arbitrary equatable/hashable value (a boolean, a small
//! integer, a string, an enum variant). Labels are stored type-erased: equality
//! and hashing go through the 128-bit xxh3 digest of the (type, value) pair,
//! while the original value is retained for typed read-back and display.
//!
//! A [`LabelSet`] is a possibly-partial assignment of labels to dimensions. It
//! serves two roles: describing the realized classification of one partition
//! bucket, and posing a query ("every bucket consistent with these labels").

use std::any::{Any, TypeId};
use std::fmt::{Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::hashing::{one_shot_128, HashMap};
use crate::labeler::DimensionId;

/// A type-erased label value.
#[derive(Clone)]
pub struct Label {
    hash: u128,
    text: String,
    value: Rc<dyn Any>,
}

impl Label {
    pub fn new<T: Any + Hash + Debug>(value: T) -> Self {
        let hash = one_shot_128(&(TypeId::of::<T>(), &value));
        Self {
            hash,
            text: format!("{value:?}"),
            value: Rc::new(value),
        }
    }

    /// Reads the original value back, if `T` is the type it was built from.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }
}

impl PartialEq for Label {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Eq for Label {}

impl Hash for Label {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u128(self.hash);
    }
}

impl Debug for Label {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}

impl Display for Label {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// A partial or total assignment of labels to dimensions. Empty matches
/// everything; a partial set constrains only the dimensions it names.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct LabelSet {
    labels: HashMap<DimensionId, Label>,
}

impl LabelSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) the label for one dimension.
    #[must_use]
    pub fn with_label(mut self, dimension: DimensionId, label: Label) -> Self {
        self.labels.insert(dimension, label);
        self
    }

    #[must_use]
    pub fn get_label(&self, dimension: DimensionId) -> Option<&Label> {
        self.labels.get(&dimension)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn dimensions(&self) -> impl Iterator<Item = DimensionId> + '_ {
        self.labels.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DimensionId, &Label)> + '_ {
        self.labels.iter().map(|(dimension, label)| (*dimension, label))
    }
}

// Structural and order-independent: the per-entry digests are combined with a
// commutative operation before touching the hasher state.
impl Hash for LabelSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let combined = self
            .labels
            .iter()
            .map(|entry| one_shot_128(&entry))
            .fold(0u128, u128::wrapping_add);
        state.write_u128(combined);
    }
}

impl Debug for LabelSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut entries: Vec<(DimensionId, &Label)> = self.iter().collect();
        entries.sort_by_key(|(dimension, _)| dimension.0);
        f.debug_map().entries(entries).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::HashSet;

    const DIM_A: DimensionId = DimensionId("a");
    const DIM_B: DimensionId = DimensionId("b");

    #[test]
    fn label_round_trip() {
        let label = Label::new(17_i64);
        assert_eq!(label.downcast_ref::<i64>(), Some(&17));
        assert_eq!(label.downcast_ref::<bool>(), None);
    }

    #[test]
    fn label_equality_is_by_value_and_type() {
        assert_eq!(Label::new(true), Label::new(true));
        assert_ne!(Label::new(true), Label::new(false));
        // Same bit pattern, different type.
        assert_ne!(Label::new(1_u8), Label::new(1_u16));
    }

    #[test]
    fn label_set_round_trip() {
        let set = LabelSet::new()
            .with_label(DIM_A, Label::new("x"))
            .with_label(DIM_B, Label::new("y"));
        assert_eq!(set.get_label(DIM_A), Some(&Label::new("x")));
        assert_eq!(set.get_label(DIM_B), Some(&Label::new("y")));
        assert_eq!(set.get_label(DimensionId("c")), None);
        assert_eq!(set.len(), 2);
        assert!(!set.is_empty());
        assert!(LabelSet::new().is_empty());
    }

    #[test]
    fn insertion_order_does_not_matter() {
        let forward = LabelSet::new()
            .with_label(DIM_A, Label::new("x"))
            .with_label(DIM_B, Label::new("y"));
        let reverse = LabelSet::new()
            .with_label(DIM_B, Label::new("y"))
            .with_label(DIM_A, Label::new("x"));
        assert_eq!(forward, reverse);

        let mut hashed = HashSet::default();
        hashed.insert(forward);
        assert!(hashed.contains(&reverse));
    }

    #[test]
    fn different_contents_are_unequal() {
        let set = LabelSet::new().with_label(DIM_A, Label::new("x"));
        let other = LabelSet::new().with_label(DIM_A, Label::new("z"));
        assert_ne!(set, other);
    }
}
