use std::fmt::{self, Debug, Display};

use crate::groups::GroupId;
use crate::labeler::DimensionId;
use crate::people::PersonId;

/// Provides `SimdexError` and maps other error conditions to
/// a `SimdexError`
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum SimdexError {
    /// A person id was referenced that does not exist in the population.
    UnknownPerson(PersonId),
    /// A group id was referenced that the group store does not know.
    UnknownGroup(GroupId),
    /// A named random stream was requested that the context does not provide.
    UnknownRngStream(&'static str),
    /// A query `LabelSet` named a dimension the partition does not declare,
    /// or was non-empty against a degenerate partition.
    InvalidLabelSet(String),
    /// A partition declaration was handed to the wrong index implementation,
    /// or was malformed (e.g. duplicate dimensions).
    PartitionMisuse(String),
    SimdexError(String),
}

impl From<String> for SimdexError {
    fn from(error: String) -> Self {
        SimdexError::SimdexError(error)
    }
}

impl From<&str> for SimdexError {
    fn from(error: &str) -> Self {
        SimdexError::SimdexError(error.to_string())
    }
}

impl SimdexError {
    pub(crate) fn unknown_dimension(dimension: DimensionId) -> Self {
        SimdexError::InvalidLabelSet(format!(
            "label set names dimension {dimension} which the partition does not declare"
        ))
    }
}

impl std::error::Error for SimdexError {}

impl Display for SimdexError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Error: {self:?}")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_conversion() {
        let e: SimdexError = "a thing went wrong".into();
        assert!(matches!(e, SimdexError::SimdexError(_)));
        assert!(format!("{e}").contains("a thing went wrong"));
    }

    #[test]
    fn unknown_person_display() {
        let e = SimdexError::UnknownPerson(PersonId(3));
        assert!(format!("{e}").contains('3'));
    }
}
