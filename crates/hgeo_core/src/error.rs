//! Error types for geometry construction and ingestion.

use thiserror::Error;

use crate::attribute::{AttributeOwner, AttributeType};

/// Errors raised while building or validating a [`GeoContainer`].
///
/// [`GeoContainer`]: crate::geometry::GeoContainer
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeoError {
    /// An attribute with the same name and owner exists with another layout.
    #[error(
        "{owner} attribute '{name}' already exists as {existing_type}[{existing_size}], \
         cannot redefine it as {requested_type}[{requested_size}]"
    )]
    SchemaConflict {
        name: String,
        owner: AttributeOwner,
        existing_type: AttributeType,
        existing_size: usize,
        requested_type: AttributeType,
        requested_size: usize,
    },

    /// A point batch contained records of more than one record type.
    #[error(
        "point {index} is of type '{found}' but the batch expects '{expected}'; \
         mixed point types are not supported"
    )]
    MixedRecordTypes {
        expected: &'static str,
        found: &'static str,
        index: usize,
    },

    /// A field named like a group field is not a flag set.
    #[error(
        "field '{field}' of '{record}' is reserved for group membership \
         and must be a flag set"
    )]
    InvalidGroupsField {
        record: &'static str,
        field: &'static str,
    },

    /// A record declares more than one group-membership field.
    #[error(
        "'{record}' declares both '{first}' and '{second}' as group fields; \
         only one is allowed"
    )]
    DuplicateGroupsField {
        record: &'static str,
        first: &'static str,
        second: &'static str,
    },

    /// A value does not fit the attribute it is written to.
    #[error("value of kind {found} does not fit attribute '{attribute}' ({expected})")]
    ValueMismatch {
        attribute: String,
        expected: String,
        found: &'static str,
    },

    /// A record did not produce a value for a field its schema declares.
    #[error("record '{record}' has no value for declared field '{field}'")]
    MissingFieldValue {
        record: &'static str,
        field: &'static str,
    },

    /// An element index points past the end of its element list.
    #[error("{what} index {index} out of range (count: {count})")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        count: usize,
    },

    /// A spline has too few points to form a curve.
    #[error("spline {index} has {points} point(s), at least 2 are required")]
    DegenerateSpline { index: usize, points: usize },

    /// An attribute holds a different number of tuples than its owner has elements.
    #[error("{owner} attribute '{name}' holds {actual} tuples, expected {expected}")]
    CountMismatch {
        name: String,
        owner: AttributeOwner,
        expected: usize,
        actual: usize,
    },
}

/// Result type for geometry operations.
pub type GeoResult<T> = Result<T, GeoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_conflict_display() {
        let e = GeoError::SchemaConflict {
            name: "Cd".to_string(),
            owner: AttributeOwner::Point,
            existing_type: AttributeType::Float,
            existing_size: 3,
            requested_type: AttributeType::Integer,
            requested_size: 1,
        };
        let msg = e.to_string();
        assert!(msg.contains("'Cd'"));
        assert!(msg.contains("float[3]"));
        assert!(msg.contains("int[1]"));
    }

    #[test]
    fn test_out_of_range_display() {
        let e = GeoError::IndexOutOfRange { what: "point", index: 7, count: 3 };
        assert!(e.to_string().contains("7"));
        assert!(e.to_string().contains("3"));
    }
}
