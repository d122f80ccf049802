//! Error types for fieldmeta.
//!
//! One enum covers every failure the reader, the validators and the writers
//! can report. Validation problems carry the field and attribute they concern.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for fieldmeta operations.
#[derive(Error, Debug)]
pub enum MetaError {
    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Directory traversal errors
    #[error("Directory traversal error: {0}")]
    Walk(#[from] walkdir::Error),

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// A required attribute is missing or an attribute value is not acceptable
    #[error("Validation error: field '{field}', attribute '{attribute}': {message}")]
    Validation {
        field: String,
        attribute: String,
        message: String,
    },

    /// Lookup of something that was never registered
    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    /// A unique id declared twice within one registry
    #[error("Field with unique ID: {unique_id} is already in Group: {group}")]
    DuplicateField { unique_id: String, group: String },

    /// Fortran source that could not be tokenised or parsed
    #[error("Parse error in {file} at line {line}: {message}")]
    Parse {
        file: String,
        line: usize,
        message: String,
    },

    /// File, module, meta type and group names disagree
    #[error("Naming error in {file}: {message}")]
    Naming { file: String, message: String },

    /// Two fields define a non-spatial dimension of the same name differently
    #[error(
        "Non-spatial dimension '{dimension}' for field '{field}' does not match previous dimension '{dimension}'"
    )]
    DimensionMismatch { dimension: String, field: String },

    /// A generated document whose checksum no longer matches its content
    #[error("Immutable data has been modified by hand. Expected checksum: {expected}, found: {found}")]
    Checksum { expected: String, found: String },

    /// Reading finished but some meta data files were invalid
    #[error("{invalid} of {total} meta data files are invalid")]
    InvalidMetaData { invalid: usize, total: usize },

    /// A required input path does not exist
    #[error("Path does not exist: {}", path.display())]
    MissingPath { path: PathBuf },
}

impl MetaError {
    /// Build a validation error for an attribute of a field
    pub fn validation(
        field: impl Into<String>,
        attribute: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        MetaError::Validation {
            field: field.into(),
            attribute: attribute.into(),
            message: message.into(),
        }
    }

    /// Build a not-found error
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        MetaError::NotFound {
            kind,
            name: name.into(),
        }
    }
}

/// Convenience type alias for Results with MetaError
pub type Result<T> = std::result::Result<T, MetaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_names_field_and_attribute() {
        let err = MetaError::validation("example_fields__u", "units", "missing");
        let text = err.to_string();
        assert!(text.contains("example_fields__u"));
        assert!(text.contains("units"));
    }

    #[test]
    fn test_not_found_message() {
        let err = MetaError::not_found("Field", "nope__nothing");
        assert_eq!(err.to_string(), "Field not found: nope__nothing");
    }
}
