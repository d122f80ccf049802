//! Validation of declared meta data.
//!
//! [`FieldValidator`] turns a [`FieldDeclaration`](crate::field::FieldDeclaration)
//! into a [`FieldDescriptor`](crate::field::FieldDescriptor), reporting every
//! problem it finds rather than stopping at the first. Naming rules for meta
//! modules live in [`naming`]; checks against external naming standards
//! implement [`FieldStandard`].

pub mod cmip;
pub mod field;
pub mod naming;

use std::fmt;

use crate::error::MetaError;
use crate::field::FieldDescriptor;

pub use cmip::{Cmip6Standard, CmipRecord};
pub use field::{validate_field, FieldValidator};
pub use naming::{split_file_name, split_qualified, validate_names};

/// One problem found while validating a field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Unique id of the field, empty when the id itself is missing
    pub field: String,
    pub attribute: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(
        field: impl Into<String>,
        attribute: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            attribute: attribute.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl From<ValidationIssue> for MetaError {
    fn from(issue: ValidationIssue) -> Self {
        MetaError::validation(issue.field, issue.attribute, issue.message)
    }
}

/// An external naming standard a validated field can be checked against
pub trait FieldStandard: Send + Sync {
    /// Short name used in log output
    fn name(&self) -> &'static str;

    /// Whether the field claims membership of this standard
    fn applies_to(&self, field: &FieldDescriptor) -> bool;

    /// Problems with the field's claim; empty when it conforms
    fn check(&self, field: &FieldDescriptor) -> Vec<ValidationIssue>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_converts_to_validation_error() {
        let issue = ValidationIssue::new("example_fields__u", "units", "A unit of measure is missing");
        match MetaError::from(issue) {
            MetaError::Validation { field, attribute, message } => {
                assert_eq!(field, "example_fields__u");
                assert_eq!(attribute, "units");
                assert_eq!(message, "A unit of measure is missing");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
