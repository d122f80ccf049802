//! Assertion utilities for testing.
//!
//! Helpers for checking generated text and descriptor defaults.

use fieldmeta::{FieldDescriptor, VerticalBounds};

/// Assert that `text` contains `expected`, showing the text on failure.
///
/// # Panics
///
/// Panics if `expected` does not occur in `text`.
pub fn assert_contains(text: &str, expected: &str) {
    assert!(
        text.contains(expected),
        "Expected to find:\n{}\n--- in ---\n{}",
        expected,
        text
    );
}

/// Assert that a field falls back to the default atmospheric bounds
pub fn assert_default_bounds(field: &FieldDescriptor) {
    assert!(
        field.vertical_dimension.is_none(),
        "{} declares a vertical dimension",
        field.unique_id
    );
    assert_eq!(
        field.vertical_bounds,
        Some(VerticalBounds::default_atmospheric()),
        "{} does not have the default bounds",
        field.unique_id
    );
}
