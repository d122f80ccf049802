//! Common test utilities for fieldmeta.
//!
//! This module provides shared utilities for the integration tests.

pub mod assertions;
pub mod fixtures;
