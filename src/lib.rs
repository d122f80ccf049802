//! # fieldmeta
//!
//! Reads the diagnostic field meta data a model declares in Fortran meta
//! modules, validates it and exports it for configuration tooling.
//!
//! ## Key Features
//!
//! - **Typed field descriptors**: closed vocabularies for function spaces, data types,
//!   time steps, interpolation methods and synonym conventions, resolved at construction
//! - **Registries**: one immutable [`MetaRegistry`] per `section__group`, collected into
//!   a [`MetaData`] document with a catalogue of non-spatial dimensions
//! - **Fortran front end**: a `logos` lexer and expression parser for the declarative
//!   subset meta modules are written in
//! - **Generated artefacts**: a checksummed JSON document and a `rose-meta.conf`
//!
//! ## Architecture
//!
//! - **Model**: [`field`], [`vocabulary`] and [`registry`]
//! - **Input**: [`fortran`] discovers and parses meta modules; [`validation`] turns
//!   declarations into descriptors
//! - **Output**: [`output`] writes the suite files

pub mod config;
pub mod error;
pub mod field;
pub mod fortran;
pub mod loader;
pub mod logging;
pub mod output;
pub mod registry;
pub mod validation;
pub mod vocabulary;

pub use config::Config;
pub use error::{MetaError, Result};
pub use field::{
    FieldDeclaration, FieldDescriptor, NonSpatialDimension, VerticalAxis, VerticalBounds,
    VerticalDimension,
};
pub use loader::{load_meta_data, read_meta_data};
pub use logging::{
    generate_run_id, init_tracing, log_error, log_load_stats, log_operation_end,
    log_operation_start, log_timed_operation,
};
pub use registry::{MetaData, MetaRegistry, MetaRegistryBuilder, Section};
pub use validation::{validate_field, FieldValidator, ValidationIssue};
pub use vocabulary::{LevelMarker, LevelSet};
