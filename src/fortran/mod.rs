//! Fortran front end for diagnostic meta data modules.
//!
//! Meta modules are ordinary Fortran: a module defining one meta type whose
//! constructor assigns `field_meta_data_type(...)` structure constructors.
//! Only that declarative subset is understood; the rest of a module is
//! tokenised and skipped.

pub mod extract;
pub mod lexer;
pub mod parser;
pub mod reader;

pub use extract::{extract_field, ExtractedField, FIELD_CONSTRUCTOR};
pub use reader::{
    find_meta_files, parse_enum, parse_meta_module, read_enum, FortranMetaReader, MetaModule,
    ReadReport,
};
