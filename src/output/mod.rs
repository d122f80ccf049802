//! Generated artefacts: the checksummed JSON document and the rose metadata
//! of the example suite.

pub mod json;
pub mod rose_meta;

use std::path::PathBuf;

use tracing::info;

use crate::config::Config;
use crate::error::Result;
use crate::registry::MetaData;

pub use json::{checksum, read_json_meta, to_document, verify_document, write_json_meta};
pub use rose_meta::{create_rose_meta, write_rose_meta};

/// Paths of the files written for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFiles {
    pub rose_meta: PathBuf,
    pub json: PathBuf,
}

/// Write `<suite>/meta/<meta_file_name>.conf` and `<suite>/<json_file_name>`
pub fn write_suite(meta_data: &MetaData, config: &Config) -> Result<GeneratedFiles> {
    let suite_dir = config.suite_dir();
    info!("Generating suite files in {}", suite_dir.display());

    let rose_meta = write_rose_meta(meta_data, &suite_dir, &config.output.meta_file_name)?;
    let json = write_json_meta(meta_data, &suite_dir, &config.output.json_file_name)?;
    Ok(GeneratedFiles { rose_meta, json })
}
