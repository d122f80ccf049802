//! Loading meta data from a model source tree.
//!
//! Resolves the level markers in force, sets up the field validator and reads
//! every meta module below the root.

use std::path::Path;
use std::time::Instant;

use tracing::{info, warn};

use crate::config::Config;
use crate::error::{MetaError, Result};
use crate::fortran::{read_enum, FortranMetaReader, ReadReport};
use crate::logging::{log_load_stats, log_operation_end, log_operation_start};
use crate::registry::MetaData;
use crate::validation::{Cmip6Standard, FieldValidator};
use crate::vocabulary::LevelSet;

/// Enum module declaring the standard level markers
pub const LEVELS_ENUM_FILE: &str = "levels_enum_mod.f90";

/// Level markers declared in `support_types/levels_enum_mod.f90`, or the
/// built-in set when that file is missing or declares nothing
pub fn load_levels(support_types: &Path) -> LevelSet {
    let path = support_types.join(LEVELS_ENUM_FILE);
    match read_enum(&path) {
        Ok(names) if !names.is_empty() => {
            info!("Read {} level markers from {}", names.len(), path.display());
            LevelSet::from_names(names)
        }
        Ok(_) => {
            warn!("No level markers declared in {}, using the standard set", path.display());
            LevelSet::standard()
        }
        Err(err) => {
            warn!(
                "Could not read level markers from {}: {}. Using the standard set",
                path.display(),
                err
            );
            LevelSet::standard()
        }
    }
}

/// Validator for a run: the levels in force plus any configured standards
pub fn build_validator(root: &Path, config: &Config) -> Result<FieldValidator> {
    let levels = load_levels(&config.support_types_dir(root));
    let mut validator = FieldValidator::new(levels);

    if let Some(table) = &config.standards.cmip_table {
        let standard = Cmip6Standard::load(table)?;
        info!(
            "Checking CMIP6 synonyms against {} ({} entries)",
            table.display(),
            standard.len()
        );
        validator = validator.with_standard(standard);
    }
    Ok(validator)
}

/// Read every meta module below `root`, logging each problem found
pub fn read_meta_data(root: &Path, config: &Config) -> Result<ReadReport> {
    if !root.exists() {
        return Err(MetaError::MissingPath {
            path: root.to_path_buf(),
        });
    }

    let start = Instant::now();
    let root_display = root.display().to_string();
    log_operation_start("meta_data_load", Some(&root_display));

    let validator = build_validator(root, config)?;
    let reader = FortranMetaReader::discover(root, &config.input.meta_dir, validator)?;
    let report = reader.read_all();

    log_load_stats(
        &root_display,
        &report.meta_data,
        report.valid_files,
        report.total_files,
    );
    log_operation_end("meta_data_load", start, report.is_valid());
    Ok(report)
}

/// Read every meta module below `root`; fails if any of them is invalid
pub fn load_meta_data(root: &Path, config: &Config) -> Result<MetaData> {
    read_meta_data(root, config)?.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_levels_fall_back_to_standard_set() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_levels(dir.path()), LevelSet::standard());
    }

    #[test]
    fn test_levels_read_from_enum_module() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(LEVELS_ENUM_FILE),
            "module levels_enum_mod\n  enum, bind(c)\n    enumerator :: TOP_ATMOSPHERIC_LEVEL, BOTTOM_ATMOSPHERIC_LEVEL\n  end enum\nend module levels_enum_mod\n",
        )
        .unwrap();
        let levels = load_levels(dir.path());
        assert_eq!(levels.len(), 2);
        assert!(levels.contains("TOP_ATMOSPHERIC_LEVEL"));
        assert!(!levels.contains("TOP_WET_LEVEL"));
    }

    #[test]
    fn test_missing_root() {
        let config = Config::default();
        let err = load_meta_data(Path::new("/does/not/exist/anywhere"), &config).unwrap_err();
        assert!(matches!(err, MetaError::MissingPath { .. }));
    }

    #[test]
    fn test_missing_cmip_table_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.standards.cmip_table = Some(dir.path().join("missing.json"));
        assert!(build_validator(dir.path(), &config).is_err());
    }
}
