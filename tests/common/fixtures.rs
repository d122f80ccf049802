//! Fixture locations and configuration helpers.

use std::path::{Path, PathBuf};

use fieldmeta::Config;

/// Root of the fixture tree shipped with the tests
pub fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// A well formed source tree holding the `system__test` groups
pub fn lfric_root() -> PathBuf {
    fixtures_dir().join("lfric")
}

/// A source tree where some meta modules are invalid
pub fn invalid_root() -> PathBuf {
    fixtures_dir().join("invalid")
}

/// A CMIP6 reference table
pub fn cmip_table(name: &str) -> PathBuf {
    fixtures_dir().join("standards").join(name)
}

/// Default configuration writing the suite below `output`
pub fn config_with_output(output: &Path) -> Config {
    let mut config = Config::default();
    config.output.directory = Some(output.to_path_buf());
    config
}
