//! Configuration management for fieldmeta.
//!
//! This module handles the layered configuration system with the following precedence:
//! 1. Command-line arguments (highest priority)
//! 2. Environment variables
//! 3. JSON config file
//! 4. Default values (lowest priority)

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{MetaError, Result};

/// Command-line arguments for fieldmeta
#[derive(Parser, Debug)]
#[command(name = "fieldmeta")]
#[command(author, version, about = "Generate field meta data from Fortran meta modules", long_about = None)]
pub struct Args {
    /// Root of the model source tree to scan for meta modules
    #[arg(short, long, env = "FIELDMETA_PATH")]
    pub path: PathBuf,

    /// Directory the example suite is written to
    #[arg(short, long, env = "FIELDMETA_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Name of the generated rose meta file, without extension
    #[arg(short, long, env = "FIELDMETA_FILENAME")]
    pub filename: Option<String>,

    /// Directory holding the supporting meta types (levels_enum_mod.f90)
    #[arg(short, long = "support-types", env = "FIELDMETA_SUPPORT_TYPES")]
    pub support_types: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long)]
    pub verbose: bool,

    /// Path to JSON configuration file
    #[arg(short, long, env = "FIELDMETA_CONFIG")]
    pub config: Option<PathBuf>,

    /// CMIP6 reference table (JSON) to check CMIP6 synonyms against
    #[arg(long, env = "FIELDMETA_CMIP_TABLE")]
    pub cmip_table: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "FIELDMETA_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

/// Where meta modules and their supporting types are found
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Directory, relative to any ancestor, that meta modules live below
    #[serde(default = "default_meta_dir")]
    pub meta_dir: String,

    /// Supporting meta types directory; derived from the root when unset
    #[serde(default)]
    pub support_types: Option<PathBuf>,
}

/// What is generated and where
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Parent directory of the generated suite (current directory when unset)
    #[serde(default)]
    pub directory: Option<PathBuf>,

    /// Name of the generated suite directory
    #[serde(default = "default_suite_dir")]
    pub suite_dir: String,

    /// Rose meta file name, without the `.conf` extension
    #[serde(default = "default_meta_file_name")]
    pub meta_file_name: String,

    /// Name of the checksummed JSON document
    #[serde(default = "default_json_file_name")]
    pub json_file_name: String,
}

/// External naming standards to check fields against
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StandardsConfig {
    /// CMIP6 reference table
    #[serde(default)]
    pub cmip_table: Option<PathBuf>,
}

/// Complete configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Input configuration
    #[serde(default)]
    pub input: InputConfig,

    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,

    /// Standards configuration
    #[serde(default)]
    pub standards: StandardsConfig,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Config {
    /// Load configuration from all sources with proper precedence
    pub fn load() -> Result<(Self, PathBuf)> {
        Self::from_args(Args::parse())
    }

    /// Build configuration from parsed arguments. Returns the source root
    /// alongside the configuration.
    pub fn from_args(args: Args) -> Result<(Self, PathBuf)> {
        // Start with defaults
        let mut config = Config::default();

        // Load from JSON file if provided
        if let Some(config_path) = &args.config {
            let json_config = Self::load_from_file(config_path)?;
            config.merge(json_config);
        }

        // Override with command-line arguments
        if args.output.is_some() {
            config.output.directory = args.output;
        }
        if let Some(filename) = args.filename {
            config.output.meta_file_name = filename;
        }
        if args.support_types.is_some() {
            config.input.support_types = args.support_types;
        }
        if args.cmip_table.is_some() {
            config.standards.cmip_table = args.cmip_table;
        }
        config.log_level = if args.verbose {
            "debug".to_string()
        } else {
            args.log_level
        };

        Ok((config, args.path))
    }

    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        self.input.meta_dir = other.input.meta_dir;
        if other.input.support_types.is_some() {
            self.input.support_types = other.input.support_types;
        }
        if other.output.directory.is_some() {
            self.output.directory = other.output.directory;
        }
        self.output.suite_dir = other.output.suite_dir;
        self.output.meta_file_name = other.output.meta_file_name;
        self.output.json_file_name = other.output.json_file_name;
        if other.standards.cmip_table.is_some() {
            self.standards.cmip_table = other.standards.cmip_table;
        }
        self.log_level = other.log_level;
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("meta_dir", &self.input.meta_dir),
            ("suite_dir", &self.output.suite_dir),
            ("meta_file_name", &self.output.meta_file_name),
            ("json_file_name", &self.output.json_file_name),
        ] {
            if value.trim().is_empty() {
                return Err(MetaError::Config {
                    message: format!("{name} cannot be empty"),
                });
            }
        }

        // Output names are single path components
        for (name, value) in [
            ("meta_file_name", &self.output.meta_file_name),
            ("json_file_name", &self.output.json_file_name),
        ] {
            if value.contains('/') || value.contains('\\') {
                return Err(MetaError::Config {
                    message: format!("{name} must be a file name, not a path: {value}"),
                });
            }
        }

        // Validate log level
        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(MetaError::Config {
                    message: format!(
                        "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                        self.log_level
                    ),
                });
            }
        }

        Ok(())
    }

    /// Supporting meta types directory for a source root
    pub fn support_types_dir(&self, root: &Path) -> PathBuf {
        self.input
            .support_types
            .clone()
            .unwrap_or_else(|| root.join(default_support_types()))
    }

    /// Directory the suite is generated in
    pub fn suite_dir(&self) -> PathBuf {
        self.output
            .directory
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(&self.output.suite_dir)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: InputConfig::default(),
            output: OutputConfig::default(),
            standards: StandardsConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            meta_dir: default_meta_dir(),
            support_types: None,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: None,
            suite_dir: default_suite_dir(),
            meta_file_name: default_meta_file_name(),
            json_file_name: default_json_file_name(),
        }
    }
}

// Default value functions for serde
fn default_meta_dir() -> String {
    "source/diagnostics_meta".to_string()
}

fn default_support_types() -> &'static str {
    "um_physics/source/diagnostics_meta/meta_types"
}

fn default_suite_dir() -> String {
    "example_rose_suite".to_string()
}

fn default_meta_file_name() -> String {
    "rose-meta".to_string()
}

fn default_json_file_name() -> String {
    "LFRic_meta_data.json".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.input.meta_dir, "source/diagnostics_meta");
        assert_eq!(config.output.suite_dir, "example_rose_suite");
        assert_eq!(config.output.meta_file_name, "rose-meta");
        assert_eq!(config.output.json_file_name, "LFRic_meta_data.json");
        assert!(config.standards.cmip_table.is_none());
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_config_merge() {
        let mut config1 = Config::default();
        let mut config2 = Config::default();

        config2.output.meta_file_name = "diagnostics".to_string();
        config2.standards.cmip_table = Some(PathBuf::from("cmip6.json"));

        config1.merge(config2);

        assert_eq!(config1.output.meta_file_name, "diagnostics");
        assert_eq!(config1.standards.cmip_table, Some(PathBuf::from("cmip6.json")));
    }

    #[test]
    fn test_cli_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"output": {{"meta_file_name": "from-file", "suite_dir": "suite"}}}}"#
        )
        .unwrap();

        let args = Args::parse_from([
            "fieldmeta",
            "-p",
            "/src/lfric",
            "-f",
            "from-cli",
            "-c",
            file.path().to_str().unwrap(),
            "-v",
        ]);
        let (config, root) = Config::from_args(args).unwrap();

        assert_eq!(root, PathBuf::from("/src/lfric"));
        assert_eq!(config.output.meta_file_name, "from-cli");
        assert_eq!(config.output.suite_dir, "suite");
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_derived_paths() {
        let mut config = Config::default();
        assert_eq!(
            config.support_types_dir(Path::new("/lfric")),
            PathBuf::from("/lfric/um_physics/source/diagnostics_meta/meta_types")
        );
        assert_eq!(config.suite_dir(), PathBuf::from("./example_rose_suite"));

        config.output.directory = Some(PathBuf::from("/out"));
        assert_eq!(config.suite_dir(), PathBuf::from("/out/example_rose_suite"));
    }

    #[test]
    fn test_config_validation() {
        // Valid config should pass
        let config = Config::default();
        assert!(config.validate().is_ok());

        // Test empty file name
        let mut config = Config::default();
        config.output.meta_file_name = " ".to_string();
        assert!(config.validate().is_err());

        // Test file name with a directory
        let mut config = Config::default();
        config.output.json_file_name = "out/meta.json".to_string();
        assert!(config.validate().is_err());

        // Test invalid log level
        let mut config = Config::default();
        config.log_level = "invalid".to_string();
        assert!(config.validate().is_err());
    }
}
