//! Discovery and reading of Fortran meta data modules.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info};
use walkdir::WalkDir;

use super::extract::{extract_field, ExtractedField, FIELD_CONSTRUCTOR};
use super::lexer::{split_statements, tokenize, Statement, Token};
use super::parser::{ExprParser, Expr};
use crate::error::{MetaError, Result};
use crate::registry::{MetaData, MetaRegistry};
use crate::validation::{split_file_name, validate_names, FieldValidator};

/// Names and field declarations found in one meta module
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetaModule {
    pub module_name: Option<String>,
    /// Every derived type defined in the module; there should be exactly one
    pub meta_type_names: Vec<String>,
    /// Value of the `name` component of the meta type
    pub group_name: Option<String>,
    pub fields: Vec<ExtractedField>,
}

fn statements(source: &str, file_name: &str) -> Result<Vec<Statement>> {
    let tokens = tokenize(source).map_err(|err| MetaError::Parse {
        file: file_name.to_string(),
        line: err.line,
        message: format!("unexpected character '{}'", err.fragment),
    })?;
    Ok(split_statements(tokens))
}

/// Name of a derived type defined by `type, public :: name` or `type name`
fn type_definition_name(statement: &Statement) -> Option<String> {
    if matches!(statement.tokens.get(1), Some(Token::LParen)) {
        return None;
    }
    let idx = match statement.top_level_index(&Token::DoubleColon) {
        Some(idx) => idx + 1,
        None => 1,
    };
    let name = statement.tokens.get(idx)?.ident()?;
    if matches!(statement.tokens.get(idx + 1), Some(Token::LParen)) {
        return None;
    }
    Some(name.to_string())
}

/// Initial value of a `name` component: `character(...) :: name = "..."`
fn declared_name(statement: &Statement) -> Option<String> {
    let start = statement.top_level_index(&Token::DoubleColon)? + 1;
    statement.tokens[start..]
        .windows(3)
        .find_map(|window| match window {
            [name, Token::Assign, Token::Str(value)] if name.is_ident("name") => {
                Some(value.clone())
            }
            _ => None,
        })
}

/// Parse the source of a meta module
pub fn parse_meta_module(source: &str, file_name: &str) -> Result<MetaModule> {
    let mut module = MetaModule::default();
    let mut in_type = false;

    for statement in statements(source, file_name)? {
        let keyword = statement.keyword();
        let second = statement
            .tokens
            .get(1)
            .and_then(Token::ident)
            .map(str::to_ascii_lowercase);

        match keyword.as_deref() {
            Some("module") if module.module_name.is_none() => {
                if let Some(name) = second.as_deref().filter(|s| *s != "procedure") {
                    module.module_name = statement.tokens[1].ident().map(str::to_string);
                    debug!("Module {} in {}", name, file_name);
                }
            }
            Some("type") => {
                if let Some(name) = type_definition_name(&statement) {
                    module.meta_type_names.push(name);
                    in_type = true;
                }
            }
            Some("endtype") => in_type = false,
            Some("end") if second.as_deref() == Some("type") => in_type = false,
            Some("character") if in_type => {
                if let Some(name) = declared_name(&statement) {
                    module.group_name = Some(name);
                }
            }
            _ => {}
        }

        if statement.is_declaration() {
            continue;
        }
        let tokens = &statement.tokens;
        let mut i = 0;
        while i < tokens.len() {
            if tokens[i].is_ident(FIELD_CONSTRUCTOR) && tokens.get(i + 1) == Some(&Token::LParen) {
                let mut parser = ExprParser::new(&tokens[i..]);
                let expr = parser.parse_primary().map_err(|message| MetaError::Parse {
                    file: file_name.to_string(),
                    line: statement.line,
                    message,
                })?;
                if let Expr::Call { args, .. } = expr {
                    module.fields.push(extract_field(&args, statement.line));
                }
                i += parser.position();
            } else {
                i += 1;
            }
        }
    }
    Ok(module)
}

/// Enumerator names declared in Fortran source, in order
pub fn parse_enum(source: &str, file_name: &str) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for statement in statements(source, file_name)? {
        if statement.keyword().as_deref() != Some("enumerator") {
            continue;
        }
        let start = statement
            .top_level_index(&Token::DoubleColon)
            .map_or(1, |idx| idx + 1);
        let mut expect_name = true;
        for token in &statement.tokens[start..] {
            match token {
                Token::Comma => expect_name = true,
                Token::Ident(name) if expect_name => {
                    names.push(name.clone());
                    expect_name = false;
                }
                _ => expect_name = false,
            }
        }
    }
    Ok(names)
}

/// Read the enumerator names from a file holding one enum
pub fn read_enum(path: &Path) -> Result<Vec<String>> {
    let source = fs::read_to_string(path)?;
    parse_enum(&source, &path.display().to_string())
}

fn is_meta_module_name(name: &str) -> bool {
    name.rsplit_once('.')
        .is_some_and(|(stem, ext)| stem.ends_with("__meta_mod") && ext.ends_with("90"))
}

/// Recursively find `*__meta_mod.*90` files below any `meta_dir` directory
/// under `root`, sorted
pub fn find_meta_files(root: &Path, meta_dir: &str) -> Result<Vec<PathBuf>> {
    info!("Scanning for Fortran meta data files...");
    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let named = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(is_meta_module_name);
        let placed = path
            .parent()
            .is_some_and(|parent| parent.ancestors().any(|a| a.ends_with(meta_dir)));
        if named && placed {
            debug!("Found meta data file at: {}", path.display());
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    info!("Found {} meta data files", files.len());
    Ok(files)
}

/// Outcome of reading every meta module
#[derive(Debug, Clone)]
pub struct ReadReport {
    pub meta_data: MetaData,
    pub valid_files: usize,
    pub total_files: usize,
}

impl ReadReport {
    pub fn is_valid(&self) -> bool {
        self.valid_files == self.total_files
    }

    /// The meta data, or `InvalidMetaData` if any file was invalid
    pub fn into_result(self) -> Result<MetaData> {
        if self.is_valid() {
            Ok(self.meta_data)
        } else {
            Err(MetaError::InvalidMetaData {
                invalid: self.total_files - self.valid_files,
                total: self.total_files,
            })
        }
    }
}

/// Reads a set of meta modules into one [`MetaData`] document
#[derive(Debug)]
pub struct FortranMetaReader {
    files: Vec<PathBuf>,
    validator: FieldValidator,
}

impl FortranMetaReader {
    pub fn new(files: Vec<PathBuf>, validator: FieldValidator) -> Self {
        Self { files, validator }
    }

    /// Reader over every meta module found below `root`
    pub fn discover(root: &Path, meta_dir: &str, validator: FieldValidator) -> Result<Self> {
        Ok(Self::new(find_meta_files(root, meta_dir)?, validator))
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Read every file, carrying on past invalid ones so that every problem
    /// is logged
    pub fn read_all(&self) -> ReadReport {
        let mut meta_data = MetaData::new(self.validator.levels().clone());
        let mut valid_files = 0;

        for path in &self.files {
            match self.read_file(path, &mut meta_data) {
                Ok(true) => valid_files += 1,
                Ok(false) => {}
                Err(err) => error!("Failed to read {}: {}", path.display(), err),
            }
        }

        let total_files = self.files.len();
        if valid_files == total_files {
            info!("All {} files are valid", total_files);
        } else {
            error!(
                "{} of {} files are invalid",
                total_files - valid_files,
                total_files
            );
        }
        ReadReport {
            meta_data,
            valid_files,
            total_files,
        }
    }

    /// Read every file; fails if any of them is invalid
    pub fn read(&self) -> Result<MetaData> {
        self.read_all().into_result()
    }

    fn read_file(&self, path: &Path, meta_data: &mut MetaData) -> Result<bool> {
        let shown = path.display().to_string();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&shown)
            .to_string();
        debug!("Reading {}", shown);

        let source = fs::read_to_string(path)?;
        let module = parse_meta_module(&source, &file_name)?;
        let mut valid = true;

        if module.meta_type_names.len() > 1 {
            error!("More than one meta type has been declared in {}", shown);
            valid = false;
        }
        let problems = validate_names(
            &shown,
            module.module_name.as_deref().unwrap_or_default(),
            module.meta_type_names.last().map_or("", String::as_str),
            module.group_name.as_deref(),
        );
        for problem in &problems {
            error!("{}", problem);
            valid = false;
        }

        let Some((section, group)) = split_file_name(&file_name) else {
            error!("Filename in path is not correct {}", shown);
            return Ok(false);
        };
        let mut registry = MetaRegistry::new(&format!("{section}__{group}"))?;
        registry.set_file_name(file_name.as_str());

        for extracted in module.fields {
            for problem in &extracted.problems {
                error!(file = %file_name, line = extracted.line, "{}", problem);
                valid = false;
            }
            match self.validator.validate(&extracted.declaration, &file_name) {
                Ok(field) if extracted.problems.is_empty() => {
                    if registry.insert(field).is_err() {
                        valid = false;
                    }
                }
                Ok(_) => {}
                Err(_) => {
                    error!(
                        "{} is invalid. Please check",
                        extracted.declaration.unique_id.as_deref().unwrap_or("field")
                    );
                    valid = false;
                }
            }
        }

        if let Err(err) = meta_data.add_registry(registry) {
            error!("{}", err);
            valid = false;
        }
        Ok(valid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODULE: &str = r#"
module physics__radiation__meta_mod
  use diagnostics_mod, only: field_meta_data_type
  implicit none
  private

  type, public :: physics__radiation__meta_type
    type(field_meta_data_type), public :: sw_heating
    character(str_def) :: name = "physics__radiation"
  end type physics__radiation__meta_type

  interface physics__radiation__meta_type
    module procedure meta_constructor
  end interface

contains

  function meta_constructor() result(self)
    type(physics__radiation__meta_type) :: self

    self%sw_heating = field_meta_data_type( &
      unique_id = "radiation__sw_heating", & ! the id
      units = "K s-1", &
      function_space = Wtheta, &
      trigger = "__checksum: true;", &
      description = "Shortwave " // &
                    "heating rate", &
      data_type = REAL_TYPE, &
      time_step = RADIATION_TIMESTEP, &
      long_name = "shortwave heating rate", &
      recommended_interpolation = BILINEAR)
  end function meta_constructor
end module physics__radiation__meta_mod
"#;

    #[test]
    fn test_parse_meta_module_names() {
        let module = parse_meta_module(MODULE, "physics__radiation__meta_mod.f90").unwrap();
        assert_eq!(
            module.module_name.as_deref(),
            Some("physics__radiation__meta_mod")
        );
        assert_eq!(module.meta_type_names, vec!["physics__radiation__meta_type"]);
        assert_eq!(module.group_name.as_deref(), Some("physics__radiation"));
    }

    #[test]
    fn test_parse_meta_module_fields() {
        let module = parse_meta_module(MODULE, "physics__radiation__meta_mod.f90").unwrap();
        assert_eq!(module.fields.len(), 1);
        let field = &module.fields[0];
        assert!(field.problems.is_empty());
        assert_eq!(
            field.declaration.unique_id.as_deref(),
            Some("radiation__sw_heating")
        );
        assert_eq!(
            field.declaration.description.as_deref(),
            Some("Shortwave heating rate")
        );
        assert_eq!(field.line, 21);
    }

    #[test]
    fn test_reader_registers_valid_module() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("physics__radiation__meta_mod.f90");
        fs::write(&path, MODULE).unwrap();

        let report = FortranMetaReader::new(vec![path], FieldValidator::default()).read_all();
        assert!(report.is_valid());
        assert_eq!(report.total_files, 1);
        let registry = report.meta_data.registry("physics__radiation").unwrap();
        assert!(registry.lookup("radiation__sw_heating").is_ok());
    }

    #[test]
    fn test_multiple_type_definitions_are_listed() {
        let source = "module a__b__meta_mod\ntype :: one\nend type\ntype two\nend type two\nend module\n";
        let module = parse_meta_module(source, "a__b__meta_mod.f90").unwrap();
        assert_eq!(module.meta_type_names, vec!["one", "two"]);
    }

    #[test]
    fn test_parse_error_reports_line() {
        let source = "module a__b__meta_mod\nx = field_meta_data_type(units=\"K\"\n";
        match parse_meta_module(source, "a__b__meta_mod.f90") {
            Err(MetaError::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_parse_enum() {
        let source = "module levels_enum_mod\n  enum, bind(c)\n    enumerator :: ONE = 1, TWO\n    enumerator THREE\n  end enum\nend module\n";
        assert_eq!(
            parse_enum(source, "levels_enum_mod.f90").unwrap(),
            vec!["ONE", "TWO", "THREE"]
        );
    }

    #[test]
    fn test_meta_module_file_names() {
        assert!(is_meta_module_name("a__b__meta_mod.f90"));
        assert!(is_meta_module_name("a__b__meta_mod.F90"));
        assert!(!is_meta_module_name("a__b__meta_mod.txt"));
        assert!(!is_meta_module_name("levels_enum_mod.f90"));
    }
}
