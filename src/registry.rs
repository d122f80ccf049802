//! Field meta data registries.
//!
//! A [`MetaRegistry`] holds the validated descriptors of one group of a
//! section of science (`section__group`). Registries are collected into
//! [`Section`]s and the whole document, [`MetaData`], which also carries the
//! level markers in force and the catalogue of non-spatial dimensions.
//! Everything is immutable once built; readers only get shared references.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, error};

use crate::error::{MetaError, Result};
use crate::field::{title_case, FieldDeclaration, FieldDescriptor, NonSpatialDimension};
use crate::validation::{split_qualified, FieldValidator, ValidationIssue};
use crate::vocabulary::{LevelMarker, LevelSet};

/// The validated fields of one `section__group`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaRegistry {
    /// `section__group`
    name: String,
    /// Section of science
    section: String,
    /// Group within the section
    group: String,
    /// Human readable group title
    title: String,
    /// Meta module the registry was read from, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    file_name: Option<String>,
    /// Descriptors keyed by unique id, in declaration order
    fields: IndexMap<String, FieldDescriptor>,
}

impl MetaRegistry {
    /// Create an empty registry. The name must take the form
    /// `section__group`.
    pub fn new(name: &str) -> Result<Self> {
        let (section, group) = split_qualified(name, "").ok_or_else(|| MetaError::Naming {
            file: name.to_string(),
            message: "registry names take the form <section>__<group>".to_string(),
        })?;
        Ok(Self {
            name: name.to_string(),
            section: section.to_string(),
            group: group.to_string(),
            title: title_case(group),
            file_name: None,
            fields: IndexMap::new(),
        })
    }

    /// Start building a registry from declarations
    pub fn builder(name: impl Into<String>) -> MetaRegistryBuilder {
        MetaRegistryBuilder {
            name: name.into(),
            file_name: None,
            validator: FieldValidator::default(),
            declarations: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn section(&self) -> &str {
        &self.section
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// Descriptor for `unique_id`, or `NotFound`
    pub fn lookup(&self, unique_id: &str) -> Result<&FieldDescriptor> {
        self.fields
            .get(unique_id)
            .ok_or_else(|| MetaError::not_found("Field", unique_id))
    }

    pub fn get(&self, unique_id: &str) -> Option<&FieldDescriptor> {
        self.fields.get(unique_id)
    }

    pub fn contains(&self, unique_id: &str) -> bool {
        self.fields.contains_key(unique_id)
    }

    /// Descriptors in declaration order
    pub fn fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.values()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Whether any field of the group declares a vertical dimension
    pub fn has_vertical_dimensions(&self) -> bool {
        self.fields().any(|f| f.vertical_dimension.is_some())
    }

    /// Level markers bounding the group's declared vertical dimensions
    pub fn model_levels(&self) -> BTreeSet<&LevelMarker> {
        self.fields()
            .filter_map(|f| f.vertical_dimension.as_ref())
            .flat_map(|dim| dim.top.iter().chain(dim.bottom.iter()))
            .collect()
    }

    pub(crate) fn set_file_name(&mut self, file_name: impl Into<String>) {
        self.file_name = Some(file_name.into());
    }

    /// Add a validated descriptor; a unique id may only appear once
    pub(crate) fn insert(&mut self, field: FieldDescriptor) -> Result<()> {
        if self.fields.contains_key(&field.unique_id) {
            error!(
                "Field with unique ID: {} is already in Group: {}",
                field.unique_id, self.name
            );
            return Err(MetaError::DuplicateField {
                unique_id: field.unique_id,
                group: self.name.clone(),
            });
        }
        self.fields.insert(field.unique_id.clone(), field);
        Ok(())
    }
}

/// Builds a [`MetaRegistry`] from field declarations
#[derive(Debug)]
pub struct MetaRegistryBuilder {
    name: String,
    file_name: Option<String>,
    validator: FieldValidator,
    declarations: Vec<FieldDeclaration>,
}

impl MetaRegistryBuilder {
    /// Record the source file; used in validation messages
    pub fn file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// Validate level markers against `levels` instead of the built-in set
    pub fn levels(mut self, levels: LevelSet) -> Self {
        self.validator = FieldValidator::new(levels);
        self
    }

    pub fn validator(mut self, validator: FieldValidator) -> Self {
        self.validator = validator;
        self
    }

    pub fn field(mut self, declaration: FieldDeclaration) -> Self {
        self.declarations.push(declaration);
        self
    }

    pub fn fields(mut self, declarations: impl IntoIterator<Item = FieldDeclaration>) -> Self {
        self.declarations.extend(declarations);
        self
    }

    /// Validate every declaration and build the registry.
    ///
    /// All problems are logged; the first is returned as a validation error.
    pub fn build(self) -> Result<MetaRegistry> {
        let mut registry = MetaRegistry::new(&self.name)?;
        let source = self.file_name.clone().unwrap_or_else(|| self.name.clone());

        let mut descriptors = Vec::with_capacity(self.declarations.len());
        let mut first_issue: Option<ValidationIssue> = None;
        for declaration in &self.declarations {
            match self.validator.validate(declaration, &source) {
                Ok(descriptor) => descriptors.push(descriptor),
                Err(issues) => {
                    let issue = issues.into_iter().next().unwrap_or_else(|| {
                        ValidationIssue::new(
                            declaration.unique_id.clone().unwrap_or_default(),
                            "field",
                            format!("Invalid field in {source}"),
                        )
                    });
                    first_issue.get_or_insert(issue);
                }
            }
        }
        if let Some(issue) = first_issue {
            return Err(issue.into());
        }

        for descriptor in descriptors {
            registry.insert(descriptor)?;
        }
        if let Some(file_name) = self.file_name {
            registry.set_file_name(file_name);
        }
        debug!("Built registry {} with {} fields", registry.name, registry.len());
        Ok(registry)
    }
}

/// A section of science and its groups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    name: String,
    title: String,
    groups: IndexMap<String, MetaRegistry>,
}

impl Section {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            title: title_case(name),
            groups: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn group(&self, name: &str) -> Option<&MetaRegistry> {
        self.groups.get(name)
    }

    pub fn groups(&self) -> impl Iterator<Item = &MetaRegistry> {
        self.groups.values()
    }
}

/// Where a non-spatial dimension is used
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRef {
    pub section: String,
    pub group: String,
    pub unique_id: String,
}

/// A non-spatial dimension and every field that uses it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionUsage {
    #[serde(flatten)]
    pub dimension: NonSpatialDimension,
    pub fields: Vec<FieldRef>,
}

/// All meta data read in one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaData {
    sections: IndexMap<String, Section>,
    standard_level_markers: LevelSet,
    non_spatial_dimensions: IndexMap<String, DimensionUsage>,
}

impl Default for MetaData {
    fn default() -> Self {
        Self::new(LevelSet::standard())
    }
}

impl MetaData {
    pub fn new(standard_level_markers: LevelSet) -> Self {
        Self {
            sections: IndexMap::new(),
            standard_level_markers,
            non_spatial_dimensions: IndexMap::new(),
        }
    }

    /// Add a registry under its section.
    ///
    /// Fails if the group is already present or if one of its fields defines
    /// a non-spatial dimension differently from an earlier use. Nothing is
    /// added on failure.
    pub fn add_registry(&mut self, registry: MetaRegistry) -> Result<()> {
        if self.registry(registry.name()).is_ok() {
            return Err(MetaError::Naming {
                file: registry.file_name().unwrap_or(registry.name()).to_string(),
                message: format!(
                    "Group {} is already in Section {}",
                    registry.group(),
                    registry.section()
                ),
            });
        }

        let mut pending: IndexMap<&str, &NonSpatialDimension> = IndexMap::new();
        for field in registry.fields() {
            for dimension in &field.non_spatial_dimensions {
                let previous = self
                    .non_spatial_dimensions
                    .get(&dimension.name)
                    .map(|usage| &usage.dimension)
                    .or_else(|| pending.get(dimension.name.as_str()).copied());
                match previous {
                    Some(previous) if previous != dimension => {
                        error!(
                            "Non-spatial dimension '{}' for field '{}' does not match previous dimension '{}'",
                            dimension.name, field.unique_id, previous.name
                        );
                        return Err(MetaError::DimensionMismatch {
                            dimension: dimension.name.clone(),
                            field: field.unique_id.clone(),
                        });
                    }
                    Some(_) => {}
                    None => {
                        pending.insert(&dimension.name, dimension);
                    }
                }
            }
        }

        for field in registry.fields() {
            for dimension in &field.non_spatial_dimensions {
                let usage = self
                    .non_spatial_dimensions
                    .entry(dimension.name.clone())
                    .or_insert_with(|| DimensionUsage {
                        dimension: dimension.clone(),
                        fields: Vec::new(),
                    });
                let field_ref = FieldRef {
                    section: registry.section().to_string(),
                    group: registry.group().to_string(),
                    unique_id: field.unique_id.clone(),
                };
                if !usage.fields.contains(&field_ref) {
                    usage.fields.push(field_ref);
                }
            }
        }

        let section = registry.section().to_string();
        self.sections
            .entry(section.clone())
            .or_insert_with(|| Section::new(&section))
            .groups
            .insert(registry.group().to_string(), registry);
        Ok(())
    }

    /// Registry called `section__group`, or `NotFound`
    pub fn registry(&self, name: &str) -> Result<&MetaRegistry> {
        split_qualified(name, "")
            .and_then(|(section, group)| self.sections.get(section)?.group(group))
            .ok_or_else(|| MetaError::not_found("Registry", name))
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.get(name)
    }

    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.values()
    }

    /// Every registry, section by section
    pub fn registries(&self) -> impl Iterator<Item = &MetaRegistry> {
        self.sections().flat_map(Section::groups)
    }

    /// Every registry holding a field with this unique id
    pub fn find_field(&self, unique_id: &str) -> Vec<(&MetaRegistry, &FieldDescriptor)> {
        self.registries()
            .filter_map(|registry| registry.get(unique_id).map(|field| (registry, field)))
            .collect()
    }

    pub fn field_count(&self) -> usize {
        self.registries().map(MetaRegistry::len).sum()
    }

    pub fn standard_level_markers(&self) -> &LevelSet {
        &self.standard_level_markers
    }

    pub fn non_spatial_dimensions(&self) -> impl Iterator<Item = &DimensionUsage> {
        self.non_spatial_dimensions.values()
    }

    pub fn non_spatial_dimension(&self, name: &str) -> Option<&DimensionUsage> {
        self.non_spatial_dimensions.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::NonSpatialDimensionDeclaration;

    fn declaration(id: &str) -> FieldDeclaration {
        FieldDeclaration::new(id)
            .with("units", "K")
            .with("function_space", "Wtheta")
            .with("trigger", "__checksum: true;")
            .with("description", "Temperature")
            .with("data_type", "REAL_TYPE")
            .with("time_step", "STANDARD_TIMESTEP")
            .with("recommended_interpolation", "BILINEAR")
            .with("long_name", "air temperature")
    }

    fn with_dimension(id: &str, help: &str) -> FieldDeclaration {
        let mut decl = declaration(id);
        decl.non_spatial_dimensions.push(NonSpatialDimensionDeclaration {
            name: Some("Tiles".to_string()),
            category: Some("CATEGORICAL".to_string()),
            help: Some(help.to_string()),
            ..Default::default()
        });
        decl
    }

    #[test]
    fn test_builder_and_lookup() {
        let registry = MetaRegistry::builder("physics__radiation")
            .field(declaration("radiation__sw_heating"))
            .field(declaration("radiation__lw_heating"))
            .build()
            .unwrap();
        assert_eq!(registry.section(), "physics");
        assert_eq!(registry.group(), "radiation");
        assert_eq!(registry.title(), "Radiation");
        assert_eq!(registry.len(), 2);
        let ids: Vec<&str> = registry.fields().map(|f| f.unique_id.as_str()).collect();
        assert_eq!(ids, vec!["radiation__sw_heating", "radiation__lw_heating"]);
        assert!(registry.lookup("radiation__lw_heating").is_ok());
    }

    #[test]
    fn test_lookup_unknown_id() {
        let registry = MetaRegistry::builder("physics__radiation")
            .field(declaration("radiation__sw_heating"))
            .build()
            .unwrap();
        let err = registry.lookup("radiation__nothing").unwrap_err();
        assert!(matches!(err, MetaError::NotFound { kind: "Field", .. }));
    }

    #[test]
    fn test_duplicate_unique_id() {
        let err = MetaRegistry::builder("physics__radiation")
            .field(declaration("radiation__sw_heating"))
            .field(declaration("radiation__sw_heating"))
            .build()
            .unwrap_err();
        assert!(matches!(err, MetaError::DuplicateField { .. }));
    }

    #[test]
    fn test_missing_attribute_is_a_validation_error() {
        let mut decl = declaration("radiation__sw_heating");
        decl.function_space = None;
        let err = MetaRegistry::builder("physics__radiation")
            .field(decl)
            .build()
            .unwrap_err();
        match err {
            MetaError::Validation { field, attribute, .. } => {
                assert_eq!(field, "radiation__sw_heating");
                assert_eq!(attribute, "function_space");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_registry_name_must_be_qualified() {
        assert!(MetaRegistry::new("radiation").is_err());
        assert!(MetaRegistry::new("physics__radiation").is_ok());
    }

    #[test]
    fn test_meta_data_registry_lookup() {
        let mut meta = MetaData::default();
        meta.add_registry(MetaRegistry::new("physics__radiation").unwrap())
            .unwrap();
        assert!(meta.registry("physics__radiation").is_ok());
        assert!(matches!(
            meta.registry("physics__convection"),
            Err(MetaError::NotFound { kind: "Registry", .. })
        ));
        assert!(meta
            .add_registry(MetaRegistry::new("physics__radiation").unwrap())
            .is_err());
    }

    #[test]
    fn test_non_spatial_dimension_usage_is_recorded() {
        let mut meta = MetaData::default();
        let first = MetaRegistry::builder("land__surface")
            .field(with_dimension("surface__a", "Surface tiles"))
            .build()
            .unwrap();
        let second = MetaRegistry::builder("land__soil")
            .field(with_dimension("soil__b", "Surface tiles"))
            .build()
            .unwrap();
        meta.add_registry(first).unwrap();
        meta.add_registry(second).unwrap();

        let usage = meta.non_spatial_dimension("tiles").unwrap();
        assert_eq!(usage.fields.len(), 2);
        assert_eq!(usage.fields[1].unique_id, "soil__b");
        assert_eq!(usage.fields[1].group, "soil");
    }

    #[test]
    fn test_repeated_dimension_is_recorded_once_per_field() {
        let mut decl = with_dimension("surface__a", "Surface tiles");
        let repeated = decl.non_spatial_dimensions[0].clone();
        decl.non_spatial_dimensions.push(repeated);
        let registry = MetaRegistry::builder("land__surface")
            .field(decl)
            .build()
            .unwrap();

        let mut meta = MetaData::default();
        meta.add_registry(registry).unwrap();
        let usage = meta.non_spatial_dimension("tiles").unwrap();
        assert_eq!(usage.fields.len(), 1);
        assert_eq!(usage.fields[0].unique_id, "surface__a");
    }

    #[test]
    fn test_non_spatial_dimension_mismatch() {
        let mut meta = MetaData::default();
        let first = MetaRegistry::builder("land__surface")
            .field(with_dimension("surface__a", "Surface tiles"))
            .build()
            .unwrap();
        let second = MetaRegistry::builder("land__soil")
            .field(with_dimension("soil__b", "Something else"))
            .build()
            .unwrap();
        meta.add_registry(first).unwrap();
        let err = meta.add_registry(second).unwrap_err();
        assert!(matches!(err, MetaError::DimensionMismatch { .. }));
        assert!(meta.registry("land__soil").is_err());
        assert_eq!(meta.non_spatial_dimension("tiles").unwrap().fields.len(), 1);
    }
}
