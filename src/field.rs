//! Field meta data model.
//!
//! [`FieldDeclaration`] is what a meta module (or a caller building a
//! registry by hand) declares: every attribute optional and still in its
//! source spelling. [`FieldDescriptor`] is the validated result, with closed
//! vocabularies resolved and defaults applied once.

use serde::{Deserialize, Serialize};

use crate::vocabulary::{
    DataType, DimensionCategory, FunctionSpace, Interpolation, LevelMarker, Positive,
    SynonymConvention, TimeStep,
};

/// Kind of vertical axis a field is defined on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerticalAxis {
    ModelHeight,
    ModelDepth,
    FixedHeight,
    FixedDepth,
}

impl VerticalAxis {
    /// Classify a dimension constructor such as `model_height_dimension`
    pub fn from_constructor(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        let model = lower.contains("model");
        if lower.contains("height") {
            Some(if model {
                VerticalAxis::ModelHeight
            } else {
                VerticalAxis::FixedHeight
            })
        } else if lower.contains("depth") {
            Some(if model {
                VerticalAxis::ModelDepth
            } else {
                VerticalAxis::FixedDepth
            })
        } else {
            None
        }
    }

    /// Model axes are bounded by level markers, fixed axes by explicit levels
    pub fn is_model(&self) -> bool {
        matches!(self, VerticalAxis::ModelHeight | VerticalAxis::ModelDepth)
    }

    pub fn positive(&self) -> Positive {
        match self {
            VerticalAxis::ModelHeight | VerticalAxis::FixedHeight => Positive::Up,
            VerticalAxis::ModelDepth | VerticalAxis::FixedDepth => Positive::Down,
        }
    }

    pub fn standard_name(&self) -> &'static str {
        match self {
            VerticalAxis::ModelHeight | VerticalAxis::FixedHeight => "height",
            VerticalAxis::ModelDepth | VerticalAxis::FixedDepth => "depth",
        }
    }
}

/// Top and bottom level markers bounding a field vertically
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerticalBounds {
    pub top: LevelMarker,
    pub bottom: LevelMarker,
}

impl VerticalBounds {
    /// Bounds assumed for fields that declare no vertical dimension
    pub fn default_atmospheric() -> Self {
        Self {
            top: LevelMarker::top_atmospheric(),
            bottom: LevelMarker::bottom_atmospheric(),
        }
    }
}

/// Vertical dimension as declared, before validation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VerticalDimensionDeclaration {
    /// Constructor used, e.g. `model_height_dimension`
    pub constructor: String,
    pub top: Option<String>,
    pub bottom: Option<String>,
    pub level_definition: Vec<f64>,
}

/// Validated vertical dimension of a field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerticalDimension {
    pub axis: VerticalAxis,
    pub standard_name: String,
    pub units: String,
    #[serde(rename = "top_arg", default, skip_serializing_if = "Option::is_none")]
    pub top: Option<LevelMarker>,
    #[serde(rename = "bottom_arg", default, skip_serializing_if = "Option::is_none")]
    pub bottom: Option<LevelMarker>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level_definition: Option<Vec<f64>>,
    pub positive: Positive,
}

impl VerticalDimension {
    /// Level-marker bounds, present for model axes only
    pub fn bounds(&self) -> Option<VerticalBounds> {
        match (&self.top, &self.bottom) {
            (Some(top), Some(bottom)) => Some(VerticalBounds {
                top: top.clone(),
                bottom: bottom.clone(),
            }),
            _ => None,
        }
    }
}

/// A dimension of a field that is not a spatial axis (tiles, bands, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NonSpatialDimension {
    pub name: String,
    #[serde(rename = "type")]
    pub category: DimensionCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    #[serde(rename = "unit", default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub axis_definition: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_definition: Option<Vec<String>>,
}

impl NonSpatialDimension {
    /// Dimensions without a definition must be configured by the user
    pub fn has_definition(&self) -> bool {
        self.axis_definition.is_some() || self.label_definition.is_some()
    }
}

/// Non-spatial dimension as declared, before validation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NonSpatialDimensionDeclaration {
    pub name: Option<String>,
    pub category: Option<String>,
    pub help: Option<String>,
    pub units: Option<String>,
    pub axis_definition: Option<Vec<String>>,
    pub label_definition: Option<Vec<String>>,
}

/// Every attribute a field declaration may carry
pub const FIELD_ATTRIBUTES: &[&str] = &[
    "unique_id",
    "units",
    "function_space",
    "order",
    "io_driver",
    "trigger",
    "description",
    "data_type",
    "time_step",
    "recommended_interpolation",
    "packing",
    "standard_name",
    "long_name",
    "vertical_dimension",
    "synonyms",
    "misc_meta_data",
    "non_spatial_dimension",
];

/// A field as declared. Nothing is checked until it is validated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldDeclaration {
    pub unique_id: Option<String>,
    pub units: Option<String>,
    pub function_space: Option<String>,
    pub order: Option<String>,
    pub io_driver: Option<String>,
    pub trigger: Option<String>,
    pub description: Option<String>,
    pub data_type: Option<String>,
    pub time_step: Option<String>,
    pub recommended_interpolation: Option<String>,
    pub packing: Option<String>,
    pub standard_name: Option<String>,
    pub long_name: Option<String>,
    pub vertical_dimension: Option<VerticalDimensionDeclaration>,
    pub synonyms: Vec<(String, String)>,
    pub misc_meta_data: Vec<(String, String)>,
    pub non_spatial_dimensions: Vec<NonSpatialDimensionDeclaration>,
}

impl FieldDeclaration {
    pub fn new(unique_id: impl Into<String>) -> Self {
        Self {
            unique_id: Some(unique_id.into()),
            ..Default::default()
        }
    }

    /// Set a scalar attribute by name. Returns `false` for names that are not
    /// scalar field attributes.
    pub fn set_scalar(&mut self, key: &str, value: impl Into<String>) -> bool {
        let slot = match key {
            "unique_id" => &mut self.unique_id,
            "units" => &mut self.units,
            "function_space" => &mut self.function_space,
            "order" => &mut self.order,
            "io_driver" => &mut self.io_driver,
            "trigger" => &mut self.trigger,
            "description" => &mut self.description,
            "data_type" => &mut self.data_type,
            "time_step" => &mut self.time_step,
            "recommended_interpolation" => &mut self.recommended_interpolation,
            "packing" => &mut self.packing,
            "standard_name" => &mut self.standard_name,
            "long_name" => &mut self.long_name,
            _ => return false,
        };
        *slot = Some(value.into());
        true
    }

    /// Chaining form of [`set_scalar`](Self::set_scalar) for hand-written
    /// declarations; unknown keys are ignored.
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.set_scalar(key, value);
        self
    }

    pub fn with_vertical_dimension(mut self, dimension: VerticalDimensionDeclaration) -> Self {
        self.vertical_dimension = Some(dimension);
        self
    }

    pub fn with_synonym(mut self, convention: impl Into<String>, value: impl Into<String>) -> Self {
        self.synonyms.push((convention.into(), value.into()));
        self
    }

    pub fn with_misc(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.misc_meta_data.push((key.into(), value.into()));
        self
    }
}

/// A validated, immutable field descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct FieldDescriptor {
    pub unique_id: String,
    pub units: String,
    pub function_space: FunctionSpace,
    pub order: u32,
    pub io_driver: String,
    pub trigger: String,
    pub description: String,
    pub data_type: DataType,
    pub time_step: TimeStep,
    pub recommended_interpolation: Interpolation,
    pub packing: i32,
    pub standard_name: Option<String>,
    pub long_name: Option<String>,
    pub vertical_dimension: Option<VerticalDimension>,
    /// Effective vertical bounds, with the atmospheric default applied
    pub vertical_bounds: Option<VerticalBounds>,
    pub synonyms: Vec<(SynonymConvention, String)>,
    pub misc_meta_data: Vec<(String, String)>,
    #[serde(rename = "non_spatial_dimension")]
    pub non_spatial_dimensions: Vec<NonSpatialDimension>,
}

impl FieldDescriptor {
    /// Part of the unique id after the first `__`
    pub fn item_name(&self) -> &str {
        item_name(&self.unique_id)
    }

    /// Human readable title derived from the item name
    pub fn item_title(&self) -> String {
        title_case(self.item_name())
    }

    /// Synonym values under one naming convention, in declared order
    pub fn synonyms_for(&self, convention: SynonymConvention) -> Vec<&str> {
        self.synonyms
            .iter()
            .filter(|(c, _)| *c == convention)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn has_synonym_in(&self, convention: SynonymConvention) -> bool {
        self.synonyms.iter().any(|(c, _)| *c == convention)
    }
}

/// Part of a `prefix__item` identifier after the first `__`
pub fn item_name(unique_id: &str) -> &str {
    match unique_id.split_once("__") {
        Some((_, item)) => item,
        None => unique_id,
    }
}

/// Whether an identifier follows the `prefix__item` naming standard
pub fn is_standard_unique_id(unique_id: &str) -> bool {
    let valid_part =
        |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    match unique_id.split_once("__") {
        Some((prefix, item)) => valid_part(prefix) && valid_part(item),
        None => false,
    }
}

/// `snake_case_name` -> `Snake Case Name`
pub fn title_case(name: &str) -> String {
    name.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(|c| c.to_lowercase()))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
