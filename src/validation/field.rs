use std::fmt;
use std::str::FromStr;

use tracing::error;

use super::{FieldStandard, ValidationIssue};
use crate::field::{
    is_standard_unique_id, FieldDeclaration, FieldDescriptor, NonSpatialDimension,
    NonSpatialDimensionDeclaration, VerticalAxis, VerticalBounds, VerticalDimension,
    VerticalDimensionDeclaration,
};
use crate::fortran::parser::parse_integer;
use crate::vocabulary::{
    DataType, DimensionCategory, FunctionSpace, Interpolation, LevelMarker, LevelSet,
    SynonymConvention, TimeStep, UnknownTerm,
};

/// Units of every vertical dimension
const VERTICAL_UNITS: &str = "m";

/// Problems collected for one field, logged as they are found
struct Issues<'a> {
    field: String,
    file_name: &'a str,
    found: Vec<ValidationIssue>,
}

impl<'a> Issues<'a> {
    fn push(&mut self, attribute: &str, message: String) {
        error!(field = %self.field, attribute, "{}", message);
        self.found
            .push(ValidationIssue::new(self.field.clone(), attribute, message));
    }

    /// A required scalar; records an issue when it is absent or blank
    fn required<'d>(
        &mut self,
        value: &'d Option<String>,
        attribute: &str,
        what: &str,
    ) -> Option<&'d str> {
        match value.as_deref().map(str::trim) {
            Some(v) if !v.is_empty() => Some(v),
            _ => {
                let message = format!("{what} is missing from a field in {}", self.file_name);
                self.push(attribute, message);
                None
            }
        }
    }

    fn term<T>(&mut self, value: Option<&str>, attribute: &str) -> Option<T>
    where
        T: FromStr<Err = UnknownTerm>,
    {
        match value?.parse() {
            Ok(term) => Some(term),
            Err(err) => {
                let err: UnknownTerm = err;
                self.push(attribute, err.to_string());
                None
            }
        }
    }
}

/// Validates declarations against the level markers and standards in force
pub struct FieldValidator {
    levels: LevelSet,
    standards: Vec<Box<dyn FieldStandard>>,
}

impl fmt::Debug for FieldValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldValidator")
            .field("levels", &self.levels)
            .field(
                "standards",
                &self.standards.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Default for FieldValidator {
    fn default() -> Self {
        Self::new(LevelSet::standard())
    }
}

impl FieldValidator {
    pub fn new(levels: LevelSet) -> Self {
        Self {
            levels,
            standards: Vec::new(),
        }
    }

    /// Also check fields that claim membership of `standard`
    pub fn with_standard(mut self, standard: impl FieldStandard + 'static) -> Self {
        self.standards.push(Box::new(standard));
        self
    }

    pub fn levels(&self) -> &LevelSet {
        &self.levels
    }

    /// Validate one declaration read from `file_name`.
    ///
    /// Every problem is logged and returned; nothing is returned half-built.
    pub fn validate(
        &self,
        decl: &FieldDeclaration,
        file_name: &str,
    ) -> Result<FieldDescriptor, Vec<ValidationIssue>> {
        let mut issues = Issues {
            field: decl.unique_id.clone().unwrap_or_default(),
            file_name,
            found: Vec::new(),
        };

        let unique_id = issues.required(&decl.unique_id, "unique_id", "A unique id");
        if let Some(id) = unique_id {
            if !is_standard_unique_id(id) {
                issues.push(
                    "unique_id",
                    format!("Unique ID {id} does not conform to the standard"),
                );
            }
        }
        let units = issues.required(&decl.units, "units", "A unit of measure");
        let function_space = issues.required(&decl.function_space, "function_space", "A function space");
        let function_space = issues.term::<FunctionSpace>(function_space, "function_space");
        let trigger = issues.required(&decl.trigger, "trigger", "Triggering syntax");
        let description = issues.required(&decl.description, "description", "A description");
        let data_type = issues.required(&decl.data_type, "data_type", "A data type");
        let data_type = issues.term::<DataType>(data_type, "data_type");
        let time_step = issues.required(&decl.time_step, "time_step", "A time step");
        let time_step = issues.term::<TimeStep>(time_step, "time_step");
        let interpolation = issues.required(
            &decl.recommended_interpolation,
            "recommended_interpolation",
            "A recommended_interpolation attribute",
        );
        let interpolation = issues.term::<Interpolation>(interpolation, "recommended_interpolation");

        let order = match decl.order.as_deref() {
            None => Some(0),
            Some(text) => parse_integer(text)
                .and_then(|v| u32::try_from(v).ok())
                .or_else(|| {
                    issues.push(
                        "order",
                        format!("Attribute 'order' must be a non-negative integer, found '{text}'"),
                    );
                    None
                }),
        };
        let packing = match decl.packing.as_deref() {
            None => Some(0),
            Some(text) => parse_integer(text)
                .and_then(|v| i32::try_from(v).ok())
                .or_else(|| {
                    issues.push(
                        "packing",
                        format!("Attribute 'packing' must be an integer, found '{text}'"),
                    );
                    None
                }),
        };

        let standard_name = non_blank(&decl.standard_name);
        let long_name = non_blank(&decl.long_name);
        if standard_name.is_none() && long_name.is_none() {
            let message = format!(
                "{} in {} has neither a standard name or long name",
                issues.field, file_name
            );
            issues.push("standard_name", message);
        }

        let vertical_dimension = decl
            .vertical_dimension
            .as_ref()
            .and_then(|dim| self.vertical_dimension(dim, &mut issues));

        let mut synonyms = Vec::with_capacity(decl.synonyms.len());
        for (convention, value) in &decl.synonyms {
            if let Some(convention) = issues.term::<SynonymConvention>(Some(convention), "synonyms") {
                synonyms.push((convention, value.clone()));
            }
        }

        let non_spatial_dimensions: Vec<NonSpatialDimension> = decl
            .non_spatial_dimensions
            .iter()
            .filter_map(|dim| non_spatial_dimension(dim, &mut issues))
            .collect();

        let (
            Some(unique_id),
            Some(units),
            Some(function_space),
            Some(trigger),
            Some(description),
            Some(data_type),
            Some(time_step),
            Some(recommended_interpolation),
            Some(order),
            Some(packing),
        ) = (
            unique_id,
            units,
            function_space,
            trigger,
            description,
            data_type,
            time_step,
            interpolation,
            order,
            packing,
        )
        else {
            return Err(issues.found);
        };
        if !issues.found.is_empty() {
            return Err(issues.found);
        }

        let vertical_bounds = match &vertical_dimension {
            None => Some(VerticalBounds::default_atmospheric()),
            Some(dim) => dim.bounds(),
        };

        let descriptor = FieldDescriptor {
            unique_id: unique_id.to_string(),
            units: units.to_string(),
            function_space,
            order,
            io_driver: decl.io_driver.clone().unwrap_or_default(),
            trigger: trigger.to_string(),
            description: description.to_string(),
            data_type,
            time_step,
            recommended_interpolation,
            packing,
            standard_name,
            long_name,
            vertical_dimension,
            vertical_bounds,
            synonyms,
            misc_meta_data: decl.misc_meta_data.clone(),
            non_spatial_dimensions,
        };

        for standard in self.standards.iter().filter(|s| s.applies_to(&descriptor)) {
            for issue in standard.check(&descriptor) {
                error!(field = %issue.field, standard = standard.name(), "{}", issue.message);
                issues.found.push(issue);
            }
        }
        if issues.found.is_empty() {
            Ok(descriptor)
        } else {
            Err(issues.found)
        }
    }

    fn vertical_dimension(
        &self,
        decl: &VerticalDimensionDeclaration,
        issues: &mut Issues<'_>,
    ) -> Option<VerticalDimension> {
        let Some(axis) = VerticalAxis::from_constructor(&decl.constructor) else {
            issues.push(
                "vertical_dimension",
                format!(
                    "Attribute 'positive' has been declared incorrectly: '{}' is neither a height nor a depth dimension",
                    decl.constructor
                ),
            );
            return None;
        };

        let mut dimension = VerticalDimension {
            axis,
            standard_name: axis.standard_name().to_string(),
            units: VERTICAL_UNITS.to_string(),
            top: None,
            bottom: None,
            level_definition: None,
            positive: axis.positive(),
        };

        if axis.is_model() {
            dimension.top = self.level(decl.top.as_deref(), "Top", issues);
            dimension.bottom = self.level(decl.bottom.as_deref(), "Bottom", issues);
            if dimension.top.is_none() || dimension.bottom.is_none() {
                return None;
            }
        } else if !decl.level_definition.is_empty() {
            dimension.level_definition = Some(decl.level_definition.clone());
        }
        Some(dimension)
    }

    fn level(
        &self,
        name: Option<&str>,
        which: &str,
        issues: &mut Issues<'_>,
    ) -> Option<LevelMarker> {
        let Some(name) = name else {
            issues.push(
                "vertical_dimension",
                format!("{which} model level not declared"),
            );
            return None;
        };
        match self.levels.resolve(name) {
            Ok(marker) => Some(marker),
            Err(err) => {
                issues.push("vertical_dimension", err.to_string());
                None
            }
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn non_spatial_dimension(
    decl: &NonSpatialDimensionDeclaration,
    issues: &mut Issues<'_>,
) -> Option<NonSpatialDimension> {
    let Some(name) = non_blank(&decl.name) else {
        let message = format!(
            "Non-spatial dimension in {} requires 'dimension_name' attribute",
            issues.field
        );
        issues.push("non_spatial_dimension", message);
        return None;
    };
    let category = match decl.category.as_deref() {
        None => {
            let message = format!(
                "Non-spatial dimension '{name}' in {} requires 'dimension_category' attribute",
                issues.field
            );
            issues.push("non_spatial_dimension", message);
            None
        }
        Some(category) => issues.term::<DimensionCategory>(Some(category), "non_spatial_dimension"),
    }?;

    Some(NonSpatialDimension {
        name: name.to_lowercase(),
        category,
        help: non_blank(&decl.help),
        units: non_blank(&decl.units),
        axis_definition: decl.axis_definition.clone(),
        label_definition: decl.label_definition.clone(),
    })
}

/// Validate with the built-in level markers and no external standards
pub fn validate_field(
    decl: &FieldDeclaration,
    file_name: &str,
) -> Result<FieldDescriptor, Vec<ValidationIssue>> {
    FieldValidator::default().validate(decl, file_name)
}
