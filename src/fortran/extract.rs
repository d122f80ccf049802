//! Translation of parsed `field_meta_data_type(...)` constructors into
//! [`FieldDeclaration`]s.

use super::parser::{Arg, Expr};
use crate::field::{
    FieldDeclaration, NonSpatialDimensionDeclaration, VerticalDimensionDeclaration,
    FIELD_ATTRIBUTES,
};

/// Name of the derived type whose constructors declare fields
pub const FIELD_CONSTRUCTOR: &str = "field_meta_data_type";

/// A declaration and the problems found while extracting it
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedField {
    /// Line the constructor starts on
    pub line: usize,
    pub declaration: FieldDeclaration,
    pub problems: Vec<String>,
}

/// Extract a field from the arguments of a field constructor
pub fn extract_field(args: &[Arg], line: usize) -> ExtractedField {
    let mut declaration = FieldDeclaration::default();
    let mut failed: Vec<(String, String)> = Vec::new();
    let mut problems = Vec::new();

    for arg in args {
        let Some(key) = arg.keyword.as_deref().map(str::to_ascii_lowercase) else {
            problems.push(format!(
                "Positional argument {} is not allowed in {FIELD_CONSTRUCTOR}",
                arg.value
            ));
            continue;
        };
        if !FIELD_ATTRIBUTES.contains(&key.as_str()) {
            problems.push(format!("Unexpected Field Property: {key}"));
            continue;
        }

        let result = match key.as_str() {
            "vertical_dimension" => vertical_dimension(&arg.value)
                .map(|dim| declaration.vertical_dimension = Some(dim)),
            "synonyms" => pairs(&arg.value).map(|pairs| declaration.synonyms = pairs),
            "misc_meta_data" => pairs(&arg.value).map(|pairs| declaration.misc_meta_data = pairs),
            "non_spatial_dimension" => non_spatial_dimensions(&arg.value)
                .map(|dims| declaration.non_spatial_dimensions = dims),
            _ => match &arg.value {
                Expr::Array(_) => {
                    problems.push(format!("Attribute: {key} is not a valid attribute"));
                    continue;
                }
                value => value
                    .as_text()
                    .map(|text| {
                        declaration.set_scalar(&key, text);
                    })
                    .ok_or_else(|| format!("cannot read value {value}")),
            },
        };
        if let Err(error) = result {
            failed.push((key, error));
        }
    }

    for (key, error) in failed {
        problems.push(match &declaration.unique_id {
            Some(id) => format!("Attribute: {key} on field: {id} is invalid: {error}"),
            None => format!("Key: {key} is invalid: {error}"),
        });
    }

    ExtractedField {
        line,
        declaration,
        problems,
    }
}

/// `model_height_dimension(top=..., bottom=...)`,
/// `fixed_depth_dimension(level_definition=[...])` and friends
pub fn vertical_dimension(expr: &Expr) -> Result<VerticalDimensionDeclaration, String> {
    let (constructor, args) = match expr {
        Expr::Call { name, args } => (name, args.as_slice()),
        Expr::Name(name) => (name, &[][..]),
        other => return Err(format!("{other} is not a vertical dimension")),
    };

    let mut declaration = VerticalDimensionDeclaration {
        constructor: constructor.clone(),
        ..Default::default()
    };
    for arg in args {
        match arg.keyword.as_deref().map(str::to_ascii_lowercase).as_deref() {
            Some("top") => declaration.top = arg.value.as_text(),
            Some("bottom") => declaration.bottom = arg.value.as_text(),
            Some("level_definition") | None => {
                declaration.level_definition.extend(numbers(&arg.value)?)
            }
            Some(other) => return Err(format!("Unrecognised vertical dimension attribute '{other}'")),
        }
    }
    Ok(declaration)
}

fn numbers(expr: &Expr) -> Result<Vec<f64>, String> {
    match expr {
        Expr::Array(items) => items.iter().map(number).collect(),
        single => Ok(vec![number(single)?]),
    }
}

fn number(expr: &Expr) -> Result<f64, String> {
    expr.as_number()
        .ok_or_else(|| format!("{expr} is not a number"))
}

/// Synonyms and misc meta data: arrays of two-argument constructors
pub fn pairs(expr: &Expr) -> Result<Vec<(String, String)>, String> {
    let Expr::Array(items) = expr else {
        return Err(format!("{expr} is not an array"));
    };
    items
        .iter()
        .map(|item| match item {
            Expr::Call { args, .. } if args.len() == 2 => {
                let key = args[0]
                    .value
                    .as_text()
                    .ok_or_else(|| format!("cannot read key {}", args[0].value))?;
                let value = args[1]
                    .value
                    .as_text()
                    .ok_or_else(|| format!("cannot read value {}", args[1].value))?;
                Ok((key, value))
            }
            other => Err(format!("{other} is not a key/value pair")),
        })
        .collect()
}

/// An array of `non_spatial_dimension_type(...)` constructors
pub fn non_spatial_dimensions(
    expr: &Expr,
) -> Result<Vec<NonSpatialDimensionDeclaration>, String> {
    let Expr::Array(items) = expr else {
        return Err(format!("{expr} is not an array"));
    };
    items.iter().map(non_spatial_dimension).collect()
}

fn non_spatial_dimension(expr: &Expr) -> Result<NonSpatialDimensionDeclaration, String> {
    let Expr::Call { args, .. } = expr else {
        return Err(format!("{expr} is not a non-spatial dimension"));
    };

    let mut declaration = NonSpatialDimensionDeclaration::default();
    for arg in args {
        let key = arg
            .keyword
            .as_deref()
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match key.as_str() {
            "dimension_name" => declaration.name = arg.value.as_text(),
            "dimension_category" => declaration.category = arg.value.as_text(),
            "help_text" => declaration.help = arg.value.as_text(),
            "non_spatial_units" => declaration.units = arg.value.as_text(),
            "axis_definition" => declaration.axis_definition = Some(texts(&arg.value)?),
            "label_definition" => declaration.label_definition = Some(texts(&arg.value)?),
            _ => {
                return Err(format!(
                    "Unrecognised non-spatial-dimension attribute '{}'",
                    arg.keyword.as_deref().unwrap_or("positional argument")
                ))
            }
        }
    }
    Ok(declaration)
}

fn texts(expr: &Expr) -> Result<Vec<String>, String> {
    let Expr::Array(items) = expr else {
        return Err(format!("{expr} is not an array"));
    };
    items
        .iter()
        .map(|item| item.as_text().ok_or_else(|| format!("cannot read value {item}")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fortran::lexer::{tokenize, Token};
    use crate::fortran::parser::parse_expression;

    fn parse(source: &str) -> Expr {
        let tokens: Vec<Token> = tokenize(source)
            .unwrap()
            .into_iter()
            .map(|located| located.token)
            .collect();
        parse_expression(&tokens).unwrap()
    }

    fn extract(source: &str) -> ExtractedField {
        match parse(source) {
            Expr::Call { args, .. } => extract_field(&args, 1),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_scalar_attributes() {
        let field = extract(
            r#"field_meta_data_type(unique_id="a__b", units="K", function_space=W3,
                description="one " // "two", order=1)"#
                .replace('\n', " &\n")
                .as_str(),
        );
        assert!(field.problems.is_empty(), "{:?}", field.problems);
        let decl = field.declaration;
        assert_eq!(decl.unique_id.as_deref(), Some("a__b"));
        assert_eq!(decl.function_space.as_deref(), Some("W3"));
        assert_eq!(decl.description.as_deref(), Some("one two"));
        assert_eq!(decl.order.as_deref(), Some("1"));
    }

    #[test]
    fn test_unexpected_property() {
        let field = extract(r#"field_meta_data_type(unique_id="a__b", colour="blue")"#);
        assert_eq!(field.problems, vec!["Unexpected Field Property: colour"]);
    }

    #[test]
    fn test_array_on_scalar_attribute() {
        let field = extract(r#"field_meta_data_type(units=["K", "C"])"#);
        assert_eq!(field.problems, vec!["Attribute: units is not a valid attribute"]);
    }

    #[test]
    fn test_vertical_dimension() {
        let dim = vertical_dimension(&parse(
            "model_height_dimension(bottom=BOTTOM_ATMOSPHERIC_LEVEL, top=TOP_WET_LEVEL)",
        ))
        .unwrap();
        assert_eq!(dim.constructor, "model_height_dimension");
        assert_eq!(dim.top.as_deref(), Some("TOP_WET_LEVEL"));
        assert_eq!(dim.bottom.as_deref(), Some("BOTTOM_ATMOSPHERIC_LEVEL"));

        let fixed =
            vertical_dimension(&parse("fixed_height_dimension(level_definition=[1.5, 10.0])"))
                .unwrap();
        assert_eq!(fixed.level_definition, vec![1.5, 10.0]);
    }

    #[test]
    fn test_synonyms_in_declared_order() {
        let synonyms = pairs(&parse(
            r#"[field_synonym_type(STASH, "3209"), field_synonym_type(CF, "eastward_wind")]"#,
        ))
        .unwrap();
        assert_eq!(
            synonyms,
            vec![
                ("STASH".to_string(), "3209".to_string()),
                ("CF".to_string(), "eastward_wind".to_string()),
            ]
        );
    }

    #[test]
    fn test_non_spatial_dimensions() {
        let dims = non_spatial_dimensions(&parse(
            r#"[non_spatial_dimension_type(dimension_name="Test Dim", dimension_category=CATEGORICAL,
                help_text="Help", label_definition=[character(str_def) :: "a", "b"])]"#
                .replace('\n', " &\n")
                .as_str(),
        ))
        .unwrap();
        assert_eq!(dims.len(), 1);
        assert_eq!(dims[0].name.as_deref(), Some("Test Dim"));
        assert_eq!(dims[0].category.as_deref(), Some("CATEGORICAL"));
        assert_eq!(
            dims[0].label_definition,
            Some(vec!["a".to_string(), "b".to_string()])
        );
    }

    #[test]
    fn test_unrecognised_non_spatial_attribute() {
        let err = non_spatial_dimensions(&parse(
            r#"[non_spatial_dimension_type(dimension_name="x", colour="blue")]"#,
        ))
        .unwrap_err();
        assert_eq!(err, "Unrecognised non-spatial-dimension attribute 'colour'");
    }

    #[test]
    fn test_invalid_attribute_value_names_the_field() {
        let field = extract(r#"field_meta_data_type(unique_id="a__b", synonyms=STASH)"#);
        assert_eq!(field.problems.len(), 1);
        assert!(field.problems[0].starts_with("Attribute: synonyms on field: a__b is invalid"));
    }
}
