//! Rose metadata (`rose-meta.conf`) generation.
//!
//! Every field becomes a boolean switch under `[field_config:section:group]`
//! with its properties as help text. Output stream, vertical dimension and
//! non-spatial dimension blocks follow.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::Result;
use crate::field::{title_case, FieldDescriptor, VerticalDimension};
use crate::registry::{DimensionUsage, MetaData, MetaRegistry, Section};
use crate::vocabulary::LevelSet;

const DESCRIPTION_WIDTH: usize = 100;
const DESCRIPTION_INDENT: &str = "\n           ";

/// Render the rose metadata for `meta_data`
pub fn create_rose_meta(meta_data: &MetaData) -> String {
    let mut out = String::from("\n[field_config]\ntitle=LFRic Field Configuration\n");

    for section in meta_data.sections() {
        section_meta(&mut out, section);
    }
    output_stream_meta(&mut out, meta_data);
    vertical_dimension_meta(&mut out, meta_data.standard_level_markers());
    non_spatial_dimension_meta(&mut out, meta_data);
    out
}

/// Write `directory/meta/<file_name>.conf`
pub fn write_rose_meta(meta_data: &MetaData, directory: &Path, file_name: &str) -> Result<PathBuf> {
    info!("Creating {}.conf", file_name);
    let meta_dir = directory.join("meta");
    fs::create_dir_all(&meta_dir)?;
    let path = meta_dir.join(format!("{file_name}.conf"));
    fs::write(&path, create_rose_meta(meta_data))?;
    Ok(path)
}

fn section_meta(out: &mut String, section: &Section) {
    out.push_str(&format!(
        "\n[field_config:{}]\ntitle={}\n",
        section.name(),
        section.title()
    ));
    for group in section.groups() {
        group_meta(out, section, group);
    }
}

fn group_meta(out: &mut String, section: &Section, group: &MetaRegistry) {
    let key = format!("field_config:{}:{}", section.name(), group.group());
    out.push_str(&format!("\n[{key}]\ntitle={}\n", group.title()));

    if group.has_vertical_dimensions() {
        let levels: Vec<&str> = group.model_levels().into_iter().map(|l| l.as_str()).collect();
        out.push_str(&format!(
            "\n[{key}=model_levels_for_group]\n\
             title=Model Levels used by this group\n\
             description=Vertical dimensions must define these levels to be valid\n\
             values={}\n\
             sort-key=01\n\
             compulsory=true\n",
            levels.join(", ")
        ));
        out.push_str(&format!(
            "\n[{key}=vertical_dimension_for_group]\n\
             title=Vertical dimension used by this group\n\
             description=If you have edited the vertical dimensions please restart the GUI\n\
             \x20           to pick up the changes to the rose-app.conf file\n\
             widget[rose-config-edit]=vertical_dimension_choice.VertDimWidget\n\
             sort-key=02\n\
             compulsory=true\n"
        ));
    }

    for field in group.fields() {
        field_meta(out, &key, field);
    }
}

fn field_meta(out: &mut String, key: &str, field: &FieldDescriptor) {
    let id = &field.unique_id;
    let title = field.item_title();
    out.push_str(&format!(
        "\n[{key}={id}]\n\
         type=boolean\n\
         title=Enable {title}\n\
         trigger={key}={id}{}\n\
         help=Unit of Measure: {}\n\
         \x20   =Function Space: {}\n\
         \x20   =Data type: {}\n\
         \x20   =Time step: {}\n\
         \x20   =Interpolation: {}\n",
        field.trigger,
        field.units,
        field.function_space,
        field.data_type,
        field.time_step,
        field.recommended_interpolation,
    ));

    if let Some(dimension) = &field.vertical_dimension {
        out.push_str("    =vertical_dimension:\n");
        for (name, value) in vertical_dimension_help(dimension) {
            out.push_str(&format!("       ={name}: {value}\n"));
        }
    }

    if !field.synonyms.is_empty() {
        out.push_str("    =Synonyms:\n");
        for (convention, value) in &field.synonyms {
            out.push_str(&format!("    =    {convention}: {value}\n"));
        }
    }

    if !field.non_spatial_dimensions.is_empty() {
        out.push_str("    =Required non-spatial dimensions:\n");
        for dimension in &field.non_spatial_dimensions {
            out.push_str(&format!("    =    {}\n", dimension.name));
        }
    }

    out.push_str(&format!(
        "description={}\n\
         \x20          =For more information on {title}, see the help text\n",
        wrap(&field.description, DESCRIPTION_WIDTH).join(DESCRIPTION_INDENT)
    ));

    out.push_str(&format!(
        "\n[{key}={id}__checksum]\ntype=boolean\ntitle=Enable Checksum for {title}\n"
    ));
}

fn vertical_dimension_help(dimension: &VerticalDimension) -> Vec<(&'static str, String)> {
    let mut help = vec![
        ("standard_name", dimension.standard_name.clone()),
        ("units", dimension.units.clone()),
    ];
    if let Some(top) = &dimension.top {
        help.push(("top_level", top.to_string()));
    }
    if let Some(bottom) = &dimension.bottom {
        help.push(("bottom_level", bottom.to_string()));
    }
    if let Some(levels) = &dimension.level_definition {
        let levels: Vec<String> = levels.iter().map(|l| format!("{l:?}")).collect();
        help.push(("level_definition", format!("[{}]", levels.join(", "))));
    }
    help.push(("positive", dimension.positive.to_string()));
    help
}

fn output_stream_meta(out: &mut String, meta_data: &MetaData) {
    let mut values = Vec::new();
    let mut titles = Vec::new();
    for section in meta_data.sections() {
        for group in section.groups() {
            for field in group.fields() {
                values.push(field.unique_id.as_str());
                titles.push(format!(
                    "{}: {}: {}",
                    section.title(),
                    group.title(),
                    field.item_title()
                ));
            }
        }
    }

    out.push_str(&format!(
        "\n[output_stream]\n\
         duplicate=true\n\
         macro=add_section.AddField, add_section.AddStream\n\
         title=Output Streams\n\
         \n\
         [output_stream=name]\n\
         type=character\n\
         \n\
         [output_stream=timestep]\n\
         type=character\n\
         \n\
         [output_stream:field]\n\
         duplicate=true\n\
         macro=add_section.AddField\n\
         title=Fields\n\
         \n\
         [output_stream:field=id]\n\
         values={}\n\
         value-titles=\"{}\"\n\
         \n\
         [output_stream:field=temporal]\n\
         values=instant,average,accumulate,minimum,maximum,once\n",
        values.join(", "),
        titles.join("\", \"")
    ));
}

const VERTICAL_DIMENSION_META: &str = "
[vertical_dimension]
duplicate=true
title=Vertical Dimension

[vertical_dimension=name]
title=Name
description=Name of the vertical dimension
help=The name used to identify this vertical dimension when associating a field
     with it in Rose
type=character
compulsory=true
fail-if=len(this) == 0 # Name must be specified
sort-key=01

[vertical_dimension=positive]
title=Positive
description=The positive direction
help=The positive direction of the vertical axis, either up or down
values=up, down
compulsory=true
sort-key=02

[vertical_dimension=units]
title=Units
description=Unit of measure
help=The unit of measure for this vertical axis is restricted to be in metres
values=m
compulsory=true
sort-key=03

[vertical_dimension=level_definition]
title=Level boundaries
description=Boundaries of levels in ascending order
help=Positive numbers defining the edges of each level in the vertical
     dimension. The boundaries should be entered in ascending order
length=:
type=real
macro=level_definition.Validator, level_definition.Transformer
range=0:
fail-if=len(this)<2 # There must be at least two level boundaries
compulsory=true
sort-key=04
";

fn vertical_dimension_meta(out: &mut String, levels: &LevelSet) {
    out.push_str(VERTICAL_DIMENSION_META);
    for (number, level) in (1001..).zip(levels.iter()) {
        out.push_str(&format!(
            "\n[vertical_dimension={level}]\n\
             title={}\n\
             description=A Model Level\n\
             type=integer\n\
             range=0:\n\
             # Layer out of range\n\
             fail-if=this > len(vertical_dimension=level_definition)-1;\n\
             sort-key=model-levels-{number}\n",
            title_case(&level.as_str().to_ascii_lowercase())
        ));
    }
}

fn non_spatial_dimension_meta(out: &mut String, meta_data: &MetaData) {
    out.push_str("\n[non_spatial_dimensions]\ntitle=Non-Spatial Dimensions\n");

    // Dimensions with a definition need no configuring
    for usage in meta_data
        .non_spatial_dimensions()
        .filter(|usage| !usage.dimension.has_definition())
    {
        dimension_meta(out, usage);
    }
}

fn dimension_meta(out: &mut String, usage: &DimensionUsage) {
    let dimension = &usage.dimension;
    out.push_str(&format!(
        "\n[non_spatial_dimensions={}]\n\
         title={}\n\
         description=Level definition for {}\n\
         type={}\n\
         length=:\n\
         trigger=",
        dimension.name.to_lowercase().replace(' ', "_"),
        dimension.name,
        dimension.name,
        dimension.category.rose_type()
    ));
    for field in &usage.fields {
        out.push_str(&format!(
            "\n       =field_config:{}:{}={}: len(this) > 0 ;",
            field.section, field.group, field.unique_id
        ));
    }

    out.push_str(&format!("\nhelp={}", dimension.help.as_deref().unwrap_or_default()));
    if let Some(units) = &dimension.units {
        out.push_str(&format!("\n    =Units: {units}"));
    }
    out.push_str("\n    =Necessary for:");
    for field in &usage.fields {
        out.push_str(&format!("\n    =    {}", field.unique_id));
    }
    out.push('\n');
}

/// Greedy word wrap; words longer than `width` are split
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        let mut word = word;
        while word.chars().count() > width {
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            let split = word
                .char_indices()
                .nth(width)
                .map_or(word.len(), |(idx, _)| idx);
            lines.push(word[..split].to_string());
            word = &word[split..];
        }
        if word.is_empty() {
            continue;
        }
        let needed = if line.is_empty() {
            word.chars().count()
        } else {
            line.chars().count() + 1 + word.chars().count()
        };
        if needed > width {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(word);
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{FieldDeclaration, NonSpatialDimensionDeclaration, VerticalDimensionDeclaration};

    fn declaration(id: &str) -> FieldDeclaration {
        FieldDeclaration::new(id)
            .with("units", "m s-1")
            .with("function_space", "W3")
            .with("trigger", "__checksum: true;")
            .with("description", "Eastward wind")
            .with("data_type", "REAL_TYPE")
            .with("time_step", "STANDARD_TIMESTEP")
            .with("recommended_interpolation", "BILINEAR")
            .with("long_name", "eastward wind")
    }

    fn meta_data(fields: Vec<FieldDeclaration>) -> MetaData {
        let registry = MetaRegistry::builder("dynamics__winds")
            .fields(fields)
            .build()
            .unwrap();
        let mut meta_data = MetaData::default();
        meta_data.add_registry(registry).unwrap();
        meta_data
    }

    #[test]
    fn test_field_block() {
        let rose_meta = create_rose_meta(&meta_data(vec![declaration("winds__u_in_w3")
            .with_synonym("STASH", "2")
            .with_synonym("CF", "eastward_wind")]));

        assert!(rose_meta.starts_with("\n[field_config]\ntitle=LFRic Field Configuration\n"));
        assert!(rose_meta.contains("\n[field_config:dynamics]\ntitle=Dynamics\n"));
        assert!(rose_meta.contains("\n[field_config:dynamics:winds]\ntitle=Winds\n"));
        assert!(rose_meta.contains(
            "\n[field_config:dynamics:winds=winds__u_in_w3]\n\
             type=boolean\n\
             title=Enable U In W3\n\
             trigger=field_config:dynamics:winds=winds__u_in_w3__checksum: true;\n\
             help=Unit of Measure: m s-1\n\
             \x20   =Function Space: W3\n"
        ));
        assert!(rose_meta.contains("    =Synonyms:\n    =    STASH: 2\n    =    CF: eastward_wind\n"));
        assert!(rose_meta.contains(
            "\n[field_config:dynamics:winds=winds__u_in_w3__checksum]\n\
             type=boolean\n\
             title=Enable Checksum for U In W3\n"
        ));
        // No vertical dimension declared, so no group level blocks
        assert!(!rose_meta.contains("model_levels_for_group"));
    }

    #[test]
    fn test_group_levels_for_vertical_dimensions() {
        let rose_meta = create_rose_meta(&meta_data(vec![declaration("winds__w_in_wth")
            .with_vertical_dimension(VerticalDimensionDeclaration {
                constructor: "model_height_dimension".to_string(),
                top: Some("TOP_ATMOSPHERIC_LEVEL".to_string()),
                bottom: Some("BOTTOM_ATMOSPHERIC_LEVEL".to_string()),
                level_definition: Vec::new(),
            })]));

        assert!(rose_meta
            .contains("values=BOTTOM_ATMOSPHERIC_LEVEL, TOP_ATMOSPHERIC_LEVEL\nsort-key=01\n"));
        assert!(rose_meta.contains("=vertical_dimension_for_group]\n"));
        assert!(rose_meta.contains("       =top_level: TOP_ATMOSPHERIC_LEVEL\n"));
        assert!(rose_meta.contains("       =bottom_level: BOTTOM_ATMOSPHERIC_LEVEL\n"));
    }

    #[test]
    fn test_output_stream_lists_every_field() {
        let rose_meta = create_rose_meta(&meta_data(vec![
            declaration("winds__u_in_w3"),
            declaration("winds__v_in_w3"),
        ]));
        assert!(rose_meta.contains("values=winds__u_in_w3, winds__v_in_w3\n"));
        assert!(rose_meta
            .contains("value-titles=\"Dynamics: Winds: U In W3\", \"Dynamics: Winds: V In W3\"\n"));
    }

    #[test]
    fn test_standard_levels_are_listed() {
        let rose_meta = create_rose_meta(&MetaData::default());
        assert!(rose_meta.contains(
            "\n[vertical_dimension=TOP_ATMOSPHERIC_LEVEL]\ntitle=Top Atmospheric Level\n"
        ));
        assert!(rose_meta.contains("sort-key=model-levels-1001\n"));
    }

    #[test]
    fn test_undefined_non_spatial_dimension_is_configurable() {
        let mut decl = declaration("winds__banded");
        decl.non_spatial_dimensions.push(NonSpatialDimensionDeclaration {
            name: Some("Wind Bands".to_string()),
            category: Some("NUMERICAL".to_string()),
            help: Some("Bands of wind".to_string()),
            units: Some("m s-1".to_string()),
            ..Default::default()
        });
        let rose_meta = create_rose_meta(&meta_data(vec![decl]));

        assert!(rose_meta.contains(
            "\n[non_spatial_dimensions=wind_bands]\n\
             title=wind bands\n\
             description=Level definition for wind bands\n\
             type=real\n\
             length=:\n\
             trigger=\n       =field_config:dynamics:winds=winds__banded: len(this) > 0 ;\n\
             help=Bands of wind\n\
             \x20   =Units: m s-1\n\
             \x20   =Necessary for:\n\
             \x20   =    winds__banded\n"
        ));
        assert!(rose_meta.contains("    =Required non-spatial dimensions:\n    =    wind bands\n"));
    }

    #[test]
    fn test_wrap() {
        assert!(wrap("", 10).is_empty());
        assert_eq!(wrap("one two three", 7), vec!["one two", "three"]);
        assert_eq!(wrap("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
    }
}
