use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use fieldmeta::output::read_json_meta;
use fieldmeta::{FieldDescriptor, MetaData};

/// Inspect a generated meta data document
#[derive(Parser, Debug)]
#[command(name = "inspect_meta", version, about, long_about = None)]
struct Args {
    /// Path to the JSON document
    file: PathBuf,

    /// Print a single field in full
    #[arg(long)]
    field: Option<String>,

    /// Only list the fields of this `section__group`
    #[arg(long)]
    registry: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    println!("Inspecting meta data: {}", args.file.display());
    let meta_data = read_json_meta(&args.file)
        .with_context(|| format!("failed to load {}", args.file.display()))?;
    println!("Checksum verified");

    if let Some(unique_id) = &args.field {
        return print_field(&meta_data, unique_id);
    }

    if let Some(name) = &args.registry {
        let registry = meta_data.registry(name)?;
        println!("\n{} ({} fields)", registry.name(), registry.len());
        for field in registry.fields() {
            print_summary(field);
        }
        return Ok(());
    }

    println!("\n=== SECTIONS ===");
    for section in meta_data.sections() {
        println!("\n{} ({})", section.title(), section.name());
        for group in section.groups() {
            println!("  {} ({} fields)", group.title(), group.len());
            for field in group.fields() {
                print_summary(field);
            }
        }
    }

    println!("\nLevel markers:");
    for level in meta_data.standard_level_markers().iter() {
        println!("  {level}");
    }

    println!("\nNon-spatial dimensions:");
    for usage in meta_data.non_spatial_dimensions() {
        println!(
            "  {} ({} fields)",
            usage.dimension.name,
            usage.fields.len()
        );
    }

    println!("\nTotal fields: {}", meta_data.field_count());
    Ok(())
}

fn print_summary(field: &FieldDescriptor) {
    println!(
        "    {} [{}] {} {}",
        field.unique_id, field.units, field.function_space, field.time_step
    );
}

fn print_field(meta_data: &MetaData, unique_id: &str) -> Result<()> {
    let found = meta_data.find_field(unique_id);
    if found.is_empty() {
        anyhow::bail!("field {unique_id} not found");
    }
    for (registry, field) in found {
        println!("\n{} in {}", field.unique_id, registry.name());
        println!(
            "{}",
            serde_json::to_string_pretty(field).context("failed to render field")?
        );
    }
    Ok(())
}
