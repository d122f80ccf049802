//! Checksummed JSON export of the meta data.
//!
//! The document is `{"meta_data": ..., "checksum": "md5: <hex>"}`. The
//! checksum covers `{"meta_data": ...}` serialised with sorted keys, `", "`
//! and `": "` separators, every non-ASCII character escaped and floats in
//! their shortest `repr` form (`1e-05`, `10.0`). Documents therefore hash
//! the same as the Python tooling that reads them.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use md5::{Digest, Md5};
use serde::Serialize;
use serde_json::ser::{Formatter, PrettyFormatter};
use serde_json::{Map, Serializer, Value};
use tracing::{debug, error, info};

use crate::error::{MetaError, Result};
use crate::registry::MetaData;

const META_DATA_KEY: &str = "meta_data";
const CHECKSUM_KEY: &str = "checksum";

/// Compact formatter matching the separators and escaping of the hash input
struct ChecksumFormatter;

impl Formatter for ChecksumFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }

    fn write_f64<W>(&mut self, writer: &mut W, value: f64) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(float_repr(value).as_bytes())
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if fragment.is_ascii() {
            return writer.write_all(fragment.as_bytes());
        }
        let mut units = [0u16; 2];
        for c in fragment.chars() {
            if c.is_ascii() {
                writer.write_all(&[c as u8])?;
            } else {
                for unit in c.encode_utf16(&mut units) {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
        }
        Ok(())
    }
}

/// Shortest round-trip rendering of a finite float, switching to exponent
/// form below `1e-4` and from `1e16`
fn float_repr(value: f64) -> String {
    // `{:e}` gives the shortest round-trip digits, e.g. `-2.5e-7`
    let scientific = format!("{value:e}");
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((&scientific, "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let (sign, mantissa) = match mantissa.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", mantissa),
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let point = exponent + 1;

    if !(-3..=16).contains(&point) {
        let (first, rest) = digits.split_at(1);
        let fraction = if rest.is_empty() {
            String::new()
        } else {
            format!(".{rest}")
        };
        let exponent_sign = if exponent < 0 { '-' } else { '+' };
        return format!("{sign}{first}{fraction}e{exponent_sign}{:02}", exponent.abs());
    }

    if exponent < 0 {
        let zeros = "0".repeat((-exponent - 1) as usize);
        return format!("{sign}0.{zeros}{digits}");
    }
    let point = point as usize;
    if point >= digits.len() {
        let zeros = "0".repeat(point - digits.len());
        format!("{sign}{digits}{zeros}.0")
    } else {
        let (whole, fraction) = digits.split_at(point);
        format!("{sign}{whole}.{fraction}")
    }
}

/// `md5: <hex>` checksum of a JSON value.
///
/// Object keys are hashed in sorted order; `serde_json::Map` keeps them
/// sorted.
pub fn checksum(value: &Value) -> Result<String> {
    let mut bytes = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut bytes, ChecksumFormatter);
    value.serialize(&mut serializer)?;
    Ok(format!("md5: {:x}", Md5::digest(&bytes)))
}

/// The JSON document for some meta data, checksum included
pub fn to_document(meta_data: &MetaData) -> Result<Value> {
    let mut document = Map::new();
    document.insert(META_DATA_KEY.to_string(), serde_json::to_value(meta_data)?);
    let checksum = checksum(&Value::Object(document.clone()))?;
    debug!("Meta data checksum {}", checksum);
    document.insert(CHECKSUM_KEY.to_string(), Value::String(checksum));
    Ok(Value::Object(document))
}

/// Write the checksummed document to `directory/file_name`
pub fn write_json_meta(meta_data: &MetaData, directory: &Path, file_name: &str) -> Result<PathBuf> {
    let document = to_document(meta_data)?;

    let mut bytes = Vec::new();
    let mut serializer =
        Serializer::with_formatter(&mut bytes, PrettyFormatter::with_indent(b"    "));
    document.serialize(&mut serializer)?;
    bytes.push(b'\n');

    fs::create_dir_all(directory)?;
    let path = directory.join(file_name);
    info!("Writing {}", path.display());
    fs::write(&path, bytes)?;
    Ok(path)
}

/// Check a parsed document against its recorded checksum and return the
/// meta data object it holds
pub fn verify_document(mut document: Value) -> Result<Value> {
    let object = document.as_object_mut().ok_or_else(|| MetaError::Checksum {
        expected: "a JSON object".to_string(),
        found: "another JSON value".to_string(),
    })?;
    let recorded = match object.remove(CHECKSUM_KEY) {
        Some(Value::String(recorded)) => recorded,
        _ => String::new(),
    };
    let computed = checksum(&document)?;
    if recorded != computed {
        error!("Immutable data has been modified by hand");
        return Err(MetaError::Checksum {
            expected: recorded,
            found: computed,
        });
    }

    match document {
        Value::Object(mut object) => Ok(object.remove(META_DATA_KEY).unwrap_or(Value::Null)),
        _ => Ok(Value::Null),
    }
}

/// Read a document written by [`write_json_meta`], verifying its checksum
pub fn read_json_meta(path: &Path) -> Result<MetaData> {
    debug!("Reading {}", path.display());
    let content = fs::read_to_string(path)?;
    let document: Value = serde_json::from_str(&content)?;
    let meta_data = verify_document(document)?;
    Ok(serde_json::from_value(meta_data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldDeclaration;
    use crate::registry::MetaRegistry;
    use serde_json::json;

    #[test]
    fn test_reference_checksums() {
        assert_eq!(
            checksum(&json!({})).unwrap(),
            "md5: 99914b932bd37a50b983c5e7c90ae93b"
        );
        assert_eq!(
            checksum(&json!({"a key": "a value"})).unwrap(),
            "md5: 9eae1793e5a5fbd89e0b737c67173a46"
        );
        assert_eq!(
            checksum(&json!({"meta_data": {"unique_id": "test_id", "section_name": "test_section"}}))
                .unwrap(),
            "md5: 1461c4f998be95df7f0512b9ed772ce0"
        );
    }

    #[test]
    fn test_non_ascii_is_escaped_before_hashing() {
        assert_eq!(
            checksum(&json!({"k": "caf\u{e9} \u{1F600}"})).unwrap(),
            "md5: 014d761169b2bb91198f9eed98f03040"
        );
    }

    #[test]
    fn test_floats_are_hashed_in_repr_form() {
        let rendered: Vec<String> = [0.00001, 1e16, 1.5, 10.0, 0.0001, -2.5e-7, 1e15, 0.0, 0.5]
            .into_iter()
            .map(float_repr)
            .collect();
        assert_eq!(
            rendered,
            vec![
                "1e-05",
                "1e+16",
                "1.5",
                "10.0",
                "0.0001",
                "-2.5e-07",
                "1000000000000000.0",
                "0.0",
                "0.5",
            ]
        );
        assert_eq!(
            checksum(&json!({"a": 0.00001, "b": 1e16})).unwrap(),
            "md5: 314a1f58abf5e0db10a6aa75dd4bdcb8"
        );
        assert_eq!(
            checksum(&json!({
                "a": 0.00001,
                "b": 1e16,
                "c": [1.5, 10.0, 0.0001, -2.5e-7, 1e15, 123456789012345678.0]
            }))
            .unwrap(),
            "md5: 3d396d892735b1362d935d017e538bdc"
        );
    }

    fn sample() -> MetaData {
        let registry = MetaRegistry::builder("system__test")
            .field(
                FieldDeclaration::new("example_fields__test_field")
                    .with("units", "m s-1")
                    .with("function_space", "W3")
                    .with("trigger", "__checksum: true;")
                    .with("description", "A test field")
                    .with("data_type", "REAL_TYPE")
                    .with("time_step", "STANDARD_TIMESTEP")
                    .with("recommended_interpolation", "BILINEAR")
                    .with("long_name", "test field"),
            )
            .build()
            .unwrap();
        let mut meta_data = MetaData::default();
        meta_data.add_registry(registry).unwrap();
        meta_data
    }

    #[test]
    fn test_write_then_read_verifies() {
        let dir = tempfile::tempdir().unwrap();
        let meta_data = sample();
        let path = write_json_meta(&meta_data, dir.path(), "meta.json").unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.ends_with("}\n"));
        assert!(content.contains("\n    \"checksum\": \"md5: "));

        assert_eq!(read_json_meta(&path).unwrap(), meta_data);
    }

    #[test]
    fn test_hand_edit_is_detected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_json_meta(&sample(), dir.path(), "meta.json").unwrap();
        let edited = fs::read_to_string(&path)
            .unwrap()
            .replace("m s-1", "km s-1");
        fs::write(&path, edited).unwrap();

        assert!(matches!(
            read_json_meta(&path),
            Err(MetaError::Checksum { .. })
        ));
    }

    #[test]
    fn test_missing_checksum_fails_verification() {
        let err = verify_document(json!({"meta_data": {}})).unwrap_err();
        assert!(matches!(err, MetaError::Checksum { ref expected, .. } if expected.is_empty()));
    }
}
