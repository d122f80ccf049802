//! CMIP6 reference table and the checks made against it.
//!
//! The table is a JSON array of records keyed `"0"` to `"5"`: label (first
//! word only is significant), CF standard name, title, units, description
//! and identifier.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use super::{FieldStandard, ValidationIssue};
use crate::error::Result;
use crate::field::FieldDescriptor;
use crate::vocabulary::SynonymConvention;

/// One entry of the CMIP6 table
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CmipRecord {
    #[serde(rename = "0", deserialize_with = "first_word")]
    pub label: String,
    #[serde(rename = "1")]
    pub cf_id: String,
    #[serde(rename = "2")]
    pub title: String,
    #[serde(rename = "3")]
    pub units: String,
    #[serde(rename = "4")]
    pub description: String,
    #[serde(rename = "5")]
    pub unid: String,
}

fn first_word<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    Ok(text.split(' ').next().unwrap_or_default().to_string())
}

/// CMIP6 records keyed by label
#[derive(Debug, Clone, Default)]
pub struct Cmip6Standard {
    records: HashMap<String, CmipRecord>,
}

impl Cmip6Standard {
    pub fn from_records(records: impl IntoIterator<Item = CmipRecord>) -> Self {
        Self {
            records: records
                .into_iter()
                .map(|record| (record.label.clone(), record))
                .collect(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let records: Vec<CmipRecord> = serde_json::from_str(json)?;
        Ok(Self::from_records(records))
    }

    /// Load the table from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let standard = Self::from_json_str(&fs::read_to_string(path)?)?;
        debug!(
            "Loaded {} CMIP6 records from {}",
            standard.len(),
            path.display()
        );
        Ok(standard)
    }

    pub fn record(&self, label: &str) -> Option<&CmipRecord> {
        self.records.get(label)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FieldStandard for Cmip6Standard {
    fn name(&self) -> &'static str {
        "CMIP6"
    }

    fn applies_to(&self, field: &FieldDescriptor) -> bool {
        field.has_synonym_in(SynonymConvention::Cmip6)
    }

    fn check(&self, field: &FieldDescriptor) -> Vec<ValidationIssue> {
        let id = &field.unique_id;
        let cf_synonyms = field.synonyms_for(SynonymConvention::Cf);
        let mut issues = Vec::new();

        for code in field.synonyms_for(SynonymConvention::Cmip6) {
            let Some(record) = self.records.get(code) else {
                issues.push(ValidationIssue::new(
                    id.clone(),
                    "synonyms",
                    format!("Field {id} CMIP6 code is not recognised"),
                ));
                continue;
            };
            if field.units != record.units {
                issues.push(ValidationIssue::new(
                    id.clone(),
                    "units",
                    format!("Unit does not match CMIP {code} unit for field {id}"),
                ));
            }
            if !cf_synonyms.is_empty() && !cf_synonyms.contains(&record.cf_id.as_str()) {
                issues.push(ValidationIssue::new(
                    id.clone(),
                    "synonyms",
                    format!("Field {id} has a different CF code to the CMIP6 standard for CMIP {code}"),
                ));
            }
        }
        issues
    }
}
