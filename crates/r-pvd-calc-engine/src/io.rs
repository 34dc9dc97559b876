//! ---
//! pvd_section: "08-energy-models-optimization"
//! pvd_subsection: "module"
//! pvd_type: "source"
//! pvd_scope: "code"
//! pvd_description: "Sizing and validation routines for PV conductor runs."
//! pvd_version: "v0.0.0-prealpha"
//! pvd_owner: "tbd"
//! ---
use std::fs;
use std::path::Path;

use crate::errors::{CalcEngineError, Result};
use crate::model::{Cn1CircuitRow, ProjectSpec, StringCircuitRow};

const STRING_COLUMNS: [&str; 5] = [
    "string_id",
    "length_pos_m",
    "length_neg_m",
    "cn1_id",
    "inverter_id",
];
const CN1_COLUMNS: [&str; 4] = ["circuit_id", "length_pos_m", "length_neg_m", "inverter_id"];

/// Load a project spec from JSON or YAML, sniffing the format.
pub fn load_project_spec(path: impl AsRef<Path>) -> Result<ProjectSpec> {
    let data = fs::read_to_string(path)?;
    let spec = if data.trim_start().starts_with('{') {
        serde_json::from_str(&data)?
    } else {
        serde_yaml::from_str(&data).map_err(CalcEngineError::YamlSerializationFailed)?
    };
    Ok(spec)
}

/// Load the string take-off table from CSV.
pub fn load_string_rows(path: impl AsRef<Path>) -> Result<Vec<StringCircuitRow>> {
    let mut reader = csv::Reader::from_path(path)?;
    require_columns(&reader.headers()?.clone(), &STRING_COLUMNS)?;
    let mut rows = Vec::new();
    for record in reader.deserialize() {
        rows.push(record?);
    }
    Ok(rows)
}

/// Load the CN1 feeder table from CSV.
pub fn load_cn1_rows(path: impl AsRef<Path>) -> Result<Vec<Cn1CircuitRow>> {
    let mut reader = csv::Reader::from_path(path)?;
    require_columns(&reader.headers()?.clone(), &CN1_COLUMNS)?;
    let mut rows = Vec::new();
    for record in reader.deserialize() {
        rows.push(record?);
    }
    Ok(rows)
}

fn require_columns(headers: &csv::StringRecord, required: &[&'static str]) -> Result<()> {
    for column in required {
        if !headers.iter().any(|h| h == *column) {
            return Err(CalcEngineError::MissingColumn(column));
        }
    }
    Ok(())
}
