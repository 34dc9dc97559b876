//! ---
//! pvd_section: "08-energy-models-optimization"
//! pvd_subsection: "module"
//! pvd_type: "source"
//! pvd_scope: "code"
//! pvd_description: "Sizing and validation routines for PV conductor runs."
//! pvd_version: "v0.0.0-prealpha"
//! pvd_owner: "tbd"
//! ---
use std::{fs, path::Path};

use serde::Serialize;
use serde_json::json;
use tracing::info;

use crate::{errors::Result, AnalysisSummary};

#[derive(Debug)]
pub struct ReportExporter<'a> {
    summary: &'a AnalysisSummary,
}

impl<'a> ReportExporter<'a> {
    pub fn new(summary: &'a AnalysisSummary) -> Self {
        Self { summary }
    }

    pub fn export_all(&self, output_dir: &Path) -> Result<()> {
        if !output_dir.exists() {
            fs::create_dir_all(output_dir)?;
        }

        let timestamp = self.summary.timestamp.to_rfc3339();
        let run_id = self.summary.run_id.to_string();
        let header = ReportHeader {
            timestamp: &timestamp,
            run_id: &run_id,
            project: &self.summary.project,
            norm: &self.summary.norm_key,
        };

        let string_report =
            ReportEnvelope::new(&header, string_runs_schema(), &self.summary.strings);
        let cn1_report = ReportEnvelope::new(&header, cn1_runs_schema(), &self.summary.cn1);
        let validation_report =
            ReportEnvelope::new(&header, validation_schema(), &self.summary.validation);
        let dataset_report =
            ReportEnvelope::new(&header, dataset_schema(), &self.summary.dataset);

        write_json(output_dir.join("string_runs.json"), &string_report)?;
        write_json(output_dir.join("cn1_runs.json"), &cn1_report)?;
        write_json(output_dir.join("validation.json"), &validation_report)?;
        write_json(output_dir.join("dataset_findings.json"), &dataset_report)?;

        info!("Reports exported to {}", output_dir.display());
        Ok(())
    }
}

#[derive(Debug, Serialize, Clone, Copy)]
struct ReportHeader<'a> {
    timestamp: &'a str,
    run_id: &'a str,
    project: &'a str,
    norm: &'a str,
}

#[derive(Debug, Serialize)]
struct ReportEnvelope<'a, T: Serialize> {
    #[serde(flatten)]
    header: ReportHeader<'a>,
    schema: serde_json::Value,
    data: &'a T,
}

impl<'a, T: Serialize> ReportEnvelope<'a, T> {
    fn new(header: &ReportHeader<'a>, schema: serde_json::Value, data: &'a T) -> Self {
        Self {
            header: *header,
            schema,
            data,
        }
    }
}

fn write_json<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<()> {
    let serialized = serde_json::to_string_pretty(value)?;
    fs::write(path, serialized)?;
    Ok(())
}

fn string_runs_schema() -> serde_json::Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "StringBatchReport",
        "type": "object",
        "properties": {
            "results": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "string_id": {"type": "string"},
                        "cn1_id": {"type": "string"},
                        "inverter_id": {"type": "string"},
                        "circuit": {"type": "string"},
                        "length_total_m": {"type": "number"},
                        "section_clamped": {"type": "boolean"},
                        "run": {"$ref": "#/$defs/conductor_run"}
                    },
                    "required": ["string_id", "run"]
                }
            },
            "errors": {"type": "array"},
            "summary": {"$ref": "#/$defs/batch_summary"}
        },
        "required": ["results", "errors", "summary"],
        "$defs": {
            "conductor_run": {
                "type": "object",
                "properties": {
                    "adjusted_current_a": {"type": "number"},
                    "theoretical_section_mm2": {"type": "number"},
                    "commercial_section_mm2": {"type": "number"},
                    "voltage_drop_pct": {"type": "number"},
                    "status": {"enum": ["ok", "warning", "error"]}
                }
            },
            "batch_summary": {
                "type": "object",
                "properties": {
                    "total": {"type": "integer"},
                    "succeeded": {"type": "integer"},
                    "failed": {"type": "integer"}
                }
            }
        }
    })
}

fn cn1_runs_schema() -> serde_json::Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "Cn1BatchReport",
        "type": "object",
        "properties": {
            "results": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "circuit_id": {"type": "string"},
                        "parallel_strings": {"type": "integer"},
                        "mapping_found": {"type": "boolean"},
                        "isc_combined_a": {"type": "number"},
                        "section_clamped": {"type": "boolean"}
                    },
                    "required": ["circuit_id", "parallel_strings"]
                }
            },
            "errors": {"type": "array"},
            "summary": {"type": "object"}
        },
        "required": ["results", "errors", "summary"]
    })
}

fn validation_schema() -> serde_json::Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "ValidationReport",
        "type": "object",
        "properties": {
            "results": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "is_valid": {"type": "boolean"},
                        "score": {"type": "number", "minimum": 0, "maximum": 100},
                        "severity": {"enum": ["error", "warning", "info", "success"]},
                        "category": {"type": "string"},
                        "message": {"type": "string"},
                        "recommendation": {"type": ["string", "null"]},
                        "reference": {"type": ["string", "null"]}
                    },
                    "required": ["is_valid", "score", "severity", "category", "message"]
                }
            },
            "score": {"type": "number"}
        },
        "required": ["results", "score"]
    })
}

fn dataset_schema() -> serde_json::Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "DatasetReport",
        "type": "object",
        "properties": {
            "findings": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "row": {"type": ["integer", "null"]},
                        "severity": {"enum": ["error", "warning"]},
                        "message": {"type": "string"}
                    },
                    "required": ["severity", "message"]
                }
            }
        },
        "required": ["findings"]
    })
}
