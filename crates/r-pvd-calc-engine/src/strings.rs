//! ---
//! pvd_section: "08-energy-models-optimization"
//! pvd_subsection: "module"
//! pvd_type: "source"
//! pvd_scope: "code"
//! pvd_description: "Sizing and validation routines for PV conductor runs."
//! pvd_version: "v0.0.0-prealpha"
//! pvd_owner: "tbd"
//! ---
//! Per-string sizing pipeline.
//!
//! Each take-off row is sized independently: nominal current from the
//! module Isc and the normative safety factor, derated by the
//! temperature and grouping corrections, theoretical section from the
//! allowed voltage drop, then the commercial section and the real drop
//! through it. A row that fails is reported and skipped; the batch
//! always completes.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use r_pvd_common::CircuitId;
use r_pvd_norms::CircuitClass;

use crate::errors::{CalcEngineError, Result};
use crate::evaluator::{compute_conductor_run, theoretical_section};
use crate::model::{CalcParams, ConductorBase, ConductorRun, StringCircuitRow};
use crate::sections::commercial_section;

/// Fully sized string run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StringRunReport {
    pub string_id: String,
    pub cn1_id: String,
    pub inverter_id: String,
    /// Canonical combiner-to-inverter circuit this string feeds.
    pub circuit: CircuitId,
    /// Positive plus negative conductor length in meters.
    pub length_total_m: f32,
    /// Set when the theoretical section exceeded the largest standard
    /// section and the run was clamped.
    pub section_clamped: bool,
    pub run: ConductorRun,
}

/// A row the pipeline could not size.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RowError {
    pub id: String,
    pub error: String,
}

/// Success and failure counts of one batch.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Result of sizing a whole string table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StringBatchReport {
    pub results: Vec<StringRunReport>,
    pub errors: Vec<RowError>,
    pub summary: BatchSummary,
}

impl StringBatchReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Size one string row.
pub fn calculate_string(
    row: &StringCircuitRow,
    params: &CalcParams,
    class: CircuitClass,
) -> Result<StringRunReport> {
    if !(row.length_pos_m.is_finite() && row.length_pos_m > 0.0) {
        return Err(CalcEngineError::invalid("length_pos_m", row.length_pos_m));
    }
    if !(row.length_neg_m.is_finite() && row.length_neg_m > 0.0) {
        return Err(CalcEngineError::invalid("length_neg_m", row.length_neg_m));
    }

    let factors = params.correction_factors();
    let nominal_current_a = params.panel_isc_a * factors.isc_safety_factor;
    let length_total_m = row.length_pos_m + row.length_neg_m;

    let profile = params.profile();
    let max_voltage_drop_v = profile.max_voltage_drop_v();
    let reference_voltage_v = profile.voltage_drop.reference_voltage_v;

    let theoretical =
        theoretical_section(nominal_current_a, length_total_m, &factors, max_voltage_drop_v)?;
    let selection = commercial_section(theoretical, params.sections_for(class)?, class)?;

    let base = ConductorBase {
        nominal_current_a,
        length_m: length_total_m,
        commercial_section_mm2: selection.section_mm2,
        reference_voltage_v,
        max_voltage_drop_v: Some(max_voltage_drop_v),
    };
    let run = compute_conductor_run(&base, &factors)?;

    Ok(StringRunReport {
        string_id: row.string_id.clone(),
        cn1_id: row.cn1_id.clone(),
        inverter_id: row.inverter_id.clone(),
        circuit: CircuitId::normalized(&row.cn1_id, &row.inverter_id),
        length_total_m,
        section_clamped: selection.clamped,
        run,
    })
}

/// Size every row of a string table. Row failures become error entries
/// instead of aborting the batch.
pub fn calculate_all_strings(
    rows: &[StringCircuitRow],
    params: &CalcParams,
    class: CircuitClass,
) -> StringBatchReport {
    info!(
        "sizing {} string circuits ({class}, norm {})",
        rows.len(),
        params.norm.norm_key
    );

    let mut results = Vec::with_capacity(rows.len());
    let mut errors = Vec::new();
    for row in rows {
        match calculate_string(row, params, class) {
            Ok(report) => results.push(report),
            Err(err) => {
                warn!("string {} failed to size: {err}", row.string_id);
                errors.push(RowError {
                    id: row.string_id.clone(),
                    error: err.to_string(),
                });
            }
        }
    }

    let summary = BatchSummary {
        total: rows.len(),
        succeeded: results.len(),
        failed: errors.len(),
    };
    info!(
        "string sizing complete: {} ok, {} failed",
        summary.succeeded, summary.failed
    );

    StringBatchReport {
        results,
        errors,
        summary,
    }
}
