//! ---
//! pvd_section: "08-energy-models-optimization"
//! pvd_subsection: "module"
//! pvd_type: "source"
//! pvd_scope: "code"
//! pvd_description: "Sizing and validation routines for PV conductor runs."
//! pvd_version: "v0.0.0-prealpha"
//! pvd_owner: "tbd"
//! ---
//! Combiner-to-inverter (CN1) feeder sizing.
//!
//! A CN1 feeder aggregates the strings landed on its combiner, so the
//! design current is the module Isc multiplied by the parallel string
//! count before the normative safety factor applies. The count comes
//! from the string take-off table, joined on the canonical circuit id.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use r_pvd_common::CircuitId;
use r_pvd_norms::CircuitClass;

use crate::errors::{CalcEngineError, Result};
use crate::evaluator::{compute_conductor_run, theoretical_section};
use crate::model::{CalcParams, Cn1CircuitRow, ConductorBase, ConductorRun, StringCircuitRow};
use crate::sections::commercial_section;
use crate::strings::{BatchSummary, RowError};

/// Fully sized CN1 feeder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cn1RunReport {
    pub circuit_id: CircuitId,
    pub inverter_id: String,
    pub parallel_strings: u32,
    /// Whether the parallel count came from the string table join. A
    /// miss degrades to a single string and must be reviewed.
    pub mapping_found: bool,
    /// Module Isc in amperes.
    pub isc_base_a: f32,
    /// Combined current of the parallel strings before the safety
    /// factor.
    pub isc_combined_a: f32,
    pub length_total_m: f32,
    pub section_clamped: bool,
    pub run: ConductorRun,
}

/// Result of sizing a whole CN1 table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cn1BatchReport {
    pub results: Vec<Cn1RunReport>,
    pub errors: Vec<RowError>,
    pub summary: BatchSummary,
}

impl Cn1BatchReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Count parallel strings per canonical circuit id from the string
/// take-off table.
pub fn parallel_string_counts(rows: &[StringCircuitRow]) -> IndexMap<CircuitId, u32> {
    let mut counts: IndexMap<CircuitId, u32> = IndexMap::new();
    for row in rows {
        let circuit = CircuitId::normalized(&row.cn1_id, &row.inverter_id);
        *counts.entry(circuit).or_insert(0) += 1;
    }
    info!("counted parallel strings for {} CN1 circuits", counts.len());
    counts
}

/// Size one CN1 feeder row against the parallel-string mapping.
pub fn calculate_cn1(
    row: &Cn1CircuitRow,
    counts: &IndexMap<CircuitId, u32>,
    params: &CalcParams,
) -> Result<Cn1RunReport> {
    if !(row.length_pos_m.is_finite() && row.length_pos_m > 0.0) {
        return Err(CalcEngineError::invalid("length_pos_m", row.length_pos_m));
    }
    if !(row.length_neg_m.is_finite() && row.length_neg_m > 0.0) {
        return Err(CalcEngineError::invalid("length_neg_m", row.length_neg_m));
    }

    let circuit_id = CircuitId::normalized(&row.circuit_id, &row.inverter_id);
    let (parallel_strings, mapping_found) = match counts.get(&circuit_id) {
        Some(count) => (*count, true),
        None => {
            warn!(
                "circuit {circuit_id} missing from the parallel-string mapping, assuming 1 string"
            );
            (1, false)
        }
    };

    let factors = params.correction_factors();
    let isc_base_a = params.panel_isc_a;
    let isc_combined_a = isc_base_a * parallel_strings as f32;
    let nominal_current_a = isc_combined_a * factors.isc_safety_factor;
    let length_total_m = row.length_pos_m + row.length_neg_m;

    let class = CircuitClass::Cn1Inverter;
    let profile = params.profile();
    let max_voltage_drop_v = profile.max_voltage_drop_v();

    let theoretical =
        theoretical_section(nominal_current_a, length_total_m, &factors, max_voltage_drop_v)?;
    let selection = commercial_section(theoretical, params.sections_for(class)?, class)?;

    let base = ConductorBase {
        nominal_current_a,
        length_m: length_total_m,
        commercial_section_mm2: selection.section_mm2,
        reference_voltage_v: profile.voltage_drop.reference_voltage_v,
        max_voltage_drop_v: Some(max_voltage_drop_v),
    };
    let run = compute_conductor_run(&base, &factors)?;

    info!(
        "{circuit_id}: {parallel_strings} strings × {isc_base_a:.2} A → nominal {:.2} A",
        nominal_current_a
    );

    Ok(Cn1RunReport {
        circuit_id,
        inverter_id: row.inverter_id.clone(),
        parallel_strings,
        mapping_found,
        isc_base_a,
        isc_combined_a,
        length_total_m,
        section_clamped: selection.clamped,
        run,
    })
}

/// Size every CN1 row. Row failures become error entries instead of
/// aborting the batch.
pub fn calculate_all_cn1(
    rows: &[Cn1CircuitRow],
    counts: &IndexMap<CircuitId, u32>,
    params: &CalcParams,
) -> Cn1BatchReport {
    info!(
        "sizing {} CN1 feeders (norm {})",
        rows.len(),
        params.norm.norm_key
    );

    let mut results = Vec::with_capacity(rows.len());
    let mut errors = Vec::new();
    for row in rows {
        match calculate_cn1(row, counts, params) {
            Ok(report) => results.push(report),
            Err(err) => {
                warn!("CN1 {} failed to size: {err}", row.circuit_id);
                errors.push(RowError {
                    id: CircuitId::normalized(&row.circuit_id, &row.inverter_id)
                        .as_str()
                        .to_owned(),
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

    Cn1BatchReport {
        results,
        errors,
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use r_pvd_norms::{builtin_catalog, effective_profile};

    fn iec_params() -> CalcParams {
        let norm = effective_profile(builtin_catalog(), "IEC", None).unwrap();
        CalcParams::new(norm, 12.0)
    }

    fn string_row(id: &str, cn1: &str, inv: &str) -> StringCircuitRow {
        StringCircuitRow {
            string_id: id.to_owned(),
            length_pos_m: 20.0,
            length_neg_m: 20.0,
            cn1_id: cn1.to_owned(),
            inverter_id: inv.to_owned(),
        }
    }

    fn cn1_row(circuit: &str, inv: &str) -> Cn1CircuitRow {
        Cn1CircuitRow {
            circuit_id: circuit.to_owned(),
            length_pos_m: 60.0,
            length_neg_m: 60.0,
            inverter_id: inv.to_owned(),
        }
    }

    #[test]
    fn counts_join_across_id_spellings() {
        let rows = vec![
            string_row("str-01-01-CN1-01-01", "CN1-01", "INV-1"),
            string_row("str-01-02-CN1-01-01", "cn1-1", "INV-01"),
            string_row("str-01-03-CN1-01-01", "CN1-01", "INV-1"),
            string_row("str-02-01-CN1-02-01", "CN1-02", "INV-1"),
        ];
        let counts = parallel_string_counts(&rows);

        assert_eq!(
            counts[&CircuitId::normalized("CN1-01", "INV-1")],
            3
        );
        assert_eq!(
            counts[&CircuitId::normalized("CN1-02", "INV-1")],
            1
        );
    }

    #[test]
    fn combined_current_scales_with_parallel_strings() {
        let params = iec_params();
        let strings: Vec<StringCircuitRow> = (1..=8)
            .map(|i| string_row(&format!("str-01-{i:02}-CN1-01-01"), "CN1-01", "INV-1"))
            .collect();
        let counts = parallel_string_counts(&strings);

        let report = calculate_cn1(&cn1_row("cn1-1", "INV-1"), &counts, &params).unwrap();

        assert_eq!(report.parallel_strings, 8);
        assert!(report.mapping_found);
        assert!((report.isc_combined_a - 96.0).abs() < 1e-4);
        // 96 A × 1.25 safety factor.
        assert!((report.run.nominal_current_a - 120.0).abs() < 1e-3);
        assert!(report.run.commercial_section_mm2 >= report.run.theoretical_section_mm2);
    }

    #[test]
    fn missing_mapping_degrades_to_single_string() {
        let params = iec_params();
        let counts = IndexMap::new();

        let report = calculate_cn1(&cn1_row("cn1-9", "INV-2"), &counts, &params).unwrap();

        assert_eq!(report.parallel_strings, 1);
        assert!(!report.mapping_found);
        assert_eq!(report.circuit_id.as_str(), "cn1-09-inv2");
    }

    #[test]
    fn cn1_batch_is_fail_soft() {
        let params = iec_params();
        let counts = IndexMap::new();
        let mut bad = cn1_row("cn1-2", "INV-1");
        bad.length_neg_m = 0.0;
        let rows = vec![cn1_row("cn1-1", "INV-1"), bad];

        let report = calculate_all_cn1(&rows, &counts, &params);

        assert_eq!(report.summary.succeeded, 1);
        assert_eq!(report.summary.failed, 1);
        assert_eq!(report.errors[0].id, "cn1-02-inv1");
    }
}
