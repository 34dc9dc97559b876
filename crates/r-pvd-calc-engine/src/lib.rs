//! ---
//! pvd_section: "08-energy-models-optimization"
//! pvd_subsection: "module"
//! pvd_type: "source"
//! pvd_scope: "code"
//! pvd_description: "Sizing and validation routines for PV conductor runs."
//! pvd_version: "v0.0.0-prealpha"
//! pvd_owner: "tbd"
//! ---
pub mod api;
pub mod cn1;
pub mod dataset;
pub mod errors;
pub mod evaluator;
pub mod io;
pub mod model;
pub mod reports;
pub mod rules;
pub mod sections;
pub mod simulation;
pub mod strings;

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use r_pvd_norms::{CircuitClass, EffectiveNorm};

use crate::{
    cn1::{calculate_all_cn1, parallel_string_counts, Cn1BatchReport},
    dataset::{validate_string_dataset, DatasetReport},
    model::{CalcParams, Cn1CircuitRow, ProjectSpec, StringCircuitRow},
    reports::ReportExporter,
    rules::{
        evaluate_rules, ElectricalParameters, InsulationClass, NormStandard, RuleThresholds,
        ValidationReport,
    },
    strings::{calculate_all_strings, StringBatchReport},
};

pub use errors::{CalcEngineError, Result};

/// Standard groups active for a given normative profile. IEC plants
/// are not checked against the UL equipment ceiling (1500 V designs
/// are routine there), NEC plants are.
pub fn standards_for_norm(norm_key: &str) -> Vec<NormStandard> {
    match norm_key {
        "IEC" => vec![NormStandard::Iec60364],
        "NEC" => vec![NormStandard::Nec690, NormStandard::Ul1741],
        _ => vec![
            NormStandard::Iec60364,
            NormStandard::Nec690,
            NormStandard::Ul1741,
        ],
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AnalysisSummary {
    pub run_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub project: String,
    pub norm_key: String,
    pub dataset: DatasetReport,
    pub strings: StringBatchReport,
    pub cn1: Cn1BatchReport,
    pub validation: ValidationReport,
}

impl AnalysisSummary {
    pub fn exporter(&self) -> ReportExporter<'_> {
        ReportExporter::new(self)
    }
}

/// Runs the full analysis suite and writes reports to the default
/// `reports/` directory.
///
/// For fallible usage, prefer [`analyze_project_with_options`].
pub fn analyze_project(
    project: &ProjectSpec,
    string_rows: &[StringCircuitRow],
    cn1_rows: &[Cn1CircuitRow],
    norm: EffectiveNorm,
) -> AnalysisSummary {
    analyze_project_with_options(project, string_rows, cn1_rows, norm, None)
        .expect("calculation engine execution should succeed")
}

/// Runs the calculation engine with configurable export directory.
/// When `output_dir` is `None`, the default `reports/` directory at the
/// workspace root is used.
pub fn analyze_project_with_options(
    project: &ProjectSpec,
    string_rows: &[StringCircuitRow],
    cn1_rows: &[Cn1CircuitRow],
    norm: EffectiveNorm,
    output_dir: Option<&std::path::Path>,
) -> Result<AnalysisSummary> {
    info!("Validating take-off tables...");
    let dataset = validate_string_dataset(string_rows);

    let params = CalcParams::new(norm, project.panel.isc_a);

    info!("Sizing string circuits...");
    let strings = calculate_all_strings(string_rows, &params, CircuitClass::DcStrings);

    info!("Sizing CN1 feeders...");
    let counts = parallel_string_counts(string_rows);
    let cn1 = calculate_all_cn1(cn1_rows, &counts, &params);

    info!("Running normative validation...");
    let snapshot = validation_snapshot(project, &params, &strings, &cn1);
    let standards = standards_for_norm(&params.norm.norm_key);
    let validation = evaluate_rules(&standards, &snapshot, &RuleThresholds::default());

    let summary = AnalysisSummary {
        run_id: Uuid::new_v4(),
        timestamp: Utc::now(),
        project: project.name.clone(),
        norm_key: params.norm.norm_key.clone(),
        dataset,
        strings,
        cn1,
        validation,
    };

    let default_dir = std::path::Path::new("reports");
    let output_dir = output_dir.unwrap_or(default_dir);
    summary.exporter().export_all(output_dir)?;

    Ok(summary)
}

/// Assemble the worst-case electrical snapshot the rule set runs
/// against: the highest drop and current across every sized run.
fn validation_snapshot(
    project: &ProjectSpec,
    params: &CalcParams,
    strings: &StringBatchReport,
    cn1: &Cn1BatchReport,
) -> ElectricalParameters {
    let worst_drop_pct = strings
        .results
        .iter()
        .map(|r| r.run.voltage_drop_pct)
        .chain(cn1.results.iter().map(|r| r.run.voltage_drop_pct))
        .fold(0.0f32, f32::max);
    let worst_nominal_a = strings
        .results
        .iter()
        .map(|r| r.run.nominal_current_a)
        .chain(cn1.results.iter().map(|r| r.run.nominal_current_a))
        .fold(0.0f32, f32::max);
    let worst_isc_a = cn1
        .results
        .iter()
        .map(|r| r.isc_combined_a)
        .fold(project.panel.isc_a, f32::max);

    let system_voltage_v = params.profile().voltage_drop.reference_voltage_v;
    let thresholds = RuleThresholds::default();

    let cable_ampacity_a = match project.cable_ampacity_a {
        Some(ampacity) => ampacity,
        None => {
            warn!("no cable ampacity in the project spec, ampacity rule runs against the margin itself");
            worst_nominal_a * thresholds.current_margin
        }
    };
    let insulation_class = match project.insulation_class {
        Some(class) => class,
        None => {
            if system_voltage_v > thresholds.class_ii_threshold_v {
                InsulationClass::ClassII
            } else {
                InsulationClass::ClassI
            }
        }
    };

    ElectricalParameters {
        voltage_drop_pct: worst_drop_pct,
        operating_temp_c: params.ambient_c(),
        short_circuit_current_a: worst_isc_a,
        nominal_current_a: worst_nominal_a,
        cable_ampacity_a,
        system_voltage_v,
        insulation_class,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PanelInfo;
    use r_pvd_norms::{builtin_catalog, effective_profile};

    fn sample_project() -> ProjectSpec {
        ProjectSpec {
            name: "Planta Norte".to_owned(),
            panel: PanelInfo {
                model: "PERC-550".to_owned(),
                isc_a: 14.0,
                voc_v: 49.9,
                power_stc_w: 550.0,
            },
            cable_ampacity_a: Some(200.0),
            insulation_class: Some(InsulationClass::ClassII),
        }
    }

    fn sample_strings() -> Vec<StringCircuitRow> {
        (1..=6)
            .map(|i| StringCircuitRow {
                string_id: format!("str-01-{i:02}-CN1-01-01"),
                length_pos_m: 18.0 + i as f32,
                length_neg_m: 17.5 + i as f32,
                cn1_id: "CN1-01".to_owned(),
                inverter_id: "INV-1".to_owned(),
            })
            .collect()
    }

    fn sample_cn1() -> Vec<Cn1CircuitRow> {
        vec![Cn1CircuitRow {
            circuit_id: "cn1-1".to_owned(),
            length_pos_m: 85.0,
            length_neg_m: 85.0,
            inverter_id: "INV-1".to_owned(),
        }]
    }

    #[test]
    fn analyze_project_pipeline() {
        let temp = tempfile::tempdir().unwrap();
        let norm = effective_profile(builtin_catalog(), "IEC", None).unwrap();

        let summary = analyze_project_with_options(
            &sample_project(),
            &sample_strings(),
            &sample_cn1(),
            norm,
            Some(temp.path()),
        )
        .unwrap();

        assert_eq!(summary.norm_key, "IEC");
        assert_eq!(summary.strings.summary.succeeded, 6);
        assert!(summary.dataset.is_ok());
        assert_eq!(summary.cn1.results.len(), 1);
        assert_eq!(summary.cn1.results[0].parallel_strings, 6);
        // IEC plants run the IEC group only: voltage drop + temperature.
        assert_eq!(summary.validation.results.len(), 2);
        assert!(summary.validation.is_compliant());
        assert_eq!(summary.validation.score, 100.0);

        for file in [
            "string_runs.json",
            "cn1_runs.json",
            "validation.json",
            "dataset_findings.json",
        ] {
            let raw = std::fs::read_to_string(temp.path().join(file)).unwrap();
            let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
            assert_eq!(value["project"], "Planta Norte");
            assert_eq!(value["norm"], "IEC");
            assert!(value["schema"].is_object());
        }

        let strings_json: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(temp.path().join("string_runs.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(
            strings_json["data"]["results"].as_array().unwrap().len(),
            6
        );
    }
}
