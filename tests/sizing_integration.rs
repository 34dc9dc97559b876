//! ---
//! pvd_section: "15-testing-qa-runbook"
//! pvd_subsection: "integration-test"
//! pvd_type: "source"
//! pvd_scope: "code"
//! pvd_description: "Cross-crate integration of catalog, pipeline, and simulator."
//! pvd_version: "v0.0.0-prealpha"
//! pvd_owner: "tbd"
//! ---
use std::fs;

use r_pvd_calc_engine::{
    analyze_project_with_options,
    model::{
        CalcParams, Cn1CircuitRow, ConductorBase, PanelInfo, ProjectSpec, RunStatus,
        StringCircuitRow,
    },
    simulation::{SimParameter, Simulator},
    standards_for_norm,
};
use r_pvd_norms::{builtin_catalog, effective_profile, NormativeCatalog};
use tempfile::tempdir;

fn sample_project() -> ProjectSpec {
    ProjectSpec {
        name: "Planta Oeste".to_owned(),
        panel: PanelInfo {
            model: "TOPCon-580".to_owned(),
            isc_a: 14.4,
            voc_v: 51.2,
            power_stc_w: 580.0,
        },
        cable_ampacity_a: Some(300.0),
        insulation_class: None,
    }
}

fn sample_strings() -> Vec<StringCircuitRow> {
    (1..=10)
        .map(|i| StringCircuitRow {
            string_id: format!("str-01-{i:02}-CN1-01-01"),
            length_pos_m: 22.0 + i as f32,
            length_neg_m: 21.0 + i as f32,
            cn1_id: "CN1-01".to_owned(),
            inverter_id: "INV-1".to_owned(),
        })
        .collect()
}

fn sample_cn1() -> Vec<Cn1CircuitRow> {
    vec![Cn1CircuitRow {
        circuit_id: "cn1-1".to_owned(),
        length_pos_m: 95.0,
        length_neg_m: 95.0,
        inverter_id: "INV-1".to_owned(),
    }]
}

#[test]
fn nec_pipeline_runs_the_equipment_standards() {
    let temp = tempdir().expect("temp dir");
    let norm = effective_profile(builtin_catalog(), "NEC", None).expect("profile");

    let summary = analyze_project_with_options(
        &sample_project(),
        &sample_strings(),
        &sample_cn1(),
        norm,
        Some(temp.path()),
    )
    .expect("analysis");

    assert_eq!(summary.norm_key, "NEC");
    // NEC runs the protection, ampacity, insulation, and voltage rules.
    assert_eq!(summary.validation.results.len(), 4);
    // A 1000 V NEC plant stays inside the UL equipment ceiling.
    assert!(summary.validation.is_compliant());
    assert!(summary
        .strings
        .results
        .iter()
        .all(|r| r.run.status == RunStatus::Ok));
}

#[test]
fn custom_catalog_profile_drives_the_pipeline() {
    let temp = tempdir().expect("temp dir");

    // A stricter in-house profile derived from IEC.
    let mut catalog: NormativeCatalog = builtin_catalog().clone();
    let mut custom = catalog.normatives["IEC"].clone();
    custom.name = "In-house DC sizing".to_owned();
    custom.voltage_drop.max_percentage = 1.0;
    catalog.normatives.insert("CUSTOM".to_owned(), custom);
    let catalog_path = temp.path().join("normativas.yaml");
    fs::write(&catalog_path, serde_yaml::to_string(&catalog).unwrap()).unwrap();
    let catalog = NormativeCatalog::load(&catalog_path).expect("catalog");

    let stock = effective_profile(&catalog, "IEC", None).expect("stock profile");
    let custom = effective_profile(&catalog, "CUSTOM", None).expect("custom profile");
    assert_eq!(custom.norm_key, "CUSTOM");
    // Custom profiles run every standard group.
    assert_eq!(standards_for_norm(&custom.norm_key).len(), 3);

    let stock_summary = analyze_project_with_options(
        &sample_project(),
        &sample_strings(),
        &sample_cn1(),
        stock,
        Some(&temp.path().join("stock")),
    )
    .expect("stock analysis");
    let custom_summary = analyze_project_with_options(
        &sample_project(),
        &sample_strings(),
        &sample_cn1(),
        custom,
        Some(&temp.path().join("custom")),
    )
    .expect("custom analysis");

    let max_section = |summary: &r_pvd_calc_engine::AnalysisSummary| {
        summary
            .strings
            .results
            .iter()
            .map(|r| r.run.commercial_section_mm2)
            .fold(0.0f32, f32::max)
    };
    assert!(max_section(&custom_summary) > max_section(&stock_summary));
}

#[test]
fn simulator_round_trips_a_pipeline_result() {
    let norm = effective_profile(builtin_catalog(), "IEC", None).expect("profile");
    let params = CalcParams::new(norm, 14.4);
    let factors = params.correction_factors();

    let temp = tempdir().expect("temp dir");
    let summary = analyze_project_with_options(
        &sample_project(),
        &sample_strings(),
        &sample_cn1(),
        params.norm.clone(),
        Some(temp.path()),
    )
    .expect("analysis");
    let sized = &summary.strings.results[0];

    // Re-open the sized run in the what-if controller.
    let base = ConductorBase {
        nominal_current_a: sized.run.nominal_current_a,
        length_m: sized.length_total_m,
        commercial_section_mm2: sized.run.commercial_section_mm2,
        reference_voltage_v: sized.run.reference_voltage_v,
        max_voltage_drop_v: Some(sized.run.max_voltage_drop_v),
    };
    let mut simulator = Simulator::new(base, factors).expect("simulator");

    // Unedited recompute reproduces the pipeline result exactly.
    let outcome = simulator.recompute().expect("recompute");
    assert_eq!(outcome.delta.voltage_drop_pct_diff, 0.0);
    assert!(!outcome.delta.status_changed);
    assert_eq!(
        outcome.simulated.voltage_drop_pct,
        sized.run.voltage_drop_pct
    );

    // Moving to aluminum resistivity worsens the drop.
    let aluminum_rho = r_pvd_common::CableMaterial::Aluminum.resistivity_at(30.0);
    simulator.set_parameter(SimParameter::Resistivity, aluminum_rho);
    let degraded = simulator.recompute().expect("recompute");
    assert!(degraded.delta.voltage_drop_pct_diff < 0.0);
}
