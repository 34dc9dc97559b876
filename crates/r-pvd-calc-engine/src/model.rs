//! ---
//! pvd_section: "08-energy-models-optimization"
//! pvd_subsection: "module"
//! pvd_type: "source"
//! pvd_scope: "code"
//! pvd_description: "Sizing and validation routines for PV conductor runs."
//! pvd_version: "v0.0.0-prealpha"
//! pvd_owner: "tbd"
//! ---
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use r_pvd_common::CableMaterial;
use r_pvd_norms::{CircuitClass, EffectiveNorm, NormativeProfile};

/// Compliance status of one conductor run against its voltage-drop
/// limit.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RunStatus {
    Ok,
    Warning,
    Error,
}

/// Base quantities of one conductor run, before any derived field is
/// computed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ConductorBase {
    /// Nominal (already safety-factored) current in amperes.
    pub nominal_current_a: f32,
    /// Conductor length in meters. One-way when the evaluator runs
    /// with `round_trip`, already-total otherwise.
    pub length_m: f32,
    /// Selected commercial cross-section in mm².
    pub commercial_section_mm2: f32,
    /// System reference voltage in volts.
    pub reference_voltage_v: f32,
    /// Allowed voltage drop in volts. When absent it is derived from
    /// the correction factors' percentage limit.
    #[serde(default)]
    pub max_voltage_drop_v: Option<f32>,
}

/// Scalar multipliers and parameters affecting a conductor run.
///
/// Defaults come from the active normative profile; the what-if
/// simulator edits a transient copy and only an explicit save persists
/// anything.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CorrectionFactors {
    pub isc_safety_factor: f32,
    pub grouping_factor: f32,
    pub temperature_factor: f32,
    pub ambient_temp_c: f32,
    /// Conductor resistivity in Ω·mm²/m at the operating temperature.
    pub resistivity: f32,
    pub max_voltage_drop_pct: f32,
    pub parallel_strings: u32,
    pub cable_material: CableMaterial,
    /// Set when `length_m` is a one-way distance and the return
    /// conductor doubles the resistive path. Kept explicit so every
    /// call site resolves the factor-of-two the same way.
    #[serde(default)]
    pub round_trip: bool,
}

/// One electrical segment with every derived field computed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConductorRun {
    pub nominal_current_a: f32,
    pub adjusted_current_a: f32,
    pub length_m: f32,
    pub theoretical_section_mm2: f32,
    pub commercial_section_mm2: f32,
    pub resistance_ohm: f32,
    pub resistivity_ohm_mm2_per_m: f32,
    pub reference_voltage_v: f32,
    pub voltage_drop_v: f32,
    pub voltage_drop_pct: f32,
    pub max_voltage_drop_v: f32,
    pub joule_losses_w: f32,
    pub cable_material: CableMaterial,
    pub status: RunStatus,
}

/// Difference between a baseline run and a recomputed one after
/// parameter edits. Positive differences mean the edit improved the
/// run (baseline minus simulated).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SimulationDelta {
    pub current_diff: f32,
    pub section_diff: f32,
    pub voltage_drop_pct_diff: f32,
    pub status_changed: bool,
}

/// Severity of one validation rule outcome.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
    Success,
}

/// Outcome of one normative rule check. Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationResult {
    pub is_valid: bool,
    /// 0..100 contribution to the aggregate score.
    pub score: f32,
    pub severity: Severity,
    pub category: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

/// One row of the string take-off table (`dc_string_circuits`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StringCircuitRow {
    pub string_id: String,
    pub length_pos_m: f32,
    pub length_neg_m: f32,
    pub cn1_id: String,
    pub inverter_id: String,
}

/// One row of the combiner feeder table (`dc_cn1_circuits`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cn1CircuitRow {
    pub circuit_id: String,
    pub length_pos_m: f32,
    pub length_neg_m: f32,
    pub inverter_id: String,
}

/// PV module electrical data carried by the project spec.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PanelInfo {
    pub model: String,
    /// Short-circuit current at STC in amperes.
    pub isc_a: f32,
    /// Open-circuit voltage at STC in volts.
    pub voc_v: f32,
    pub power_stc_w: f32,
}

/// Project description loaded from disk alongside the take-off tables.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectSpec {
    pub name: String,
    pub panel: PanelInfo,
    /// Continuous rating of the selected DC cabling from its
    /// datasheet, used by the ampacity rule. When absent the rule runs
    /// against the margin itself and a warning marks the assumption.
    #[serde(default)]
    pub cable_ampacity_a: Option<f32>,
    /// Installed insulation class. When absent the class required by
    /// the system voltage is assumed.
    #[serde(default)]
    pub insulation_class: Option<crate::rules::InsulationClass>,
}

/// Sizing parameters for one batch: the resolved normative profile
/// plus the run-specific inputs that are not part of the profile.
#[derive(Debug, Clone)]
pub struct CalcParams {
    pub norm: EffectiveNorm,
    pub panel_isc_a: f32,
    /// Ambient override; the profile's design ambient applies when
    /// unset.
    pub ambient_temp_c: Option<f32>,
    /// Parallel circuit count used for the grouping factor lookup; the
    /// profile default applies when unset.
    pub parallel_circuits: Option<u32>,
}

impl CalcParams {
    pub fn new(norm: EffectiveNorm, panel_isc_a: f32) -> Self {
        Self {
            norm,
            panel_isc_a,
            ambient_temp_c: None,
            parallel_circuits: None,
        }
    }

    pub fn profile(&self) -> &NormativeProfile {
        &self.norm.profile
    }

    /// Ambient temperature in effect for current correction and
    /// resistivity.
    pub fn ambient_c(&self) -> f32 {
        self.ambient_temp_c
            .unwrap_or(self.profile().temperature_correction.ambient_design_c)
    }

    /// Parallel circuit count in effect for the grouping lookup.
    pub fn circuits(&self) -> u32 {
        self.parallel_circuits
            .unwrap_or(self.profile().correction_factors.parallel_strings)
            .max(1)
    }

    /// Assemble the correction factor set the evaluator consumes,
    /// resolving the temperature, grouping, and resistivity lookups
    /// against the profile. `round_trip` is set: take-off tables carry
    /// one-way positive/negative conductor lengths.
    pub fn correction_factors(&self) -> CorrectionFactors {
        let profile = self.profile();
        let ambient = self.ambient_c();
        let temperature_factor = profile.temperature_correction.factor_for(ambient);
        let grouping_factor = profile.grouping_factors.factor_for(
            profile.installation.method,
            profile.installation.layout,
            self.circuits(),
        );
        CorrectionFactors {
            isc_safety_factor: profile.correction_factors.isc_safety_factor,
            grouping_factor,
            temperature_factor,
            ambient_temp_c: ambient,
            resistivity: profile.cable.material.resistivity_at(ambient),
            max_voltage_drop_pct: profile.voltage_drop.max_percentage,
            parallel_strings: self.circuits(),
            cable_material: profile.cable.material,
            round_trip: true,
        }
    }

    /// Section table for a circuit class, as an error when the profile
    /// lacks one.
    pub fn sections_for(&self, class: CircuitClass) -> crate::errors::Result<&[f32]> {
        self.profile()
            .sections_for(class)
            .map(|table| table.mm2.as_slice())
            .filter(|mm2| !mm2.is_empty())
            .ok_or(crate::errors::CalcEngineError::EmptySectionTable(class))
    }
}
