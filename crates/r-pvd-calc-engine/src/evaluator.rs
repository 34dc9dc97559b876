//! ---
//! pvd_section: "08-energy-models-optimization"
//! pvd_subsection: "module"
//! pvd_type: "source"
//! pvd_scope: "code"
//! pvd_description: "Sizing and validation routines for PV conductor runs."
//! pvd_version: "v0.0.0-prealpha"
//! pvd_owner: "tbd"
//! ---
//! Electrical formula evaluator.
//!
//! Pure computation of one conductor run's derived fields from its base
//! quantities and correction factors. No side effects, no I/O; the
//! same inputs always produce the same [`ConductorRun`].

use crate::errors::{CalcEngineError, Result};
use crate::model::{ConductorBase, ConductorRun, CorrectionFactors, RunStatus};

/// Runs whose drop exceeds the limit by up to this ratio are flagged
/// as warnings rather than errors.
const WARNING_TOLERANCE: f32 = 1.1;

/// Compute every derived field of a conductor run.
///
/// Units are amperes, meters, mm², ohms, and volts throughout. When
/// `factors.round_trip` is set, `length_m` is a one-way distance and
/// the return conductor doubles the resistive path in both the
/// theoretical-section and resistance formulas.
pub fn compute_conductor_run(
    base: &ConductorBase,
    factors: &CorrectionFactors,
) -> Result<ConductorRun> {
    require_positive("commercial_section_mm2", base.commercial_section_mm2)?;
    require_positive("reference_voltage_v", base.reference_voltage_v)?;
    require_positive("max_voltage_drop_pct", factors.max_voltage_drop_pct)?;

    let max_voltage_drop_v = match base.max_voltage_drop_v {
        Some(value) => value,
        None => base.reference_voltage_v * (factors.max_voltage_drop_pct / 100.0),
    };

    let adjusted_current_a = adjusted_current(base.nominal_current_a, factors)?;
    let theoretical_section_mm2 = theoretical_section(
        base.nominal_current_a,
        base.length_m,
        factors,
        max_voltage_drop_v,
    )?;

    let path_factor = if factors.round_trip { 2.0 } else { 1.0 };
    let resistance_ohm =
        (path_factor * factors.resistivity * base.length_m) / base.commercial_section_mm2;
    let voltage_drop_v = resistance_ohm * adjusted_current_a;
    let voltage_drop_pct = (voltage_drop_v / base.reference_voltage_v) * 100.0;
    let joule_losses_w = adjusted_current_a * adjusted_current_a * resistance_ohm;

    Ok(ConductorRun {
        nominal_current_a: base.nominal_current_a,
        adjusted_current_a,
        length_m: base.length_m,
        theoretical_section_mm2,
        commercial_section_mm2: base.commercial_section_mm2,
        resistance_ohm,
        resistivity_ohm_mm2_per_m: factors.resistivity,
        reference_voltage_v: base.reference_voltage_v,
        voltage_drop_v,
        voltage_drop_pct,
        max_voltage_drop_v,
        joule_losses_w,
        cable_material: factors.cable_material,
        status: run_status(voltage_drop_pct, factors.max_voltage_drop_pct),
    })
}

/// Adjusted (derated) current after temperature and grouping
/// correction.
pub fn adjusted_current(nominal_current_a: f32, factors: &CorrectionFactors) -> Result<f32> {
    require_non_negative("nominal_current_a", nominal_current_a)?;
    require_positive("temperature_factor", factors.temperature_factor)?;
    require_positive("grouping_factor", factors.grouping_factor)?;
    Ok(nominal_current_a / (factors.temperature_factor * factors.grouping_factor))
}

/// Theoretical minimum cross-section in mm² for a run to stay within
/// the allowed voltage drop.
pub fn theoretical_section(
    nominal_current_a: f32,
    length_m: f32,
    factors: &CorrectionFactors,
    max_voltage_drop_v: f32,
) -> Result<f32> {
    require_positive("length_m", length_m)?;
    require_positive("resistivity", factors.resistivity)?;
    require_positive("max_voltage_drop_v", max_voltage_drop_v)?;
    let adjusted = adjusted_current(nominal_current_a, factors)?;
    let path_factor = if factors.round_trip { 2.0 } else { 1.0 };
    Ok((path_factor * factors.resistivity * length_m * adjusted) / max_voltage_drop_v)
}

/// Status of a run given its voltage drop percentage and the limit.
pub fn run_status(voltage_drop_pct: f32, max_voltage_drop_pct: f32) -> RunStatus {
    if voltage_drop_pct <= max_voltage_drop_pct {
        RunStatus::Ok
    } else if voltage_drop_pct <= max_voltage_drop_pct * WARNING_TOLERANCE {
        RunStatus::Warning
    } else {
        RunStatus::Error
    }
}

fn require_positive(field: &'static str, value: f32) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(CalcEngineError::invalid(field, value))
    }
}

fn require_non_negative(field: &'static str, value: f32) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(CalcEngineError::invalid(field, value))
    }
}
