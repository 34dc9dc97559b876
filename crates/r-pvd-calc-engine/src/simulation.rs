//! ---
//! pvd_section: "08-energy-models-optimization"
//! pvd_subsection: "module"
//! pvd_type: "source"
//! pvd_scope: "code"
//! pvd_description: "Sizing and validation routines for PV conductor runs."
//! pvd_version: "v0.0.0-prealpha"
//! pvd_owner: "tbd"
//! ---
//! What-if simulation controller.
//!
//! Holds an editable copy of the correction factors for one baseline
//! run. Edits are transient: nothing recomputes until asked, nothing
//! persists unless the caller saves the factors through the norms
//! crate. Everything here is synchronous and in-memory.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::errors::Result;
use crate::evaluator::compute_conductor_run;
use crate::model::{ConductorBase, ConductorRun, CorrectionFactors, SimulationDelta};

/// Editable parameter keys of the simulation session.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SimParameter {
    IscSafetyFactor,
    GroupingFactor,
    TemperatureFactor,
    AmbientTempC,
    Resistivity,
    MaxVoltageDropPct,
    ParallelStrings,
}

/// One recomputation: the simulated run and its delta to the baseline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulationOutcome {
    pub simulated: ConductorRun,
    pub delta: SimulationDelta,
}

/// In-memory what-if session over one conductor run.
#[derive(Debug, Clone)]
pub struct Simulator {
    base: ConductorBase,
    baseline: ConductorRun,
    saved: CorrectionFactors,
    working: CorrectionFactors,
    dirty: bool,
    last_delta: Option<SimulationDelta>,
}

impl Simulator {
    /// Open a session: the baseline run is computed once from the
    /// last-saved factors and kept for delta comparison.
    pub fn new(base: ConductorBase, factors: CorrectionFactors) -> Result<Self> {
        let baseline = compute_conductor_run(&base, &factors)?;
        Ok(Self {
            base,
            baseline,
            saved: factors,
            working: factors,
            dirty: false,
            last_delta: None,
        })
    }

    pub fn baseline(&self) -> &ConductorRun {
        &self.baseline
    }

    /// The current (possibly edited) factor set.
    pub fn factors(&self) -> &CorrectionFactors {
        &self.working
    }

    /// Whether the session has edits that have not been recomputed or
    /// reset.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn last_delta(&self) -> Option<SimulationDelta> {
        self.last_delta
    }

    /// Stage one parameter edit. No recomputation happens until
    /// [`Simulator::recompute`] is called.
    pub fn set_parameter(&mut self, parameter: SimParameter, value: f32) {
        match parameter {
            SimParameter::IscSafetyFactor => self.working.isc_safety_factor = value,
            SimParameter::GroupingFactor => self.working.grouping_factor = value,
            SimParameter::TemperatureFactor => self.working.temperature_factor = value,
            SimParameter::AmbientTempC => self.working.ambient_temp_c = value,
            SimParameter::Resistivity => self.working.resistivity = value,
            SimParameter::MaxVoltageDropPct => self.working.max_voltage_drop_pct = value,
            SimParameter::ParallelStrings => {
                self.working.parallel_strings = value.max(1.0).round() as u32
            }
        }
        self.dirty = true;
    }

    /// Re-run the evaluator with the working factors and diff against
    /// the baseline. Positive differences mean the edit improved the
    /// run. Calling twice without edits yields identical outcomes.
    pub fn recompute(&mut self) -> Result<SimulationOutcome> {
        let simulated = compute_conductor_run(&self.base, &self.working)?;
        let delta = SimulationDelta {
            current_diff: self.baseline.adjusted_current_a - simulated.adjusted_current_a,
            section_diff: self.baseline.theoretical_section_mm2
                - simulated.theoretical_section_mm2,
            voltage_drop_pct_diff: self.baseline.voltage_drop_pct - simulated.voltage_drop_pct,
            status_changed: self.baseline.status != simulated.status,
        };
        self.last_delta = Some(delta);
        Ok(SimulationOutcome { simulated, delta })
    }

    /// Discard edits: restore the last-saved factors and clear the
    /// computed delta.
    pub fn reset(&mut self) {
        self.working = self.saved;
        self.dirty = false;
        self.last_delta = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RunStatus;
    use r_pvd_common::CableMaterial;

    fn session() -> Simulator {
        let base = ConductorBase {
            nominal_current_a: 10.0,
            length_m: 100.0,
            commercial_section_mm2: 6.0,
            reference_voltage_v: 600.0,
            max_voltage_drop_v: None,
        };
        let factors = CorrectionFactors {
            isc_safety_factor: 1.25,
            grouping_factor: 1.0,
            temperature_factor: 1.0,
            ambient_temp_c: 40.0,
            resistivity: 0.018595,
            max_voltage_drop_pct: 3.0,
            parallel_strings: 1,
            cable_material: CableMaterial::Copper,
            round_trip: false,
        };
        Simulator::new(base, factors).unwrap()
    }

    #[test]
    fn unchanged_factors_yield_zero_delta() {
        let mut sim = session();
        let outcome = sim.recompute().unwrap();

        assert_eq!(outcome.delta.voltage_drop_pct_diff, 0.0);
        assert_eq!(outcome.delta.current_diff, 0.0);
        assert_eq!(outcome.delta.section_diff, 0.0);
        assert!(!outcome.delta.status_changed);
        assert_eq!(&outcome.simulated, sim.baseline());
    }

    #[test]
    fn recompute_is_deterministic() {
        let mut sim = session();
        sim.set_parameter(SimParameter::TemperatureFactor, 0.87);
        let first = sim.recompute().unwrap();
        let second = sim.recompute().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn edits_stage_without_recomputing() {
        let mut sim = session();
        assert!(!sim.is_dirty());
        sim.set_parameter(SimParameter::GroupingFactor, 0.8);
        assert!(sim.is_dirty());
        assert!(sim.last_delta().is_none());
    }

    #[test]
    fn derating_edit_worsens_the_drop() {
        let mut sim = session();
        sim.set_parameter(SimParameter::TemperatureFactor, 0.8);
        let outcome = sim.recompute().unwrap();

        // Lower temperature factor raises the adjusted current, so the
        // simulated drop is larger: negative diff means degradation.
        assert!(outcome.delta.voltage_drop_pct_diff < 0.0);
        assert!(outcome.delta.current_diff < 0.0);
        assert!(outcome.simulated.adjusted_current_a > sim.baseline().adjusted_current_a);
    }

    #[test]
    fn status_change_is_flagged() {
        let mut sim = session();
        assert_eq!(sim.baseline().status, RunStatus::Ok);
        // A deep derate pushes the run far over its 3 % limit.
        sim.set_parameter(SimParameter::TemperatureFactor, 0.1);
        let outcome = sim.recompute().unwrap();
        assert_eq!(outcome.simulated.status, RunStatus::Error);
        assert!(outcome.delta.status_changed);
    }

    #[test]
    fn reset_restores_saved_factors() {
        let mut sim = session();
        let saved = *sim.factors();
        sim.set_parameter(SimParameter::Resistivity, 0.0282);
        sim.set_parameter(SimParameter::ParallelStrings, 6.0);
        sim.recompute().unwrap();

        sim.reset();

        assert_eq!(sim.factors(), &saved);
        assert!(!sim.is_dirty());
        assert!(sim.last_delta().is_none());

        let outcome = sim.recompute().unwrap();
        assert_eq!(outcome.delta.voltage_drop_pct_diff, 0.0);
        assert!(!outcome.delta.status_changed);
    }

    #[test]
    fn invalid_edit_surfaces_through_recompute() {
        let mut sim = session();
        sim.set_parameter(SimParameter::GroupingFactor, 0.0);
        assert!(sim.recompute().is_err());
        sim.reset();
        assert!(sim.recompute().is_ok());
    }
}
