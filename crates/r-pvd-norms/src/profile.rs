//! ---
//! pvd_section: "04-configuration-orchestration"
//! pvd_subsection: "module"
//! pvd_type: "source"
//! pvd_scope: "code"
//! pvd_description: "Normative profile loading and project override handling."
//! pvd_version: "v0.0.0-prealpha"
//! pvd_owner: "tbd"
//! ---
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::warn;

use r_pvd_common::CableMaterial;

/// Circuit classes a plant take-off is split into. Each class carries
/// its own commercial section table in the profile.
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    PartialOrd,
    Ord,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CircuitClass {
    DcStrings,
    Cn1Inverter,
    #[serde(rename = "level_1_dc")]
    #[strum(serialize = "level_1_dc")]
    Level1Dc,
    AcCircuits,
    MvCircuits,
}

/// Cable installation method, selects the grouping factor table.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InstallationMethod {
    Buried,
    TrayPerforated,
    TrayNonPerforated,
    Conduit,
}

/// Cable layout for buried installations.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InstallationLayout {
    SingleLayer,
    Multilayer,
}

/// Normative safety factors applied before current correction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CorrectionFactorsSpec {
    /// Multiplier on the module Isc mandated by the standard (1.25 in
    /// both IEC 60364-7-712 and NEC 690.8).
    pub isc_safety_factor: f32,
    /// Default number of parallel strings per calculation.
    pub parallel_strings: u32,
}

/// Cable construction defaults for the profile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CableDefaults {
    pub material: CableMaterial,
    pub insulation: String,
    /// Maximum conductor temperature in °C.
    pub max_temp_c: f32,
}

/// Installation defaults for the profile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InstallationSpec {
    pub method: InstallationMethod,
    #[serde(default)]
    pub layout: Option<InstallationLayout>,
    /// Burial depth in cm, only meaningful for `buried`.
    #[serde(default)]
    pub depth_cm: Option<f32>,
}

/// Ambient temperature correction: design ambient plus the
/// ambient-to-factor table, keyed by integer °C.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TemperatureCorrection {
    pub ambient_design_c: f32,
    pub values: IndexMap<String, f32>,
}

impl TemperatureCorrection {
    /// Factor for the given ambient temperature. An ambient missing
    /// from the table resolves to 1.0, matching how the standards
    /// tabulate only discrete design temperatures.
    pub fn factor_for(&self, ambient_c: f32) -> f32 {
        let key = format!("{}", ambient_c.round() as i64);
        self.values.get(&key).copied().unwrap_or(1.0)
    }
}

/// One grouping factor table: circuit count (or overflow bucket such as
/// `"10+"`) to derating factor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FactorTable {
    pub values: IndexMap<String, f32>,
}

impl FactorTable {
    fn lookup(&self, circuits: u32) -> f32 {
        if let Some(factor) = self.values.get(&circuits.to_string()) {
            return *factor;
        }
        for (bucket, threshold) in [("10+", 10), ("6+", 6), ("4+", 4)] {
            if circuits >= threshold {
                if let Some(factor) = self.values.get(bucket) {
                    return *factor;
                }
            }
        }
        1.0
    }
}

/// Grouping table for one installation method: either a flat table or,
/// for buried runs, one table per layout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MethodGrouping {
    ByLayout(IndexMap<InstallationLayout, FactorTable>),
    Flat(FactorTable),
}

/// Grouping derating factors keyed by installation method.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(transparent)]
pub struct GroupingFactors(pub IndexMap<InstallationMethod, MethodGrouping>);

impl GroupingFactors {
    /// Resolve the grouping factor for the given installation and
    /// parallel circuit count. A method missing from the tables keeps
    /// the nameplate rating (factor 1.0) and is logged as degraded.
    pub fn factor_for(
        &self,
        method: InstallationMethod,
        layout: Option<InstallationLayout>,
        circuits: u32,
    ) -> f32 {
        match self.0.get(&method) {
            Some(MethodGrouping::Flat(table)) => table.lookup(circuits),
            Some(MethodGrouping::ByLayout(layouts)) => {
                let layout = layout.unwrap_or(InstallationLayout::SingleLayer);
                match layouts.get(&layout) {
                    Some(table) => table.lookup(circuits),
                    None => {
                        warn!(
                            "no grouping table for {method}/{layout}, keeping factor 1.0"
                        );
                        1.0
                    }
                }
            }
            None => {
                warn!("no grouping table for installation method {method}, keeping factor 1.0");
                1.0
            }
        }
    }
}

/// Voltage drop limits of the profile.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct VoltageDropSpec {
    /// Maximum allowed drop in percent of the reference voltage.
    pub max_percentage: f32,
    /// System reference voltage in volts.
    pub reference_voltage_v: f32,
}

/// Commercial conductor sections available for one circuit class.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SectionTable {
    /// Ascending standard cross-sections in mm².
    pub mm2: Vec<f32>,
    #[serde(default)]
    pub description: String,
}

/// One named normative profile (IEC, NEC, or a custom standard).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NormativeProfile {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub country: String,
    pub correction_factors: CorrectionFactorsSpec,
    pub cable: CableDefaults,
    pub installation: InstallationSpec,
    pub temperature_correction: TemperatureCorrection,
    pub grouping_factors: GroupingFactors,
    pub voltage_drop: VoltageDropSpec,
    pub standard_sections: IndexMap<CircuitClass, SectionTable>,
}

impl NormativeProfile {
    /// Ascending section table for a circuit class, if the profile
    /// defines one.
    pub fn sections_for(&self, class: CircuitClass) -> Option<&SectionTable> {
        self.standard_sections.get(&class)
    }

    /// Maximum voltage drop expressed in volts at the reference voltage.
    pub fn max_voltage_drop_v(&self) -> f32 {
        self.voltage_drop.reference_voltage_v * (self.voltage_drop.max_percentage / 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(entries: &[(&str, f32)]) -> FactorTable {
        FactorTable {
            values: entries
                .iter()
                .map(|(k, v)| ((*k).to_owned(), *v))
                .collect(),
        }
    }

    #[test]
    fn grouping_overflow_buckets_apply_in_order() {
        let table = table(&[("1", 1.0), ("2", 0.85), ("4+", 0.7), ("10+", 0.6)]);
        assert_eq!(table.lookup(1), 1.0);
        assert_eq!(table.lookup(2), 0.85);
        // 3 matches no exact entry and no bucket threshold it reaches.
        assert_eq!(table.lookup(3), 1.0);
        assert_eq!(table.lookup(5), 0.7);
        assert_eq!(table.lookup(12), 0.6);
    }

    #[test]
    fn missing_method_degrades_to_unity() {
        let grouping = GroupingFactors::default();
        assert_eq!(
            grouping.factor_for(InstallationMethod::Conduit, None, 4),
            1.0
        );
    }

    #[test]
    fn buried_layout_selects_its_table() {
        let mut layouts = IndexMap::new();
        layouts.insert(InstallationLayout::SingleLayer, table(&[("2", 0.9)]));
        layouts.insert(InstallationLayout::Multilayer, table(&[("2", 0.8)]));
        let mut methods = IndexMap::new();
        methods.insert(
            InstallationMethod::Buried,
            MethodGrouping::ByLayout(layouts),
        );
        let grouping = GroupingFactors(methods);

        assert_eq!(
            grouping.factor_for(
                InstallationMethod::Buried,
                Some(InstallationLayout::Multilayer),
                2
            ),
            0.8
        );
        // Layout defaults to single_layer when unspecified.
        assert_eq!(
            grouping.factor_for(InstallationMethod::Buried, None, 2),
            0.9
        );
    }

    #[test]
    fn temperature_factor_falls_back_to_unity() {
        let correction = TemperatureCorrection {
            ambient_design_c: 30.0,
            values: [("30".to_owned(), 1.0), ("40".to_owned(), 0.87)]
                .into_iter()
                .collect(),
        };
        assert_eq!(correction.factor_for(40.0), 0.87);
        assert_eq!(correction.factor_for(33.0), 1.0);
    }
}
