//! ---
//! pvd_section: "01-core-functionality"
//! pvd_subsection: "module"
//! pvd_type: "source"
//! pvd_scope: "code"
//! pvd_description: "Shared domain primitives for conductor sizing."
//! pvd_version: "v0.0.0-prealpha"
//! pvd_owner: "tbd"
//! ---
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Conductor material of a DC cable run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CableMaterial {
    Copper,
    #[serde(alias = "aluminium")]
    #[strum(to_string = "aluminum", serialize = "aluminium")]
    Aluminum,
}

/// Electrical properties of a conductor material at the 20 °C reference.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MaterialProperties {
    /// Resistivity at 20 °C in Ω·mm²/m.
    pub resistivity_20c: f32,
    /// Linear temperature coefficient in 1/°C.
    pub temp_coefficient: f32,
}

impl CableMaterial {
    /// Reference properties for the material.
    ///
    /// Copper 0.01724 Ω·mm²/m and aluminum 0.0282 Ω·mm²/m are the
    /// annealed-conductor values used for sizing, not the pure-metal
    /// laboratory figures.
    pub fn properties(self) -> MaterialProperties {
        match self {
            CableMaterial::Copper => MaterialProperties {
                resistivity_20c: 0.01724,
                temp_coefficient: 0.00393,
            },
            CableMaterial::Aluminum => MaterialProperties {
                resistivity_20c: 0.0282,
                temp_coefficient: 0.00403,
            },
        }
    }

    /// Resistivity in Ω·mm²/m corrected to the operating temperature:
    /// `ρ(T) = ρ20 · (1 + α · (T − 20))`.
    pub fn resistivity_at(self, temp_operating_c: f32) -> f32 {
        let props = self.properties();
        props.resistivity_20c * (1.0 + props.temp_coefficient * (temp_operating_c - 20.0))
    }
}
