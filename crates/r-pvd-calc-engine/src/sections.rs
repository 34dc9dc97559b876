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
use tracing::{debug, warn};

use r_pvd_norms::CircuitClass;

use crate::errors::{CalcEngineError, Result};

/// Outcome of picking a commercial section for a theoretical minimum.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SectionSelection {
    pub section_mm2: f32,
    /// Set when no standard section covered the theoretical minimum
    /// and the largest available one was used instead. A clamped run
    /// needs a redesign: parallel conductors or a shorter route.
    pub clamped: bool,
}

/// Select the smallest standard section that meets or exceeds the
/// theoretical minimum. `sections` must be ascending (catalog load
/// guarantees it).
pub fn commercial_section(
    theoretical_mm2: f32,
    sections: &[f32],
    class: CircuitClass,
) -> Result<SectionSelection> {
    if sections.is_empty() {
        return Err(CalcEngineError::EmptySectionTable(class));
    }
    for &section in sections {
        if section >= theoretical_mm2 {
            debug!(
                "selected {section} mm² for theoretical {theoretical_mm2:.3} mm² ({class})"
            );
            return Ok(SectionSelection {
                section_mm2: section,
                clamped: false,
            });
        }
    }
    let largest = *sections.last().unwrap_or(&0.0);
    warn!(
        "theoretical section {theoretical_mm2:.3} mm² exceeds largest available {largest} mm² for {class}, clamping"
    );
    Ok(SectionSelection {
        section_mm2: largest,
        clamped: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: [f32; 5] = [4.0, 6.0, 10.0, 16.0, 25.0];

    #[test]
    fn selects_next_larger_section() {
        let selection =
            commercial_section(5.2, &TABLE, CircuitClass::DcStrings).unwrap();
        assert_eq!(selection.section_mm2, 6.0);
        assert!(!selection.clamped);
    }

    #[test]
    fn exact_match_is_not_rounded_up() {
        let selection =
            commercial_section(10.0, &TABLE, CircuitClass::DcStrings).unwrap();
        assert_eq!(selection.section_mm2, 10.0);
        assert!(!selection.clamped);
    }

    #[test]
    fn oversize_demand_clamps_to_largest() {
        let selection =
            commercial_section(40.0, &TABLE, CircuitClass::Cn1Inverter).unwrap();
        assert_eq!(selection.section_mm2, 25.0);
        assert!(selection.clamped);
    }

    #[test]
    fn empty_table_is_an_error() {
        assert!(matches!(
            commercial_section(1.0, &[], CircuitClass::AcCircuits),
            Err(CalcEngineError::EmptySectionTable(CircuitClass::AcCircuits))
        ));
    }
}
