//! ---
//! pvd_section: "08-energy-models-optimization"
//! pvd_subsection: "module"
//! pvd_type: "source"
//! pvd_scope: "code"
//! pvd_description: "Sizing and validation routines for PV conductor runs."
//! pvd_version: "v0.0.0-prealpha"
//! pvd_owner: "tbd"
//! ---
//! Normative validation rule set.
//!
//! A fixed list of independent checks grouped per standard. The caller
//! picks which standards are active; every rule of every active group
//! runs and reports, never short-circuiting, so the operator always
//! sees the complete compliance picture. A rule that cannot evaluate
//! (bad snapshot data) degrades to an error-severity result instead of
//! aborting the batch.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::errors::{CalcEngineError, Result};
use crate::model::{Severity, ValidationResult};

/// Insulation class of the installed DC cabling.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InsulationClass {
    ClassI,
    ClassII,
}

/// Snapshot of the electrical state one validation pass runs against.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ElectricalParameters {
    pub voltage_drop_pct: f32,
    pub operating_temp_c: f32,
    /// Short-circuit current the protective gear must clear, in A.
    pub short_circuit_current_a: f32,
    pub nominal_current_a: f32,
    /// Continuous rating of the installed cable, in A.
    pub cable_ampacity_a: f32,
    pub system_voltage_v: f32,
    pub insulation_class: InsulationClass,
}

/// Standard-specific business constants. These are configuration, not
/// derived values; the defaults mirror the published limits.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RuleThresholds {
    pub voltage_drop_error_pct: f32,
    pub voltage_drop_warning_pct: f32,
    pub operating_temp_error_c: f32,
    pub operating_temp_warning_c: f32,
    /// Current margin applied to both the short-circuit and ampacity
    /// checks (the 125 % rule).
    pub current_margin: f32,
    /// System voltage above which class II insulation is required.
    pub class_ii_threshold_v: f32,
    /// Maximum system voltage the equipment standard accepts.
    pub max_system_voltage_v: f32,
}

impl Default for RuleThresholds {
    fn default() -> Self {
        Self {
            voltage_drop_error_pct: 3.0,
            voltage_drop_warning_pct: 2.0,
            operating_temp_error_c: 85.0,
            operating_temp_warning_c: 70.0,
            current_margin: 1.25,
            class_ii_threshold_v: 600.0,
            max_system_voltage_v: 1000.0,
        }
    }
}

/// Normative standards the rule set is grouped by.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString, EnumIter,
)]
pub enum NormStandard {
    #[strum(to_string = "IEC 60364-7-712", serialize = "iec")]
    Iec60364,
    #[strum(to_string = "NEC 690", serialize = "nec")]
    Nec690,
    #[strum(to_string = "UL 1741", serialize = "ul1741")]
    Ul1741,
}

type RuleCheck = fn(&ElectricalParameters, &RuleThresholds) -> Result<ValidationResult>;

struct NormRule {
    name: &'static str,
    check: RuleCheck,
}

impl NormStandard {
    fn rules(self) -> &'static [NormRule] {
        match self {
            NormStandard::Iec60364 => &[
                NormRule {
                    name: "voltage_drop",
                    check: voltage_drop_rule,
                },
                NormRule {
                    name: "operating_temperature",
                    check: operating_temperature_rule,
                },
            ],
            NormStandard::Nec690 => &[
                NormRule {
                    name: "short_circuit_margin",
                    check: short_circuit_margin_rule,
                },
                NormRule {
                    name: "cable_ampacity",
                    check: cable_ampacity_rule,
                },
            ],
            NormStandard::Ul1741 => &[
                NormRule {
                    name: "insulation_class",
                    check: insulation_class_rule,
                },
                NormRule {
                    name: "system_voltage",
                    check: system_voltage_rule,
                },
            ],
        }
    }
}

/// Full outcome of one validation pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationReport {
    pub results: Vec<ValidationResult>,
    /// Arithmetic mean of the result scores, 0 when nothing ran. The
    /// score is informational; no rule blocks another.
    pub score: f32,
}

impl ValidationReport {
    pub fn is_compliant(&self) -> bool {
        self.results.iter().all(|r| r.severity != Severity::Error)
    }
}

/// Run every rule of the active standards, preserving standard order
/// then rule order. Rule failures are converted to error-severity
/// results so the report is always complete.
pub fn evaluate_rules(
    standards: &[NormStandard],
    params: &ElectricalParameters,
    thresholds: &RuleThresholds,
) -> ValidationReport {
    let mut results = Vec::new();
    for standard in standards {
        for rule in standard.rules() {
            let result = (rule.check)(params, thresholds).unwrap_or_else(|err| ValidationResult {
                is_valid: false,
                score: 0.0,
                severity: Severity::Error,
                category: "Evaluación".to_owned(),
                message: format!("rule '{}' could not be evaluated: {err}", rule.name),
                recommendation: Some("review the input snapshot for invalid values".to_owned()),
                reference: Some(standard.to_string()),
            });
            results.push(result);
        }
    }

    let score = if results.is_empty() {
        0.0
    } else {
        results.iter().map(|r| r.score).sum::<f32>() / results.len() as f32
    };

    ValidationReport { results, score }
}

fn require_finite(field: &'static str, value: f32) -> Result<f32> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CalcEngineError::invalid(field, value))
    }
}

fn passing(category: &str, message: String, reference: &str) -> ValidationResult {
    ValidationResult {
        is_valid: true,
        score: 100.0,
        severity: Severity::Success,
        category: category.to_owned(),
        message,
        recommendation: None,
        reference: Some(reference.to_owned()),
    }
}

fn voltage_drop_rule(
    params: &ElectricalParameters,
    thresholds: &RuleThresholds,
) -> Result<ValidationResult> {
    let pct = require_finite("voltage_drop_pct", params.voltage_drop_pct)?;
    let reference = "IEC 60364-7-712 §712.5";
    let category = "Caída de Tensión";
    if pct > thresholds.voltage_drop_error_pct {
        return Ok(ValidationResult {
            is_valid: false,
            score: 0.0,
            severity: Severity::Error,
            category: category.to_owned(),
            message: format!(
                "voltage drop {pct:.2} % exceeds the {:.1} % limit",
                thresholds.voltage_drop_error_pct
            ),
            recommendation: Some(
                "increase the conductor section or shorten the run".to_owned(),
            ),
            reference: Some(reference.to_owned()),
        });
    }
    if pct > thresholds.voltage_drop_warning_pct {
        return Ok(ValidationResult {
            is_valid: true,
            score: 70.0,
            severity: Severity::Warning,
            category: category.to_owned(),
            message: format!(
                "voltage drop {pct:.2} % is above the {:.1} % design target",
                thresholds.voltage_drop_warning_pct
            ),
            recommendation: Some("consider the next larger commercial section".to_owned()),
            reference: Some(reference.to_owned()),
        });
    }
    Ok(passing(
        category,
        format!("voltage drop {pct:.2} % is within limits"),
        reference,
    ))
}

fn operating_temperature_rule(
    params: &ElectricalParameters,
    thresholds: &RuleThresholds,
) -> Result<ValidationResult> {
    let temp = require_finite("operating_temp_c", params.operating_temp_c)?;
    let reference = "IEC 60364-5-52";
    let category = "Temperatura";
    if temp > thresholds.operating_temp_error_c {
        return Ok(ValidationResult {
            is_valid: false,
            score: 0.0,
            severity: Severity::Error,
            category: category.to_owned(),
            message: format!(
                "operating temperature {temp:.0} °C exceeds the {:.0} °C conductor limit",
                thresholds.operating_temp_error_c
            ),
            recommendation: Some("derate the circuit or improve ventilation".to_owned()),
            reference: Some(reference.to_owned()),
        });
    }
    if temp > thresholds.operating_temp_warning_c {
        return Ok(ValidationResult {
            is_valid: true,
            score: 80.0,
            severity: Severity::Warning,
            category: category.to_owned(),
            message: format!(
                "operating temperature {temp:.0} °C is above the {:.0} °C design target",
                thresholds.operating_temp_warning_c
            ),
            recommendation: None,
            reference: Some(reference.to_owned()),
        });
    }
    Ok(passing(
        category,
        format!("operating temperature {temp:.0} °C is within limits"),
        reference,
    ))
}

fn short_circuit_margin_rule(
    params: &ElectricalParameters,
    thresholds: &RuleThresholds,
) -> Result<ValidationResult> {
    let isc = require_finite("short_circuit_current_a", params.short_circuit_current_a)?;
    let nominal = require_finite("nominal_current_a", params.nominal_current_a)?;
    let reference = "NEC 690.8(A)";
    let category = "Protección";
    let limit = nominal * thresholds.current_margin;
    if isc > limit {
        return Ok(ValidationResult {
            is_valid: false,
            score: 0.0,
            severity: Severity::Error,
            category: category.to_owned(),
            message: format!(
                "short-circuit current {isc:.1} A exceeds the {limit:.1} A margin over nominal"
            ),
            recommendation: Some("re-rate the overcurrent protection for the string".to_owned()),
            reference: Some(reference.to_owned()),
        });
    }
    Ok(passing(
        category,
        format!("short-circuit current {isc:.1} A is within the {limit:.1} A margin"),
        reference,
    ))
}

fn cable_ampacity_rule(
    params: &ElectricalParameters,
    thresholds: &RuleThresholds,
) -> Result<ValidationResult> {
    let ampacity = require_finite("cable_ampacity_a", params.cable_ampacity_a)?;
    let nominal = require_finite("nominal_current_a", params.nominal_current_a)?;
    let reference = "NEC 690.8(B)";
    let category = "Dimensionamiento";
    let required = nominal * thresholds.current_margin;
    if ampacity < required {
        return Ok(ValidationResult {
            is_valid: false,
            score: 0.0,
            severity: Severity::Error,
            category: category.to_owned(),
            message: format!(
                "cable ampacity {ampacity:.1} A is below the required {required:.1} A"
            ),
            recommendation: Some("select a larger conductor section".to_owned()),
            reference: Some(reference.to_owned()),
        });
    }
    Ok(passing(
        category,
        format!("cable ampacity {ampacity:.1} A covers the required {required:.1} A"),
        reference,
    ))
}

fn insulation_class_rule(
    params: &ElectricalParameters,
    thresholds: &RuleThresholds,
) -> Result<ValidationResult> {
    let voltage = require_finite("system_voltage_v", params.system_voltage_v)?;
    let reference = "UL 1741";
    let category = "Aislamiento";
    let required = if voltage > thresholds.class_ii_threshold_v {
        InsulationClass::ClassII
    } else {
        InsulationClass::ClassI
    };
    if params.insulation_class != required {
        return Ok(ValidationResult {
            is_valid: false,
            score: 0.0,
            severity: Severity::Error,
            category: category.to_owned(),
            message: format!(
                "system voltage {voltage:.0} V requires {required} insulation, found {}",
                params.insulation_class
            ),
            recommendation: Some("install cabling of the required insulation class".to_owned()),
            reference: Some(reference.to_owned()),
        });
    }
    Ok(passing(
        category,
        format!("insulation {required} matches the {voltage:.0} V system"),
        reference,
    ))
}

fn system_voltage_rule(
    params: &ElectricalParameters,
    thresholds: &RuleThresholds,
) -> Result<ValidationResult> {
    let voltage = require_finite("system_voltage_v", params.system_voltage_v)?;
    let reference = "UL 1741";
    let category = "Compatibilidad";
    if voltage > thresholds.max_system_voltage_v {
        return Ok(ValidationResult {
            is_valid: false,
            score: 0.0,
            severity: Severity::Error,
            category: category.to_owned(),
            message: format!(
                "system voltage {voltage:.0} V exceeds the {:.0} V equipment maximum",
                thresholds.max_system_voltage_v
            ),
            recommendation: Some("split the array or select equipment rated for the system voltage".to_owned()),
            reference: Some(reference.to_owned()),
        });
    }
    Ok(passing(
        category,
        format!(
            "system voltage {voltage:.0} V is within the {:.0} V equipment maximum",
            thresholds.max_system_voltage_v
        ),
        reference,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    const ALL: [NormStandard; 3] = [
        NormStandard::Iec60364,
        NormStandard::Nec690,
        NormStandard::Ul1741,
    ];

    fn passing_params() -> ElectricalParameters {
        ElectricalParameters {
            voltage_drop_pct: 1.2,
            operating_temp_c: 55.0,
            short_circuit_current_a: 12.0,
            nominal_current_a: 15.0,
            cable_ampacity_a: 40.0,
            system_voltage_v: 800.0,
            insulation_class: InsulationClass::ClassII,
        }
    }

    #[test]
    fn all_standards_all_passing_scores_100() {
        let report = evaluate_rules(&ALL, &passing_params(), &RuleThresholds::default());

        assert_eq!(report.results.len(), 6);
        assert!(report
            .results
            .iter()
            .all(|r| r.severity == Severity::Success));
        assert_eq!(report.score, 100.0);
        assert!(report.is_compliant());
    }

    #[test]
    fn zero_active_standards_yield_empty_report() {
        let report = evaluate_rules(&[], &passing_params(), &RuleThresholds::default());
        assert!(report.results.is_empty());
        assert_eq!(report.score, 0.0);
    }

    #[test]
    fn overvoltage_system_fails_compatibility() {
        let mut params = passing_params();
        params.system_voltage_v = 1200.0;

        let report = evaluate_rules(
            &[NormStandard::Ul1741],
            &params,
            &RuleThresholds::default(),
        );

        let errors: Vec<&ValidationResult> = report
            .results
            .iter()
            .filter(|r| r.severity == Severity::Error)
            .collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].category, "Compatibilidad");
        assert_eq!(errors[0].score, 0.0);
        assert!(!report.is_compliant());
    }

    #[test]
    fn voltage_drop_bands_score_as_specified() {
        let thresholds = RuleThresholds::default();
        let mut params = passing_params();

        params.voltage_drop_pct = 2.5;
        let warning = voltage_drop_rule(&params, &thresholds).unwrap();
        assert_eq!(warning.severity, Severity::Warning);
        assert_eq!(warning.score, 70.0);
        assert!(warning.is_valid);

        params.voltage_drop_pct = 3.4;
        let error = voltage_drop_rule(&params, &thresholds).unwrap();
        assert_eq!(error.severity, Severity::Error);
        assert_eq!(error.score, 0.0);
        assert!(!error.is_valid);
    }

    #[test]
    fn temperature_bands_score_as_specified() {
        let thresholds = RuleThresholds::default();
        let mut params = passing_params();

        params.operating_temp_c = 75.0;
        let warning = operating_temperature_rule(&params, &thresholds).unwrap();
        assert_eq!(warning.severity, Severity::Warning);
        assert_eq!(warning.score, 80.0);

        params.operating_temp_c = 90.0;
        let error = operating_temperature_rule(&params, &thresholds).unwrap();
        assert_eq!(error.severity, Severity::Error);
    }

    #[test]
    fn insulation_mismatch_is_an_error() {
        let mut params = passing_params();
        params.system_voltage_v = 800.0;
        params.insulation_class = InsulationClass::ClassI;

        let report = evaluate_rules(
            &[NormStandard::Ul1741],
            &params,
            &RuleThresholds::default(),
        );
        assert!(report
            .results
            .iter()
            .any(|r| r.category == "Aislamiento" && r.severity == Severity::Error));
    }

    #[test]
    fn results_preserve_group_then_rule_order() {
        let report = evaluate_rules(
            &[NormStandard::Nec690, NormStandard::Iec60364],
            &passing_params(),
            &RuleThresholds::default(),
        );

        let categories: Vec<&str> = report
            .results
            .iter()
            .map(|r| r.category.as_str())
            .collect();
        assert_eq!(
            categories,
            vec![
                "Protección",
                "Dimensionamiento",
                "Caída de Tensión",
                "Temperatura"
            ]
        );
    }

    #[test]
    fn bad_snapshot_degrades_to_error_result() {
        let mut params = passing_params();
        params.voltage_drop_pct = f32::NAN;

        let report = evaluate_rules(&ALL, &params, &RuleThresholds::default());

        // The batch still ran every rule.
        assert_eq!(report.results.len(), 6);
        let degraded = &report.results[0];
        assert_eq!(degraded.severity, Severity::Error);
        assert!(degraded.message.contains("voltage_drop"));
    }

    #[test]
    fn every_standard_has_rules() {
        for standard in NormStandard::iter() {
            assert!(!standard.rules().is_empty());
        }
    }
}
