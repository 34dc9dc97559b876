//! ---
//! pvd_section: "08-energy-models-optimization"
//! pvd_subsection: "module"
//! pvd_type: "source"
//! pvd_scope: "code"
//! pvd_description: "Sizing and validation routines for PV conductor runs."
//! pvd_version: "v0.0.0-prealpha"
//! pvd_owner: "tbd"
//! ---
//! Take-off table validation.
//!
//! Checks a string circuit table before sizing: identifier formats,
//! length ranges, duplicates, pos/neg symmetry, and distribution
//! across combiners and inverters. Every finding is collected; the
//! validator never aborts early, so the operator sees the full list in
//! one pass.

use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::Display;
use tracing::{info, warn};

use r_pvd_common::{Cn1Id, InverterId, StringId};

use crate::model::StringCircuitRow;

const MIN_LENGTH_M: f32 = 0.5;
const MAX_LENGTH_M: f32 = 2000.0;
const TYPICAL_LENGTH_RANGE_M: (f32, f32) = (5.0, 500.0);
const MAX_LENGTH_DIFF_PCT: f32 = 15.0;
const MAX_STRINGS_PER_CN1: usize = 50;
const MAX_STRINGS_PER_INVERTER: usize = 200;

/// Severity of one dataset finding.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FindingSeverity {
    Error,
    Warning,
}

/// One issue found in a take-off table. Row numbers follow the source
/// spreadsheet convention: the header is row 1, data starts at row 2.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DatasetFinding {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row: Option<usize>,
    pub severity: FindingSeverity,
    pub message: String,
}

/// Result of validating one take-off table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct DatasetReport {
    pub findings: Vec<DatasetFinding>,
}

impl DatasetReport {
    pub fn is_ok(&self) -> bool {
        self.error_count() == 0
    }

    pub fn error_count(&self) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == FindingSeverity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == FindingSeverity::Warning)
            .count()
    }

    fn error(&mut self, row: Option<usize>, message: String) {
        self.findings.push(DatasetFinding {
            row,
            severity: FindingSeverity::Error,
            message,
        });
    }

    fn warning(&mut self, row: Option<usize>, message: String) {
        self.findings.push(DatasetFinding {
            row,
            severity: FindingSeverity::Warning,
            message,
        });
    }
}

/// Validate a string circuit table.
pub fn validate_string_dataset(rows: &[StringCircuitRow]) -> DatasetReport {
    let mut report = DatasetReport::default();

    if rows.is_empty() {
        report.warning(None, "no string circuits to validate".to_owned());
        return report;
    }

    for (index, row) in rows.iter().enumerate() {
        let row_num = index + 2;
        check_row(&mut report, row, row_num);
    }

    check_duplicates(&mut report, rows);
    check_symmetry(&mut report, rows);
    check_distribution(&mut report, rows);

    info!(
        "dataset validation complete: {} errors, {} warnings over {} rows",
        report.error_count(),
        report.warning_count(),
        rows.len()
    );
    report
}

fn check_row(report: &mut DatasetReport, row: &StringCircuitRow, row_num: usize) {
    if let Err(err) = StringId::from_str(&row.string_id) {
        report.error(Some(row_num), err.to_string());
    }
    if let Err(err) = Cn1Id::from_str(&row.cn1_id) {
        report.error(Some(row_num), err.to_string());
    }
    if let Err(err) = InverterId::from_str(&row.inverter_id) {
        report.error(Some(row_num), err.to_string());
    }
    check_length(report, "length_pos_m", row.length_pos_m, row_num);
    check_length(report, "length_neg_m", row.length_neg_m, row_num);
}

fn check_length(report: &mut DatasetReport, field: &str, value: f32, row_num: usize) {
    if !value.is_finite() {
        report.error(
            Some(row_num),
            format!("{field} must be a number, got {value}"),
        );
        return;
    }
    if value < MIN_LENGTH_M {
        report.error(
            Some(row_num),
            format!("{field} must be ≥ {MIN_LENGTH_M} m, got {value} m"),
        );
        return;
    }
    if value > MAX_LENGTH_M {
        report.error(
            Some(row_num),
            format!("{field} must be ≤ {MAX_LENGTH_M} m, got {value} m"),
        );
        return;
    }
    let (typical_min, typical_max) = TYPICAL_LENGTH_RANGE_M;
    if value < typical_min || value > typical_max {
        warn!("row {row_num}: {field} {value} m is outside the typical {typical_min}-{typical_max} m range");
    }
}

fn check_duplicates(report: &mut DatasetReport, rows: &[StringCircuitRow]) {
    let mut seen: HashMap<&str, Vec<usize>> = HashMap::new();
    for (index, row) in rows.iter().enumerate() {
        seen.entry(row.string_id.as_str())
            .or_default()
            .push(index + 2);
    }
    let mut duplicated: Vec<(&str, Vec<usize>)> = seen
        .into_iter()
        .filter(|(_, occurrences)| occurrences.len() > 1)
        .collect();
    duplicated.sort_by_key(|(_, occurrences)| occurrences[0]);
    for (string_id, occurrences) in duplicated {
        report.error(
            None,
            format!("duplicate string_id '{string_id}' in rows {occurrences:?}"),
        );
    }
}

fn check_symmetry(report: &mut DatasetReport, rows: &[StringCircuitRow]) {
    for (index, row) in rows.iter().enumerate() {
        let (pos, neg) = (row.length_pos_m, row.length_neg_m);
        if !(pos.is_finite() && neg.is_finite()) {
            continue;
        }
        let avg = (pos + neg) / 2.0;
        if avg <= 0.0 {
            continue;
        }
        let diff_pct = (pos - neg).abs() / avg * 100.0;
        if diff_pct > MAX_LENGTH_DIFF_PCT {
            report.warning(
                Some(index + 2),
                format!(
                    "large pos/neg length difference ({pos} m vs {neg} m, {diff_pct:.1} %)"
                ),
            );
        }
    }
}

fn check_distribution(report: &mut DatasetReport, rows: &[StringCircuitRow]) {
    let mut per_cn1: HashMap<&str, usize> = HashMap::new();
    let mut per_inverter: HashMap<&str, usize> = HashMap::new();
    for row in rows {
        *per_cn1.entry(row.cn1_id.as_str()).or_default() += 1;
        *per_inverter.entry(row.inverter_id.as_str()).or_default() += 1;
    }

    let mut overloaded_cn1: Vec<(&str, usize)> = per_cn1
        .into_iter()
        .filter(|(_, count)| *count > MAX_STRINGS_PER_CN1)
        .collect();
    overloaded_cn1.sort();
    for (cn1_id, count) in overloaded_cn1 {
        report.warning(
            None,
            format!(
                "combiner '{cn1_id}' has {count} strings (recommended maximum {MAX_STRINGS_PER_CN1})"
            ),
        );
    }

    let mut overloaded_inv: Vec<(&str, usize)> = per_inverter
        .into_iter()
        .filter(|(_, count)| *count > MAX_STRINGS_PER_INVERTER)
        .collect();
    overloaded_inv.sort();
    for (inverter_id, count) in overloaded_inv {
        report.warning(
            None,
            format!(
                "inverter '{inverter_id}' has {count} strings (recommended maximum {MAX_STRINGS_PER_INVERTER})"
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, pos: f32, neg: f32, cn1: &str, inv: &str) -> StringCircuitRow {
        StringCircuitRow {
            string_id: id.to_owned(),
            length_pos_m: pos,
            length_neg_m: neg,
            cn1_id: cn1.to_owned(),
            inverter_id: inv.to_owned(),
        }
    }

    fn clean_row(n: usize) -> StringCircuitRow {
        row(
            &format!("str-01-{n:02}-CN1-01-01"),
            21.0,
            19.0,
            "CN1-01",
            "INV-1",
        )
    }

    #[test]
    fn clean_table_has_no_findings() {
        let rows: Vec<StringCircuitRow> = (1..=10).map(clean_row).collect();
        let report = validate_string_dataset(&rows);
        assert!(report.findings.is_empty());
        assert!(report.is_ok());
    }

    #[test]
    fn empty_table_is_flagged() {
        let report = validate_string_dataset(&[]);
        assert_eq!(report.warning_count(), 1);
        assert!(report.is_ok());
    }

    #[test]
    fn malformed_ids_are_errors_with_row_numbers() {
        let rows = vec![
            clean_row(1),
            row("badly-formed", 21.0, 19.0, "cn-01", "INVERTER-1"),
        ];
        let report = validate_string_dataset(&rows);

        assert_eq!(report.error_count(), 3);
        assert!(report.findings.iter().all(|f| f.row == Some(3)));
        assert!(!report.is_ok());
    }

    #[test]
    fn out_of_range_lengths_are_errors() {
        let rows = vec![
            row("str-01-01-CN1-01-01", 0.2, 19.0, "CN1-01", "INV-1"),
            row("str-01-02-CN1-01-01", 21.0, 2500.0, "CN1-01", "INV-1"),
        ];
        let report = validate_string_dataset(&rows);
        assert_eq!(report.error_count(), 2);
    }

    #[test]
    fn duplicates_are_reported_once_per_id() {
        let rows = vec![clean_row(1), clean_row(2), clean_row(1)];
        let report = validate_string_dataset(&rows);

        assert_eq!(report.error_count(), 1);
        let message = &report.findings[0].message;
        assert!(message.contains("str-01-01-CN1-01-01"));
        assert!(message.contains("[2, 4]"));
    }

    #[test]
    fn asymmetric_lengths_are_warnings() {
        let rows = vec![row("str-01-01-CN1-01-01", 40.0, 20.0, "CN1-01", "INV-1")];
        let report = validate_string_dataset(&rows);

        assert_eq!(report.error_count(), 0);
        assert_eq!(report.warning_count(), 1);
        assert!(report.is_ok());
    }

    #[test]
    fn overloaded_combiner_is_a_warning() {
        let rows: Vec<StringCircuitRow> = (0..55)
            .map(|i| {
                row(
                    &format!("str-01-{i}-CN1-01-01"),
                    21.0,
                    19.0,
                    "CN1-01",
                    "INV-1",
                )
            })
            .collect();
        let report = validate_string_dataset(&rows);

        assert!(report
            .findings
            .iter()
            .any(|f| f.severity == FindingSeverity::Warning && f.message.contains("CN1-01")));
    }
}
