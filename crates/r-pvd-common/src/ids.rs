//! ---
//! pvd_section: "01-core-functionality"
//! pvd_subsection: "module"
//! pvd_type: "source"
//! pvd_scope: "code"
//! pvd_description: "Shared domain primitives for conductor sizing."
//! pvd_version: "v0.0.0-prealpha"
//! pvd_owner: "tbd"
//! ---
//! Identifier types for PV circuit topology.
//!
//! String runs, combiner boxes (CN1) and inverters arrive from site
//! take-off tables as formatted text ids. The types here validate the
//! formats once at the boundary so the calculation pipeline never has
//! to re-check them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdFormatError {
    #[error("string id '{0}' is not of the form str-N-N-CN1-N-N")]
    StringId(String),
    #[error("combiner id '{0}' is not of the form CN1-N")]
    Cn1Id(String),
    #[error("inverter id '{0}' is not of the form INV-N")]
    InverterId(String),
}

fn all_digits(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

/// Identifier of one PV string run, `str-N-N-CN1-N-N`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct StringId(String);

impl StringId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for StringId {
    type Err = IdFormatError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = raw.split('-').collect();
        let well_formed = parts.len() == 6
            && parts[0] == "str"
            && parts[3] == "CN1"
            && [parts[1], parts[2], parts[4], parts[5]]
                .iter()
                .all(|p| all_digits(p));
        if well_formed {
            Ok(StringId(raw.to_owned()))
        } else {
            Err(IdFormatError::StringId(raw.to_owned()))
        }
    }
}

impl fmt::Display for StringId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a combiner box, `CN1-N`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Cn1Id(String);

impl Cn1Id {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Cn1Id {
    type Err = IdFormatError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.split_once('-') {
            Some(("CN1", number)) if all_digits(number) => Ok(Cn1Id(raw.to_owned())),
            _ => Err(IdFormatError::Cn1Id(raw.to_owned())),
        }
    }
}

impl fmt::Display for Cn1Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of an inverter, `INV-N`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct InverterId(String);

impl InverterId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for InverterId {
    type Err = IdFormatError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.split_once('-') {
            Some(("INV", number)) if all_digits(number) => Ok(InverterId(raw.to_owned())),
            _ => Err(IdFormatError::InverterId(raw.to_owned())),
        }
    }
}

impl fmt::Display for InverterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonical key for one combiner-to-inverter circuit, `cn1-NN-invN`.
///
/// Take-off tables spell the combiner and inverter ids inconsistently
/// (`CN1-01`, `cn1-1`, `INV-01`, ...). Every table is folded onto this
/// canonical form before parallel-string counts and CN1 rows are joined,
/// so both sides of the join agree on the key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct CircuitId(String);

impl CircuitId {
    /// Build the canonical circuit key from raw combiner and inverter
    /// spellings. The combiner number is zero-padded to two digits, the
    /// inverter number has leading zeros stripped.
    pub fn normalized(cn1_raw: &str, inverter_raw: &str) -> CircuitId {
        let cn1_num = strip_prefix_number(cn1_raw, "CN1-");
        let inv_num = strip_prefix_number(inverter_raw, "INV-");
        let inv_num = match inv_num.trim_start_matches('0') {
            "" => "0",
            trimmed => trimmed,
        };
        CircuitId(format!("cn1-{:0>2}-inv{}", cn1_num, inv_num))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CircuitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn strip_prefix_number(raw: &str, prefix: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.len() >= prefix.len() && trimmed[..prefix.len()].eq_ignore_ascii_case(prefix) {
        trimmed[prefix.len()..].to_owned()
    } else {
        trimmed.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_id_accepts_canonical_form() {
        assert!(StringId::from_str("str-01-01-CN1-01-01").is_ok());
        assert!(StringId::from_str("str-1-12-CN1-3-4").is_ok());
    }

    #[test]
    fn string_id_rejects_malformed_input() {
        for raw in [
            "",
            "str-01-01",
            "str-01-01-CN2-01-01",
            "str-aa-01-CN1-01-01",
            "STR-01-01-CN1-01-01",
            "str-01-01-CN1-01-01-07",
        ] {
            assert_eq!(
                StringId::from_str(raw),
                Err(IdFormatError::StringId(raw.to_owned()))
            );
        }
    }

    #[test]
    fn combiner_and_inverter_ids_validate() {
        assert!(Cn1Id::from_str("CN1-01").is_ok());
        assert!(Cn1Id::from_str("cn1-01").is_err());
        assert!(Cn1Id::from_str("CN1-").is_err());
        assert!(InverterId::from_str("INV-1").is_ok());
        assert!(InverterId::from_str("INV-A").is_err());
    }

    #[test]
    fn circuit_id_normalizes_mixed_spellings() {
        assert_eq!(
            CircuitId::normalized("CN1-01", "INV-1").as_str(),
            "cn1-01-inv1"
        );
        assert_eq!(
            CircuitId::normalized("cn1-1", "INV-01").as_str(),
            "cn1-01-inv1"
        );
        assert_eq!(CircuitId::normalized("3", "2").as_str(), "cn1-03-inv2");
        assert_eq!(
            CircuitId::normalized("CN1-00", "INV-0").as_str(),
            "cn1-00-inv0"
        );
    }
}
