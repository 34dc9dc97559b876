//! ---
//! pvd_section: "04-configuration-orchestration"
//! pvd_subsection: "module"
//! pvd_type: "source"
//! pvd_scope: "code"
//! pvd_description: "Normative profile loading and project override handling."
//! pvd_version: "v0.0.0-prealpha"
//! pvd_owner: "tbd"
//! ---
use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::profile::{CircuitClass, NormativeProfile};

/// Profile name resolved when a requested profile does not exist.
pub const FALLBACK_NORM: &str = "IEC";

/// Circuit classes every usable profile must carry sections for.
const REQUIRED_CLASSES: [CircuitClass; 3] = [
    CircuitClass::DcStrings,
    CircuitClass::Level1Dc,
    CircuitClass::AcCircuits,
];

static BUILTIN: Lazy<NormativeCatalog> = Lazy::new(|| {
    NormativeCatalog::from_yaml_str(include_str!("../assets/normativas.yaml"))
        .expect("built-in normative catalog is valid")
});

/// Document-level metadata of a catalog file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct CatalogMetadata {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub last_updated: String,
}

/// A set of named normative profiles plus document metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NormativeCatalog {
    #[serde(default)]
    pub metadata: CatalogMetadata,
    pub normatives: IndexMap<String, NormativeProfile>,
}

/// The catalog compiled into the engine (IEC and NEC).
pub fn builtin_catalog() -> &'static NormativeCatalog {
    &BUILTIN
}

impl NormativeCatalog {
    /// Parse and validate a catalog from YAML text. Section tables are
    /// normalised to ascending order on load.
    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        let mut catalog: NormativeCatalog =
            serde_yaml::from_str(raw).context("failed to parse normative catalog YAML")?;
        for profile in catalog.normatives.values_mut() {
            for table in profile.standard_sections.values_mut() {
                table.mm2.sort_by(|a, b| a.total_cmp(b));
            }
        }
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load a catalog from a YAML file on disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read normative catalog {}", path.display()))?;
        Self::from_yaml_str(&raw)
            .with_context(|| format!("invalid normative catalog {}", path.display()))
    }

    /// Structural validation: at least one profile, and every profile
    /// carries non-empty section tables for the required circuit
    /// classes. Failures are loud; there is no silent fallback catalog.
    pub fn validate(&self) -> Result<()> {
        if self.normatives.is_empty() {
            return Err(anyhow!("normative catalog defines no profiles"));
        }
        for (key, profile) in &self.normatives {
            for class in REQUIRED_CLASSES {
                let table = profile
                    .sections_for(class)
                    .ok_or_else(|| anyhow!("profile '{key}' has no section table for {class}"))?;
                if table.mm2.is_empty() {
                    return Err(anyhow!("profile '{key}' has an empty section table for {class}"));
                }
            }
            if profile.correction_factors.isc_safety_factor <= 0.0 {
                return Err(anyhow!("profile '{key}' has a non-positive isc safety factor"));
            }
            if profile.voltage_drop.max_percentage <= 0.0
                || profile.voltage_drop.reference_voltage_v <= 0.0
            {
                return Err(anyhow!("profile '{key}' has non-positive voltage drop limits"));
            }
        }
        Ok(())
    }

    /// Look up a profile by name, falling back to [`FALLBACK_NORM`]
    /// with a warning when the requested one does not exist.
    pub fn get(&self, name: &str) -> Result<&NormativeProfile> {
        if let Some(profile) = self.normatives.get(name) {
            return Ok(profile);
        }
        let available: Vec<&str> = self.normatives.keys().map(String::as_str).collect();
        warn!(
            "normative profile '{}' not found, using '{}' (available: {})",
            name,
            FALLBACK_NORM,
            available.join(", ")
        );
        self.normatives
            .get(FALLBACK_NORM)
            .ok_or_else(|| anyhow!("fallback profile '{FALLBACK_NORM}' missing from catalog"))
    }

    /// Names of every profile in document order.
    pub fn available(&self) -> Vec<&str> {
        self.normatives.keys().map(String::as_str).collect()
    }
}
