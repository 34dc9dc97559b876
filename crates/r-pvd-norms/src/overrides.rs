//! ---
//! pvd_section: "04-configuration-orchestration"
//! pvd_subsection: "module"
//! pvd_type: "source"
//! pvd_scope: "code"
//! pvd_description: "Normative profile loading and project override handling."
//! pvd_version: "v0.0.0-prealpha"
//! pvd_owner: "tbd"
//! ---
//! Per-project normative overrides.
//!
//! A project may pin individual profile parameters (dot-path keyed)
//! without editing the shared catalog. Overrides are persisted as a
//! TOML manifest in the project directory, carrying timestamps and a
//! content hash so an unchanged save is detectable.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use r_pvd_common::CableMaterial;

use crate::profile::{InstallationLayout, InstallationMethod, NormativeProfile};

/// Default directory where project state is stored.
pub const DEFAULT_PROJECTS_ROOT: &str = "projects";
const OVERRIDES_FILE: &str = "norm_overrides.toml";

/// One override value as it appears in a manifest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum OverrideValue {
    Flag(bool),
    Number(f64),
    Text(String),
}

impl OverrideValue {
    fn as_f32(&self) -> Option<f32> {
        match self {
            OverrideValue::Number(n) => Some(*n as f32),
            _ => None,
        }
    }

    fn as_u32(&self) -> Option<u32> {
        match self {
            OverrideValue::Number(n) if *n >= 0.0 && n.fract() == 0.0 => Some(*n as u32),
            _ => None,
        }
    }

    fn as_str(&self) -> Option<&str> {
        match self {
            OverrideValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Dot-path keyed override set, in manifest order.
pub type NormOverrides = IndexMap<String, OverrideValue>;

/// Metadata describing an override manifest stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OverrideMetadata {
    /// Human-readable project name supplied by the operator.
    pub project: String,
    /// Filesystem-safe slug generated from the project name.
    pub slug: String,
    /// Base profile the overrides apply on top of.
    pub base_norm: String,
    /// Timestamp (UTC) when the manifest was first created.
    pub created_at: DateTime<Utc>,
    /// Timestamp (UTC) when the manifest was last persisted.
    pub updated_at: DateTime<Utc>,
    /// SHA-256 hash of the override content.
    pub config_hash: String,
    /// Version of the tooling that produced the manifest.
    pub source_version: String,
}

/// Composite manifest wrapping the override set with its metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OverrideManifest {
    pub meta: OverrideMetadata,
    pub modified: NormOverrides,
}

/// Convenience container describing canonical project paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    pub root: PathBuf,
}

impl ProjectPaths {
    /// Construct project paths from an arbitrary root directory.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Directory holding one project's state.
    pub fn project_dir(&self, project: &str) -> PathBuf {
        self.root.join(slugify_name(project))
    }

    /// Path of the project's override manifest.
    pub fn overrides_path(&self, project: &str) -> PathBuf {
        self.project_dir(project).join(OVERRIDES_FILE)
    }

    fn ensure_project_dir(&self, project: &str) -> Result<PathBuf> {
        let dir = self.project_dir(project);
        fs::create_dir_all(&dir)
            .with_context(|| format!("unable to create project directory {}", dir.display()))?;
        Ok(dir)
    }
}

impl OverrideManifest {
    /// Construct a new manifest from a project name, base profile, and
    /// override set.
    pub fn new(
        project: impl Into<String>,
        base_norm: impl Into<String>,
        modified: NormOverrides,
    ) -> Result<Self> {
        let project = project.into().trim().to_owned();
        if project.is_empty() {
            return Err(anyhow!("project name cannot be empty"));
        }
        let slug = slugify_name(&project);
        if slug.is_empty() {
            return Err(anyhow!(
                "project name must contain at least one alphanumeric character"
            ));
        }
        let mut manifest = Self {
            meta: OverrideMetadata {
                project,
                slug,
                base_norm: base_norm.into(),
                created_at: Utc::now(),
                updated_at: Utc::now(),
                config_hash: String::new(),
                source_version: env!("CARGO_PKG_VERSION").to_owned(),
            },
            modified,
        };
        manifest.update_digest()?;
        Ok(manifest)
    }

    /// Recompute the deterministic content hash and refresh the
    /// updated-at timestamp.
    pub fn update_digest(&mut self) -> Result<()> {
        self.meta.config_hash = hash_overrides(&self.meta.base_norm, &self.modified)?;
        self.meta.updated_at = Utc::now();
        Ok(())
    }

    /// Persist the manifest under the project directory.
    pub fn persist(mut self, paths: &ProjectPaths) -> Result<PathBuf> {
        self.update_digest()?;
        paths.ensure_project_dir(&self.meta.project)?;
        let manifest_path = paths.overrides_path(&self.meta.project);
        let serialized = toml::to_string_pretty(&self)
            .context("failed to serialise override manifest to TOML")?;
        fs::write(&manifest_path, serialized)
            .with_context(|| format!("unable to write manifest to {}", manifest_path.display()))?;
        Ok(manifest_path)
    }
}

/// Load a project's override manifest, `None` when the project has no
/// overrides saved.
pub fn load_overrides(paths: &ProjectPaths, project: &str) -> Result<Option<OverrideManifest>> {
    let path = paths.overrides_path(project);
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read override manifest {}", path.display()))?;
    let manifest: OverrideManifest = toml::from_str(&raw)
        .with_context(|| format!("failed to parse override manifest {}", path.display()))?;
    Ok(Some(manifest))
}

/// Save an override set for a project, preserving the original
/// creation timestamp when the manifest already exists.
pub fn save_overrides(
    paths: &ProjectPaths,
    project: &str,
    base_norm: &str,
    modified: NormOverrides,
) -> Result<PathBuf> {
    let mut manifest = OverrideManifest::new(project, base_norm, modified)?;
    if let Some(existing) = load_overrides(paths, project)? {
        manifest.meta.created_at = existing.meta.created_at;
    }
    manifest.persist(paths)
}

/// Delete a project's override manifest. Returns whether a manifest
/// existed.
pub fn remove_overrides(paths: &ProjectPaths, project: &str) -> Result<bool> {
    let path = paths.overrides_path(project);
    if !path.exists() {
        return Ok(false);
    }
    fs::remove_file(&path)
        .with_context(|| format!("unable to remove override manifest {}", path.display()))?;
    Ok(true)
}

/// Apply a dot-path override set to a profile. Unknown paths and
/// mistyped values are skipped with a warning so one bad entry does
/// not invalidate the rest of the manifest. Returns the number of
/// overrides applied.
pub fn apply_to_profile(profile: &mut NormativeProfile, overrides: &NormOverrides) -> u32 {
    let mut applied = 0;
    for (path, value) in overrides {
        match apply_one(profile, path, value) {
            Ok(()) => {
                debug!("override applied: {} = {:?}", path, value);
                applied += 1;
            }
            Err(err) => warn!("skipping override {path}: {err}"),
        }
    }
    applied
}

fn apply_one(profile: &mut NormativeProfile, path: &str, value: &OverrideValue) -> Result<()> {
    match path {
        "correction_factors.isc_safety_factor" => {
            profile.correction_factors.isc_safety_factor =
                positive_f32(value).ok_or_else(|| anyhow!("expected a positive number"))?;
        }
        "correction_factors.parallel_strings" => {
            profile.correction_factors.parallel_strings = value
                .as_u32()
                .filter(|n| *n >= 1)
                .ok_or_else(|| anyhow!("expected a positive integer"))?;
        }
        "cable.material" => {
            let raw = value.as_str().ok_or_else(|| anyhow!("expected a string"))?;
            profile.cable.material = CableMaterial::from_str(raw)
                .map_err(|_| anyhow!("unknown cable material '{raw}'"))?;
        }
        "cable.insulation" => {
            profile.cable.insulation = value
                .as_str()
                .ok_or_else(|| anyhow!("expected a string"))?
                .to_owned();
        }
        "cable.max_temp" => {
            profile.cable.max_temp_c =
                positive_f32(value).ok_or_else(|| anyhow!("expected a positive number"))?;
        }
        "installation.method" => {
            let raw = value.as_str().ok_or_else(|| anyhow!("expected a string"))?;
            profile.installation.method = InstallationMethod::from_str(raw)
                .map_err(|_| anyhow!("unknown installation method '{raw}'"))?;
        }
        "installation.layout" => {
            let raw = value.as_str().ok_or_else(|| anyhow!("expected a string"))?;
            profile.installation.layout = Some(
                InstallationLayout::from_str(raw)
                    .map_err(|_| anyhow!("unknown installation layout '{raw}'"))?,
            );
        }
        "installation.depth_cm" => {
            profile.installation.depth_cm =
                Some(positive_f32(value).ok_or_else(|| anyhow!("expected a positive number"))?);
        }
        "temperature_correction.ambient_design" => {
            profile.temperature_correction.ambient_design_c = value
                .as_f32()
                .ok_or_else(|| anyhow!("expected a number"))?;
        }
        "voltage_drop.max_percentage" => {
            profile.voltage_drop.max_percentage =
                positive_f32(value).ok_or_else(|| anyhow!("expected a positive number"))?;
        }
        "voltage_drop.reference_voltage" => {
            profile.voltage_drop.reference_voltage_v =
                positive_f32(value).ok_or_else(|| anyhow!("expected a positive number"))?;
        }
        _ => return Err(anyhow!("unknown parameter path")),
    }
    Ok(())
}

fn positive_f32(value: &OverrideValue) -> Option<f32> {
    value.as_f32().filter(|v| *v > 0.0 && v.is_finite())
}

/// Compute the SHA-256 hash of an override set.
pub fn hash_overrides(base_norm: &str, overrides: &NormOverrides) -> Result<String> {
    #[derive(Serialize)]
    struct Hashed<'a> {
        base_norm: &'a str,
        modified: &'a NormOverrides,
    }
    let serialised = toml::to_string(&Hashed {
        base_norm,
        modified: overrides,
    })
    .context("failed to serialise overrides for hashing")?;
    let mut hasher = Sha256::new();
    hasher.update(serialised.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

/// Produce a filesystem-safe slug from a human-friendly project name.
pub fn slugify_name(input: &str) -> String {
    let mut slug = String::new();
    let mut previous_dash = false;
    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            previous_dash = false;
        } else if matches!(ch, ' ' | '-' | '_' | '.' | '/') && !previous_dash && !slug.is_empty() {
            slug.push('-');
            previous_dash = true;
        }
    }
    if slug.ends_with('-') {
        slug.pop();
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::builtin_catalog;
    use tempfile::tempdir;

    fn sample_overrides() -> NormOverrides {
        let mut overrides = NormOverrides::new();
        overrides.insert(
            "voltage_drop.max_percentage".to_owned(),
            OverrideValue::Number(3.0),
        );
        overrides.insert(
            "cable.material".to_owned(),
            OverrideValue::Text("aluminum".to_owned()),
        );
        overrides
    }

    #[test]
    fn slugify_flattens_names() {
        assert_eq!(slugify_name("Planta Solar Norte"), "planta-solar-norte");
        assert_eq!(slugify_name("  plant/7 . phase_2 "), "plant-7-phase-2");
        assert_eq!(slugify_name("***"), "");
    }

    #[test]
    fn overrides_round_trip_through_disk() {
        let temp = tempdir().unwrap();
        let paths = ProjectPaths::new(temp.path());

        assert!(load_overrides(&paths, "Planta Norte").unwrap().is_none());

        let manifest_path =
            save_overrides(&paths, "Planta Norte", "IEC", sample_overrides()).unwrap();
        assert!(manifest_path.ends_with("planta-norte/norm_overrides.toml"));

        let loaded = load_overrides(&paths, "Planta Norte").unwrap().unwrap();
        assert_eq!(loaded.meta.base_norm, "IEC");
        assert_eq!(loaded.modified.len(), 2);
        assert!(!loaded.meta.config_hash.is_empty());

        assert!(remove_overrides(&paths, "Planta Norte").unwrap());
        assert!(!remove_overrides(&paths, "Planta Norte").unwrap());
    }

    #[test]
    fn resave_preserves_creation_timestamp() {
        let temp = tempdir().unwrap();
        let paths = ProjectPaths::new(temp.path());

        save_overrides(&paths, "plant", "IEC", sample_overrides()).unwrap();
        let first = load_overrides(&paths, "plant").unwrap().unwrap();

        let mut second_set = sample_overrides();
        second_set.insert(
            "cable.max_temp".to_owned(),
            OverrideValue::Number(70.0),
        );
        save_overrides(&paths, "plant", "IEC", second_set).unwrap();
        let second = load_overrides(&paths, "plant").unwrap().unwrap();

        assert_eq!(first.meta.created_at, second.meta.created_at);
        assert_ne!(first.meta.config_hash, second.meta.config_hash);
    }

    #[test]
    fn known_paths_apply_and_unknown_paths_skip() {
        let mut profile = builtin_catalog().get("IEC").unwrap().clone();
        let mut overrides = sample_overrides();
        overrides.insert("nonsense.path".to_owned(), OverrideValue::Number(1.0));
        overrides.insert(
            "correction_factors.parallel_strings".to_owned(),
            OverrideValue::Number(4.0),
        );

        let applied = apply_to_profile(&mut profile, &overrides);

        assert_eq!(applied, 3);
        assert_eq!(profile.voltage_drop.max_percentage, 3.0);
        assert_eq!(profile.cable.material, CableMaterial::Aluminum);
        assert_eq!(profile.correction_factors.parallel_strings, 4);
    }

    #[test]
    fn mistyped_values_are_rejected() {
        let mut profile = builtin_catalog().get("IEC").unwrap().clone();
        let mut overrides = NormOverrides::new();
        overrides.insert(
            "voltage_drop.max_percentage".to_owned(),
            OverrideValue::Text("three".to_owned()),
        );
        overrides.insert(
            "voltage_drop.reference_voltage".to_owned(),
            OverrideValue::Number(-10.0),
        );

        assert_eq!(apply_to_profile(&mut profile, &overrides), 0);
        assert_eq!(
            profile.voltage_drop.max_percentage,
            builtin_catalog()
                .get("IEC")
                .unwrap()
                .voltage_drop
                .max_percentage
        );
    }
}
