//! ---
//! pvd_section: "04-configuration-orchestration"
//! pvd_subsection: "module"
//! pvd_type: "source"
//! pvd_scope: "code"
//! pvd_description: "Normative profile loading and project override handling."
//! pvd_version: "v0.0.0-prealpha"
//! pvd_owner: "tbd"
//! ---
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::catalog::NormativeCatalog;
use crate::overrides::{apply_to_profile, load_overrides, ProjectPaths};
use crate::profile::NormativeProfile;

/// Summary of the override manifest folded into an effective profile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OverridesInfo {
    pub base_norm: String,
    pub last_modified: DateTime<Utc>,
    pub modified_count: usize,
    pub applied_count: u32,
}

/// A normative profile resolved for one run: catalog profile plus any
/// project overrides, with provenance metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EffectiveNorm {
    /// Catalog key actually used (after fallback resolution).
    pub norm_key: String,
    pub profile: NormativeProfile,
    #[serde(default)]
    pub project: Option<String>,
    pub has_project_overrides: bool,
    #[serde(default)]
    pub overrides: Option<OverridesInfo>,
}

/// Resolve the effective profile for a run: catalog lookup (with IEC
/// fallback), then the project's override manifest when one exists.
///
/// A manifest that fails to load is reported and skipped rather than
/// failing the run; the base profile is still usable and the operator
/// sees the warning.
pub fn effective_profile(
    catalog: &NormativeCatalog,
    norm: &str,
    project: Option<(&ProjectPaths, &str)>,
) -> Result<EffectiveNorm> {
    let norm_key = if catalog.normatives.contains_key(norm) {
        norm.to_owned()
    } else {
        crate::catalog::FALLBACK_NORM.to_owned()
    };
    let mut profile = catalog.get(norm)?.clone();

    let mut effective = EffectiveNorm {
        norm_key,
        project: project.map(|(_, name)| name.to_owned()),
        has_project_overrides: false,
        overrides: None,
        profile: profile.clone(),
    };

    let Some((paths, project_name)) = project else {
        return Ok(effective);
    };

    let manifest = match load_overrides(paths, project_name) {
        Ok(manifest) => manifest,
        Err(err) => {
            warn!("could not load overrides for project '{project_name}': {err:#}");
            return Ok(effective);
        }
    };

    if let Some(manifest) = manifest {
        let applied = apply_to_profile(&mut profile, &manifest.modified);
        info!(
            "applied {} of {} overrides for project '{}' on top of {}",
            applied,
            manifest.modified.len(),
            project_name,
            manifest.meta.base_norm
        );
        effective.has_project_overrides = true;
        effective.overrides = Some(OverridesInfo {
            base_norm: manifest.meta.base_norm,
            last_modified: manifest.meta.updated_at,
            modified_count: manifest.modified.len(),
            applied_count: applied,
        });
        effective.profile = profile;
    }

    Ok(effective)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::builtin_catalog;
    use crate::overrides::{save_overrides, NormOverrides, OverrideValue};
    use tempfile::tempdir;

    #[test]
    fn no_project_yields_base_profile() {
        let effective = effective_profile(builtin_catalog(), "NEC", None).unwrap();
        assert_eq!(effective.norm_key, "NEC");
        assert!(!effective.has_project_overrides);
        assert_eq!(effective.profile.voltage_drop.max_percentage, 2.0);
    }

    #[test]
    fn unknown_norm_resolves_to_fallback_key() {
        let effective = effective_profile(builtin_catalog(), "JIS", None).unwrap();
        assert_eq!(effective.norm_key, "IEC");
    }

    #[test]
    fn project_overrides_are_folded_in() {
        let temp = tempdir().unwrap();
        let paths = ProjectPaths::new(temp.path());
        let mut overrides = NormOverrides::new();
        overrides.insert(
            "voltage_drop.max_percentage".to_owned(),
            OverrideValue::Number(2.5),
        );
        save_overrides(&paths, "plant", "IEC", overrides).unwrap();

        let effective =
            effective_profile(builtin_catalog(), "IEC", Some((&paths, "plant"))).unwrap();

        assert!(effective.has_project_overrides);
        assert_eq!(effective.profile.voltage_drop.max_percentage, 2.5);
        let info = effective.overrides.unwrap();
        assert_eq!(info.modified_count, 1);
        assert_eq!(info.applied_count, 1);
    }

    #[test]
    fn project_without_manifest_keeps_base_profile() {
        let temp = tempdir().unwrap();
        let paths = ProjectPaths::new(temp.path());
        let effective =
            effective_profile(builtin_catalog(), "IEC", Some((&paths, "fresh-plant"))).unwrap();
        assert!(!effective.has_project_overrides);
        assert!(effective.overrides.is_none());
    }
}
