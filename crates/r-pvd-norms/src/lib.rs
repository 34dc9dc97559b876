//! ---
//! pvd_section: "04-configuration-orchestration"
//! pvd_subsection: "module"
//! pvd_type: "source"
//! pvd_scope: "code"
//! pvd_description: "Normative profile loading and project override handling."
//! pvd_version: "v0.0.0-prealpha"
//! pvd_owner: "tbd"
//! ---
//! Normative configuration for the R-PVD workspace.
//!
//! A [`NormativeProfile`] bundles every threshold and lookup table a
//! sizing run depends on: safety and grouping factors, ambient
//! temperature correction, voltage-drop limits, and the commercial
//! section tables per circuit class. Profiles live in a
//! [`NormativeCatalog`] (built-in IEC/NEC defaults or a YAML document),
//! and per-project overrides are persisted as TOML manifests and folded
//! in when the effective profile for a run is resolved.

pub mod catalog;
pub mod effective;
pub mod overrides;
pub mod profile;

pub use catalog::{builtin_catalog, NormativeCatalog, FALLBACK_NORM};
pub use effective::{effective_profile, EffectiveNorm, OverridesInfo};
pub use overrides::{
    apply_to_profile, load_overrides, remove_overrides, save_overrides, slugify_name,
    NormOverrides, OverrideManifest, OverrideMetadata, OverrideValue, ProjectPaths,
    DEFAULT_PROJECTS_ROOT,
};
pub use profile::{
    CableDefaults, CircuitClass, CorrectionFactorsSpec, GroupingFactors, InstallationLayout,
    InstallationMethod, InstallationSpec, NormativeProfile, SectionTable, TemperatureCorrection,
    VoltageDropSpec,
};
