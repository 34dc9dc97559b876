//! ---
//! pvd_section: "01-core-functionality"
//! pvd_subsection: "module"
//! pvd_type: "source"
//! pvd_scope: "code"
//! pvd_description: "Shared domain primitives for conductor sizing."
//! pvd_version: "v0.0.0-prealpha"
//! pvd_owner: "tbd"
//! ---
//! Core shared primitives for the R-PVD workspace.
//! This crate exposes the conductor material model and the circuit
//! identifier types consumed across the workspace.

pub mod ids;
pub mod materials;

pub use ids::{CircuitId, Cn1Id, IdFormatError, InverterId, StringId};
pub use materials::{CableMaterial, MaterialProperties};
