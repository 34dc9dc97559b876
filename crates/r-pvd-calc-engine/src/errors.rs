//! ---
//! pvd_section: "08-energy-models-optimization"
//! pvd_subsection: "module"
//! pvd_type: "source"
//! pvd_scope: "code"
//! pvd_description: "Sizing and validation routines for PV conductor runs."
//! pvd_version: "v0.0.0-prealpha"
//! pvd_owner: "tbd"
//! ---
use thiserror::Error;

use r_pvd_norms::CircuitClass;

pub type Result<T> = std::result::Result<T, CalcEngineError>;

#[derive(Debug, Error)]
pub enum CalcEngineError {
    /// A denominator or required numeric input is missing, non-finite,
    /// or out of range. Computing through it would surface NaN or
    /// infinity in displayed results, so the evaluator refuses instead.
    #[error("parameter '{field}' must be a positive finite number, got {value}")]
    InvalidParameter { field: &'static str, value: f32 },
    #[error("no commercial sections defined for circuit class {0}")]
    EmptySectionTable(CircuitClass),
    #[error("input table is missing required column '{0}'")]
    MissingColumn(&'static str),
    #[error("malformed row {row}: {reason}")]
    MalformedRow { row: usize, reason: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    SerializationFailed(#[from] serde_json::Error),
    #[error("yaml serialization error: {0}")]
    YamlSerializationFailed(#[from] serde_yaml::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Config(#[from] anyhow::Error),
}

impl CalcEngineError {
    /// Constructor used across the evaluator's denominator checks.
    pub(crate) fn invalid(field: &'static str, value: f32) -> Self {
        CalcEngineError::InvalidParameter { field, value }
    }
}
