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

use crate::model::{Cn1CircuitRow, ConductorBase, CorrectionFactors, StringCircuitRow};
use crate::rules::{ElectricalParameters, NormStandard};
use crate::simulation::SimParameter;

#[cfg(feature = "rest-api")]
pub use rest::router;

/// Sizing request shared by the strings and CN1 endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizingRequest {
    /// Normative profile name; the catalog fallback applies when the
    /// name is unknown.
    #[serde(default)]
    pub norm: Option<String>,
    pub panel_isc_a: f32,
    #[serde(default)]
    pub ambient_temp_c: Option<f32>,
    #[serde(default)]
    pub parallel_circuits: Option<u32>,
    #[serde(default)]
    pub strings: Vec<StringCircuitRow>,
    #[serde(default)]
    pub cn1: Vec<Cn1CircuitRow>,
}

/// Rule set request: a snapshot plus the standards to check it
/// against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationRequest {
    pub standards: Vec<NormStandard>,
    pub params: ElectricalParameters,
}

/// One staged edit of a simulation request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ParameterEdit {
    pub parameter: SimParameter,
    pub value: f32,
}

/// What-if request: baseline run plus a list of staged edits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationRequest {
    pub base: ConductorBase,
    pub factors: CorrectionFactors,
    #[serde(default)]
    pub edits: Vec<ParameterEdit>,
}

#[cfg(feature = "rest-api")]
mod rest {
    use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
    use std::sync::Arc;

    use r_pvd_norms::{builtin_catalog, effective_profile, CircuitClass};

    use crate::cn1::{calculate_all_cn1, parallel_string_counts, Cn1BatchReport};
    use crate::errors::CalcEngineError;
    use crate::model::CalcParams;
    use crate::rules::{evaluate_rules, RuleThresholds, ValidationReport};
    use crate::simulation::{SimulationOutcome, Simulator};
    use crate::strings::{calculate_all_strings, StringBatchReport};

    use super::{SimulationRequest, SizingRequest, ValidationRequest};

    #[derive(Clone, Default)]
    pub struct CalcEngineState;

    pub fn router() -> Router {
        Router::new()
            .route("/api/calc/strings", post(size_strings))
            .route("/api/calc/cn1", post(size_cn1))
            .route("/api/calc/validate", post(validate))
            .route("/api/calc/simulate", post(simulate))
            .with_state(Arc::new(CalcEngineState))
    }

    fn params_for(request: &SizingRequest) -> Result<CalcParams, StatusCode> {
        let norm_name = request.norm.as_deref().unwrap_or(r_pvd_norms::FALLBACK_NORM);
        let norm = effective_profile(builtin_catalog(), norm_name, None)
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        let mut params = CalcParams::new(norm, request.panel_isc_a);
        params.ambient_temp_c = request.ambient_temp_c;
        params.parallel_circuits = request.parallel_circuits;
        Ok(params)
    }

    async fn size_strings(
        State(_): State<Arc<CalcEngineState>>,
        Json(payload): Json<SizingRequest>,
    ) -> Result<Json<StringBatchReport>, StatusCode> {
        let params = params_for(&payload)?;
        Ok(Json(calculate_all_strings(
            &payload.strings,
            &params,
            CircuitClass::DcStrings,
        )))
    }

    async fn size_cn1(
        State(_): State<Arc<CalcEngineState>>,
        Json(payload): Json<SizingRequest>,
    ) -> Result<Json<Cn1BatchReport>, StatusCode> {
        let params = params_for(&payload)?;
        let counts = parallel_string_counts(&payload.strings);
        Ok(Json(calculate_all_cn1(&payload.cn1, &counts, &params)))
    }

    async fn validate(
        State(_): State<Arc<CalcEngineState>>,
        Json(payload): Json<ValidationRequest>,
    ) -> Json<ValidationReport> {
        Json(evaluate_rules(
            &payload.standards,
            &payload.params,
            &RuleThresholds::default(),
        ))
    }

    async fn simulate(
        State(_): State<Arc<CalcEngineState>>,
        Json(payload): Json<SimulationRequest>,
    ) -> Result<Json<SimulationOutcome>, StatusCode> {
        let mut simulator = Simulator::new(payload.base, payload.factors).map_err(map_err)?;
        for edit in &payload.edits {
            simulator.set_parameter(edit.parameter, edit.value);
        }
        simulator.recompute().map(Json).map_err(map_err)
    }

    fn map_err(err: CalcEngineError) -> StatusCode {
        match err {
            CalcEngineError::InvalidParameter { .. }
            | CalcEngineError::EmptySectionTable(_)
            | CalcEngineError::MissingColumn(_)
            | CalcEngineError::MalformedRow { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
