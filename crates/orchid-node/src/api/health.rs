//! Health check endpoint.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::state::AppState;

/// Health and readiness snapshot.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub engine: String,

    /// Tools available to the step runner.
    pub tools: usize,

    /// Planning templates registered with the orchestrator.
    pub planning_templates: usize,
}

/// Liveness plus orchestrator readiness. A node with no tools registered
/// cannot execute anything and reports `degraded`.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let tools = state.orchestrator.tool_count();
    let status = if tools > 0 { "healthy" } else { "degraded" };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        engine: "orchid/1.0".to_string(),
        tools,
        planning_templates: state.orchestrator.planning_template_count(),
    })
}
