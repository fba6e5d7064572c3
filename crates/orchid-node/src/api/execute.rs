//! Task execution endpoints.

use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use orchid_core::{TaskResult, TaskStatus};
use orchid_engine::TaskOrchestrator;
use orchid_state::{ResultStore, TemplateStore};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::error;
use uuid::Uuid;

use crate::api::{api_error, ApiError};
use crate::state::AppState;

/// Request to execute a task.
#[derive(Debug, Deserialize)]
pub struct ExecuteTaskRequest {
    /// Template to execute; omitted for ad-hoc dynamic planning.
    #[serde(default)]
    pub template_id: Option<String>,

    /// Raw user inputs.
    #[serde(default)]
    pub inputs: BTreeMap<String, Value>,

    /// The requesting user.
    pub user_id: String,
}

/// Response wrapping a task result.
#[derive(Debug, Serialize)]
pub struct ExecuteTaskResponse {
    pub success: bool,
    pub result: TaskResult,
}

/// Execute a task. The response is 200 even for failed tasks; `success`
/// reflects the task outcome, HTTP status reflects the request handling.
pub async fn execute_task(
    State(state): State<AppState>,
    Json(req): Json<ExecuteTaskRequest>,
) -> Result<Json<ExecuteTaskResponse>, ApiError> {
    let template = match &req.template_id {
        Some(id) => state
            .store
            .get_template(id)
            .await
            .map_err(|e| {
                error!(error = %e, "template lookup failed");
                api_error(StatusCode::INTERNAL_SERVER_ERROR, "failed to look up template")
            })?
            .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("Template {} not found", id)))?
            .template,
        None => TaskOrchestrator::adhoc_template(),
    };

    let result = state
        .orchestrator
        .run_task(&template, req.inputs, &req.user_id)
        .await;

    Ok(Json(ExecuteTaskResponse {
        success: result.status == TaskStatus::Success,
        result,
    }))
}

/// Get a stored task result by task id.
pub async fn get_result(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ExecuteTaskResponse>, ApiError> {
    let result = state
        .store
        .get_result(id)
        .await
        .map_err(|e| {
            error!(error = %e, "result lookup failed");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "failed to look up result")
        })?
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("Result {} not found", id)))?;

    Ok(Json(ExecuteTaskResponse {
        success: result.status == TaskStatus::Success,
        result,
    }))
}
