//! Template registration endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use orchid_core::TaskTemplate;
use orchid_planner::DeclaredPlan;
use orchid_state::TemplateStore;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::api::{api_error, ApiError};
use crate::state::AppState;

/// Request to register a template.
#[derive(Debug, Deserialize)]
pub struct RegisterTemplateRequest {
    /// The template definition.
    pub template: TaskTemplate,

    /// The registering creator.
    pub creator_id: String,
}

/// Response after registering a template.
#[derive(Debug, Serialize)]
pub struct RegisterTemplateResponse {
    pub success: bool,
    pub template_id: String,

    /// On-chain registration reference, when it succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_reference: Option<String>,
}

/// Summary of a stored template.
#[derive(Debug, Serialize)]
pub struct TemplateSummary {
    pub id: String,
    pub name: String,
    pub version: String,
    pub creator_id: String,
    pub registered_at: String,
}

/// Response listing stored templates.
#[derive(Debug, Serialize)]
pub struct ListTemplatesResponse {
    pub success: bool,
    pub templates: Vec<TemplateSummary>,
}

/// Response with one template's full definition.
#[derive(Debug, Serialize)]
pub struct TemplateResponse {
    pub success: bool,
    pub template: TaskTemplate,
    pub creator_id: String,
}

/// Register a new template. Stored locally first; on-chain registration is
/// attempted afterwards and reported, not required.
pub async fn register_template(
    State(state): State<AppState>,
    Json(req): Json<RegisterTemplateRequest>,
) -> Result<(StatusCode, Json<RegisterTemplateResponse>), ApiError> {
    if req.template.id.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "template id is required"));
    }

    let template_id = state
        .store
        .store_template(req.template.clone(), &req.creator_id)
        .await
        .map_err(|e| {
            error!(error = %e, "template store failed");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "failed to store template")
        })?;

    // Declared steps become a planning template; executions against this
    // template id run them instead of a synthesized plan.
    if !req.template.steps.is_empty() {
        state
            .orchestrator
            .register_planning_template(Box::new(DeclaredPlan::new(req.template.clone())));
    }

    let chain_reference = match state
        .chain
        .register_template(&req.template, &req.creator_id)
        .await
    {
        Ok(reference) => Some(reference),
        Err(e) => {
            warn!(template = %template_id, error = %e, "on-chain registration failed");
            None
        }
    };

    Ok((
        StatusCode::CREATED,
        Json(RegisterTemplateResponse {
            success: true,
            template_id,
            chain_reference,
        }),
    ))
}

/// List all registered templates.
pub async fn list_templates(
    State(state): State<AppState>,
) -> Result<Json<ListTemplatesResponse>, ApiError> {
    let records = state.store.list_templates().await.map_err(|e| {
        error!(error = %e, "template listing failed");
        api_error(StatusCode::INTERNAL_SERVER_ERROR, "failed to list templates")
    })?;

    let templates = records
        .into_iter()
        .map(|r| TemplateSummary {
            id: r.template.id,
            name: r.template.name,
            version: r.template.version,
            creator_id: r.creator_id,
            registered_at: r.registered_at.to_rfc3339(),
        })
        .collect();

    Ok(Json(ListTemplatesResponse {
        success: true,
        templates,
    }))
}

/// Get the latest registration for a template id.
pub async fn get_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TemplateResponse>, ApiError> {
    let record = state
        .store
        .get_template(&id)
        .await
        .map_err(|e| {
            error!(error = %e, "template lookup failed");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "failed to look up template")
        })?
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("Template {} not found", id)))?;

    Ok(Json(TemplateResponse {
        success: true,
        template: record.template,
        creator_id: record.creator_id,
    }))
}
