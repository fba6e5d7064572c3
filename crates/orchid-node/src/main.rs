//! # Orchid Node
//!
//! Main Orchid node binary with API server.

use std::net::SocketAddr;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

mod api;
mod state;

use state::AppState;

/// Run the Orchid node server.
pub async fn run_server(addr: SocketAddr) -> anyhow::Result<()> {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("🚀 Orchid Node starting...");

    // Create shared application state
    let state = AppState::new();

    // Build the router
    let app = create_router(state);

    info!("🌐 Listening on http://{}", addr);

    // Start the server
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the API router.
fn create_router(state: AppState) -> Router {
    // CORS layer
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        // Template API
        .route("/api/v1/templates", post(api::template::register_template))
        .route("/api/v1/templates", get(api::template::list_templates))
        .route("/api/v1/templates/:id", get(api::template::get_template))
        // Execution API
        .route("/api/v1/execute", post(api::execute::execute_task))
        .route("/api/v1/results/:id", get(api::execute::get_result))
        // Add middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], 3000));
    run_server(addr).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_test::TestServer;
    use serde_json::{json, Value};

    fn server() -> TestServer {
        TestServer::new(create_router(AppState::new())).unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let server = server();
        let response = server.get("/health").await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body["status"], "healthy");
        // The built-in tool set is wired in at startup.
        assert_eq!(body["tools"], json!(6));
        assert_eq!(body["planning_templates"], json!(0));
    }

    #[tokio::test]
    async fn test_template_registration_roundtrip() {
        let server = server();

        let response = server
            .post("/api/v1/templates")
            .json(&json!({
                "template": {
                    "id": "sol-price-watch",
                    "name": "SOL price watch",
                    "version": "1.0.0",
                    "category": "analytics"
                },
                "creator_id": "creator-1"
            }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);

        let body: Value = response.json();
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["template_id"], "sol-price-watch");

        let fetched = server.get("/api/v1/templates/sol-price-watch").await;
        fetched.assert_status_ok();
        let body: Value = fetched.json();
        assert_eq!(body["template"]["name"], "SOL price watch");
        assert_eq!(body["creator_id"], "creator-1");

        let listed = server.get("/api/v1/templates").await;
        let body: Value = listed.json();
        assert_eq!(body["templates"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_template_is_not_found() {
        let server = server();
        let response = server.get("/api/v1/templates/nope").await;
        response.assert_status_not_found();

        let body: Value = response.json();
        assert_eq!(body["success"], json!(false));
        assert!(body["error"].as_str().unwrap().contains("nope"));
    }

    #[tokio::test]
    async fn test_template_declared_steps_drive_execution() {
        let server = server();

        let response = server
            .post("/api/v1/templates")
            .json(&json!({
                "template": {
                    "id": "declared-fetch",
                    "name": "Declared fetch",
                    "version": "1.0.0",
                    "category": "analytics",
                    "steps": [{
                        "id": "declared_step_1",
                        "tool_id": "api_call",
                        "expected_outputs": ["apiData"]
                    }]
                },
                "creator_id": "creator-1"
            }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);

        let response = server
            .post("/api/v1/execute")
            .json(&json!({
                "template_id": "declared-fetch",
                "inputs": {"content": "price of SOL"},
                "user_id": "user-1"
            }))
            .await;
        response.assert_status_ok();

        // The single declared step ran, not the synthesized analysis plan.
        let body: Value = response.json();
        assert_eq!(body["success"], json!(true));
        assert_eq!(
            body["result"]["metadata"]["resource_usage"]["steps_executed"],
            json!(1)
        );
        assert!(body["result"]["outputs"]["apiData"].is_object());

        let health = server.get("/health").await;
        let body: Value = health.json();
        assert_eq!(body["planning_templates"], json!(1));
    }

    #[tokio::test]
    async fn test_adhoc_execution_happy_path() {
        let server = server();

        let response = server
            .post("/api/v1/execute")
            .json(&json!({
                "inputs": {
                    "type": "query",
                    "content": "price of SOL",
                    "entities": [{"type": "token", "value": "SOL"}]
                },
                "user_id": "user-1"
            }))
            .await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["result"]["status"], "success");
        assert!(body["result"]["outputs"]["analysis"].is_string());

        // The result can be fetched back by task id.
        let task_id = body["result"]["task_id"].as_str().unwrap().to_string();
        let fetched = server.get(&format!("/api/v1/results/{}", task_id)).await;
        fetched.assert_status_ok();
    }

    #[tokio::test]
    async fn test_execution_failure_is_reported_not_500() {
        let server = server();

        let response = server
            .post("/api/v1/execute")
            .json(&json!({
                "inputs": {"entities": "not-an-array"},
                "user_id": "user-1"
            }))
            .await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["result"]["status"], "failure");
        assert!(body["result"]["error"].as_str().unwrap().contains("parsing"));
    }

    #[tokio::test]
    async fn test_execute_with_unknown_template_is_not_found() {
        let server = server();

        let response = server
            .post("/api/v1/execute")
            .json(&json!({
                "template_id": "nope",
                "inputs": {},
                "user_id": "user-1"
            }))
            .await;
        response.assert_status_not_found();
    }
}
