//! REST API server for InsightFlow.
//!
//! Provides HTTP endpoints for:
//! - Starting a processing run for a recording
//! - Reading the persisted workflow status
//! - Reading a recording's summary and tasks (cached)

pub mod error;
pub mod routes;

use crate::cache::InsightsCache;
use crate::db::Database;
use crate::workflow::InsightsWorkflow;
use anyhow::Result;
use axum::{response::Json, routing::get, Router};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tracing::info;

/// Everything the handlers need, cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub workflow: InsightsWorkflow,
    pub db: Database,
    pub cache: InsightsCache,
}

pub struct ApiServer {
    port: u16,
    state: AppState,
}

impl ApiServer {
    pub fn new(port: u16, state: AppState) -> Self {
        Self { port, state }
    }

    pub async fn start(self) -> Result<()> {
        let app = router(self.state);

        let listener = tokio::net::TcpListener::bind(&format!("127.0.0.1:{}", self.port)).await?;

        info!("API server listening on http://127.0.0.1:{}", self.port);
        info!("Endpoints:");
        info!("  GET  /                         - Service info");
        info!("  GET  /version                  - Get version info");
        info!("  POST /recordings/:id/process   - Start processing a recording");
        info!("  GET  /recordings/:id/status    - Get workflow status");
        info!("  GET  /recordings/:id/insights  - Get summary and tasks");

        axum::serve(listener, app).await?;

        Ok(())
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(status))
        .route("/version", get(version))
        .nest("/recordings", routes::recordings::router(state))
        .layer(ServiceBuilder::new())
}

async fn status() -> Json<Value> {
    Json(json!({
        "service": "insightflow",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

async fn version() -> Json<Value> {
    Json(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "name": "insightflow"
    }))
}
