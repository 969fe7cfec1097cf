//! Recording processing API endpoints.
//!
//! Provides HTTP endpoints for:
//! - Starting a processing run (POST /recordings/:id/process)
//! - Reading the workflow status (GET /recordings/:id/status)
//! - Reading summary and tasks (GET /recordings/:id/insights)

use crate::api::error::{ApiError, ApiResult};
use crate::api::AppState;
use crate::cache::{organization_tag, project_tag, recording_tag};
use crate::db::{InsightsRepository, RecordingRepository};
use crate::workflow::WorkflowStatus;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, error, info};

/// Request body for the process endpoint.
#[derive(Debug, Deserialize, Default)]
pub struct ProcessRequest {
    #[serde(default)]
    pub reprocess: bool,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/:id/process", post(process_recording))
        .route("/:id/status", get(recording_status))
        .route("/:id/insights", get(recording_insights))
        .with_state(state)
}

fn insights_key(recording_id: &str) -> String {
    format!("insights:{}", recording_id)
}

/// POST /recordings/:id/process - Start a background processing run.
async fn process_recording(
    Path(id): Path<String>,
    State(state): State<AppState>,
    body: Option<Json<ProcessRequest>>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let reprocess = body.map(|Json(req)| req.reprocess).unwrap_or(false);

    let db = state.db.clone();
    let lookup_id = id.clone();
    let exists = tokio::task::spawn_blocking(move || {
        db.with_conn(|conn| RecordingRepository::get(conn, &lookup_id))
    })
    .await??
    .is_some();

    if !exists {
        return Err(ApiError::not_found("Recording not found"));
    }

    info!("Process command received via API for recording {}", id);

    let workflow = state.workflow.clone();
    let run_id = id.clone();
    tokio::spawn(async move {
        match workflow
            .convert_recording_into_ai_insights(&run_id, reprocess)
            .await
        {
            Ok(result) => info!(
                "Background run for {} completed with {} tasks",
                result.recording_id, result.tasks_extracted
            ),
            Err(e) => error!("Background run for {} failed: {}", run_id, e),
        }
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "success": true,
            "recordingId": id,
            "reprocess": reprocess,
            "message": "Processing started",
        })),
    ))
}

/// GET /recordings/:id/status - Get the persisted workflow status.
async fn recording_status(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<Json<WorkflowStatus>> {
    let status = state
        .workflow
        .status_tracker()
        .read(&id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("No workflow status for recording {}", id)))?;

    Ok(Json(status))
}

/// GET /recordings/:id/insights - Summary and tasks, served from the cache
/// until the next run for the recording finishes.
async fn recording_insights(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<Json<Value>> {
    let key = insights_key(&id);
    if let Some(cached) = state.cache.get(&key).await {
        return Ok(Json(cached));
    }

    let generation = state.cache.generation().await;
    let db = state.db.clone();
    let lookup_id = id.clone();
    let loaded = tokio::task::spawn_blocking(move || {
        db.with_conn(|conn| {
            let Some(recording) = RecordingRepository::get(conn, &lookup_id)? else {
                return Ok(None);
            };
            let summary = InsightsRepository::get_summary(conn, &lookup_id)?;
            let tasks = InsightsRepository::list_tasks(conn, &lookup_id)?;
            Ok(Some((recording, summary, tasks)))
        })
    })
    .await??;

    let Some((recording, summary, tasks)) = loaded else {
        return Err(ApiError::not_found("Recording not found"));
    };

    let body = json!({
        "recordingId": recording.id,
        "title": recording.title,
        "projectId": recording.project_id,
        "summary": summary,
        "tasks": tasks,
    });

    let cached = state
        .cache
        .insert_if_current(
            key,
            vec![
                recording_tag(&recording.id),
                project_tag(&recording.project_id),
                organization_tag(&recording.organization_id),
            ],
            body.clone(),
            generation,
        )
        .await;
    if !cached {
        debug!(recording_id = %id, "Insights changed while loading, not caching");
    }

    Ok(Json(body))
}
