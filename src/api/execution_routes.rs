//! Execution REST routes — the control surface.
//!
//! ## Endpoints
//!
//! - `POST /api/executions`          - Create a record and start its runner
//! - `GET  /api/executions`          - List all execution records
//! - `GET  /api/executions/:id`      - Fetch one record
//! - `PUT  /api/executions/:id/stop` - Cancel the runner, mark failed
//! - `GET  /ws`                      - WebSocket stream of execution events

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;
use uuid::Uuid;

use super::{ws::ws_handler, AppState};
use crate::model::{CreateExecutionRequest, ExecutionRecord};
use crate::store::StoreError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
}

fn not_found(what: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            message: format!("{what} not found"),
        }),
    )
}

/// Create the execution router — call from main.rs.
pub fn create_execution_router(state: AppState) -> Router<()> {
    Router::new()
        .route(
            "/api/executions",
            post(create_execution).get(list_executions),
        )
        .route("/api/executions/:id", get(get_execution))
        .route("/api/executions/:id/stop", put(stop_execution))
        .route("/ws", get(ws_handler))
        .with_state(state)
}

/// POST /api/executions
///
/// Returns 201 with the created record, then triggers the runner. The
/// runner's first update may race the response on the observer stream;
/// clients tolerate an update arriving before the creation reply.
async fn create_execution(
    State(state): State<AppState>,
    payload: Result<Json<CreateExecutionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ExecutionRecord>), (StatusCode, Json<ErrorResponse>)> {
    // Any body rejection is a plain 400; no record is created and no
    // runner is started.
    let Json(req) = payload.map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                message: "Invalid execution data".to_string(),
            }),
        )
    })?;

    let record = state.store.create(req).await;

    if let Err(err) = state.runner.start(record.id).await {
        // Freshly minted ids cannot collide with an active runner.
        tracing::error!(execution_id = %record.id, error = %err, "failed to start runner");
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                message: "Failed to start execution".to_string(),
            }),
        ));
    }

    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /api/executions
async fn list_executions(State(state): State<AppState>) -> Json<Vec<ExecutionRecord>> {
    Json(state.store.list().await)
}

/// GET /api/executions/:id
async fn get_execution(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ExecutionRecord>, (StatusCode, Json<ErrorResponse>)> {
    let record = state.store.get(id).await.ok_or_else(|| not_found("Execution"))?;
    Ok(Json(record))
}

/// PUT /api/executions/:id/stop
async fn stop_execution(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ExecutionRecord>, (StatusCode, Json<ErrorResponse>)> {
    match state.runner.stop(id).await {
        Ok(record) => Ok(Json(record)),
        Err(StoreError::NotFound(_)) => Err(not_found("Execution")),
    }
}
