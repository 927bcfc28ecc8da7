use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use super::error::{ApiError, Operation};
use crate::AppState;
use crate::domain::{ActorPage, ActorSchema, Credential, Run};

/// Request body for `POST /run-actor`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunActorRequest {
    #[serde(default)]
    pub actor_id: Option<String>,
    /// Run configuration. Defaults to an empty object.
    #[serde(default)]
    pub input: Option<Value>,
}

/// Actor list in the platform's `{"data": {...}}` envelope.
#[derive(Debug, Serialize)]
pub struct ActorListResponse {
    pub data: ActorPage,
}

/// GET /actors - Actors visible to the caller's credential.
pub async fn list_actors(
    State(state): State<AppState>,
    Extension(credential): Extension<Credential>,
) -> Result<Json<ActorListResponse>, ApiError> {
    let data = state
        .platform
        .list_actors(&credential)
        .await
        .map_err(|e| ApiError::upstream(Operation::ListActors, e))?;

    Ok(Json(ActorListResponse { data }))
}

/// GET /actor-schema/{actor_id} - Input schema of one actor.
pub async fn actor_schema(
    State(state): State<AppState>,
    Extension(credential): Extension<Credential>,
    Path(actor_id): Path<String>,
) -> Result<Json<ActorSchema>, ApiError> {
    state
        .platform
        .fetch_input_schema(&credential, &actor_id)
        .await
        .map(Json)
        .map_err(|e| ApiError::upstream(Operation::FetchSchema, e))
}

/// POST /run-actor - Start a run, returning its first observation.
pub async fn run_actor(
    State(state): State<AppState>,
    Extension(credential): Extension<Credential>,
    payload: Result<Json<RunActorRequest>, JsonRejection>,
) -> Result<Json<Run>, ApiError> {
    let Json(req) = payload.map_err(|rejection| {
        debug!(name: "api.run_actor.rejected", reason = %rejection.body_text(), "Rejected run request body");
        ApiError::InvalidRequest(format!("Invalid request body: {}", rejection.body_text()))
    })?;

    let actor_id = req
        .actor_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::InvalidRequest("Actor ID is required".to_string()))?;
    let input = req.input.unwrap_or_else(|| json!({}));

    state
        .coordinator
        .submit_and_observe(&credential, &actor_id, &input)
        .await
        .map(Json)
        .map_err(|e| ApiError::upstream(Operation::RunActor, e))
}

/// GET /run-status/{run_id} - Observe a run again.
pub async fn run_status(
    State(state): State<AppState>,
    Extension(credential): Extension<Credential>,
    Path(run_id): Path<String>,
) -> Result<Json<Run>, ApiError> {
    state
        .coordinator
        .check_status(&credential, &run_id)
        .await
        .map(Json)
        .map_err(|e| ApiError::upstream(Operation::RunStatus, e))
}

/// GET /health - Liveness check, no credential required.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
