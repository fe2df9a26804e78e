use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use digicred_core::BasicMessageRecord;
use serde::Deserialize;
use std::sync::Arc;

use crate::{AgentParam, ApiResult, AppState};

/// `connectionId` carries the out-of-band id of the invitation.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendMessageRequest {
    connection_id: String,
    message: String,
}

pub(crate) fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/message/send", post(send_message))
        .route("/api/v1/message/{id}", get(get_message).delete(delete_message))
}

async fn send_message(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AgentParam>,
    Json(req): Json<SendMessageRequest>,
) -> ApiResult<Json<BasicMessageRecord>> {
    let record = state
        .services
        .messages
        .send_message(params.agent.as_deref(), &req.connection_id, &req.message)
        .await?;
    Ok(Json(record))
}

async fn get_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<AgentParam>,
) -> ApiResult<Json<BasicMessageRecord>> {
    let record = state
        .services
        .messages
        .get_message(params.agent.as_deref(), &id)
        .await?;
    Ok(Json(record))
}

async fn delete_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<AgentParam>,
) -> ApiResult<Json<serde_json::Value>> {
    let message = state
        .services
        .messages
        .delete_message(params.agent.as_deref(), &id)
        .await?;
    Ok(Json(serde_json::json!({ "message": message })))
}
