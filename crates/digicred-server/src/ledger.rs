//! DID import and AnonCreds registration endpoints.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::post,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{AgentParam, ApiResult, AppState};

#[derive(Deserialize)]
struct ImportDidRequest {
    seed: String,
    did: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterSchemaRequest {
    did: String,
    schema_name: String,
    version: String,
    attr_names: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterSchemaResponse {
    schema_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterCredentialDefinitionRequest {
    did: String,
    schema_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterCredentialDefinitionResponse {
    credential_definition_id: String,
}

pub(crate) fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/ledger/import-did", post(import_did))
        .route("/api/v1/ledger/register-schema", post(register_schema))
        .route(
            "/api/v1/ledger/register-credential-definition",
            post(register_credential_definition),
        )
}

async fn import_did(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AgentParam>,
    Json(req): Json<ImportDidRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let message = state
        .services
        .ledger
        .import_did(params.agent.as_deref(), &req.seed, &req.did)
        .await?;
    Ok(Json(serde_json::json!({ "message": message })))
}

async fn register_schema(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AgentParam>,
    Json(req): Json<RegisterSchemaRequest>,
) -> ApiResult<Json<RegisterSchemaResponse>> {
    let schema_id = state
        .services
        .ledger
        .register_schema(
            params.agent.as_deref(),
            &req.did,
            &req.schema_name,
            &req.version,
            &req.attr_names,
        )
        .await?;
    Ok(Json(RegisterSchemaResponse { schema_id }))
}

async fn register_credential_definition(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AgentParam>,
    Json(req): Json<RegisterCredentialDefinitionRequest>,
) -> ApiResult<Json<RegisterCredentialDefinitionResponse>> {
    let credential_definition_id = state
        .services
        .ledger
        .register_credential_definition(params.agent.as_deref(), &req.did, &req.schema_id)
        .await?;
    Ok(Json(RegisterCredentialDefinitionResponse {
        credential_definition_id,
    }))
}
