//! Agent lifecycle and invitation endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use digicred_core::{CredentialAttribute, CredentialExchangeRecord, OutOfBandRecord};
use digicred_runtime::{AgentSummary, NewInvitation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{AgentParam, ApiResult, AppState};

#[derive(Deserialize)]
struct CreateAgentRequest {
    name: String,
    #[serde(default = "default_endpoint")]
    endpoint: String,
    port: u16,
}

fn default_endpoint() -> String {
    "http://localhost".into()
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AgentNameRequest {
    agent_name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReceiveInvitationRequest {
    agent_name: String,
    invitation_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LegacyInvitationResponse {
    invitation_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListenerResponse {
    agent_name: String,
    out_of_band_id: String,
    listening: bool,
}

/// `connectionId` carries the out-of-band id of the invitation.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IssueCredentialRequest {
    connection_id: String,
    credential_definition_id: String,
    #[serde(default)]
    attributes: Vec<CredentialAttribute>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IssueCredentialResponse {
    credential_exchange_record: CredentialExchangeRecord,
}

pub(crate) fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/agents", get(list_agents).post(create_agent))
        .route(
            "/api/v1/connections/create-new-invitation",
            post(create_new_invitation),
        )
        .route(
            "/api/v1/connections/create-legacy-invitation",
            post(create_legacy_invitation),
        )
        .route(
            "/api/v1/connections/receive-invitation",
            post(receive_invitation),
        )
        .route(
            "/api/v1/connections/setup-connection-listener/{agent_name}/{out_of_band_id}",
            get(setup_connection_listener),
        )
        .route(
            "/api/v1/connections/issue-credential",
            post(issue_credential),
        )
}

async fn create_agent(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateAgentRequest>,
) -> ApiResult<(StatusCode, Json<AgentSummary>)> {
    let summary = state
        .services
        .agents
        .create_agent(&req.name, &req.endpoint, req.port)
        .await?;
    let status = if summary.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(summary)))
}

async fn list_agents(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(state.services.agents.list_agents())
}

async fn create_new_invitation(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AgentNameRequest>,
) -> ApiResult<Json<NewInvitation>> {
    let invitation = state
        .services
        .agents
        .create_new_invitation(&req.agent_name)
        .await?;
    Ok(Json(invitation))
}

async fn create_legacy_invitation(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AgentNameRequest>,
) -> ApiResult<Json<LegacyInvitationResponse>> {
    let invitation = state
        .services
        .agents
        .create_legacy_invitation(&req.agent_name)
        .await?;
    Ok(Json(LegacyInvitationResponse {
        invitation_url: invitation.invitation_url,
    }))
}

async fn receive_invitation(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ReceiveInvitationRequest>,
) -> ApiResult<Json<OutOfBandRecord>> {
    let record = state
        .services
        .agents
        .receive_invitation(&req.agent_name, &req.invitation_url)
        .await?;
    Ok(Json(record))
}

async fn setup_connection_listener(
    State(state): State<Arc<AppState>>,
    Path((agent_name, out_of_band_id)): Path<(String, String)>,
) -> ApiResult<Json<ListenerResponse>> {
    state
        .services
        .agents
        .setup_connection_listener(&agent_name, &out_of_band_id)
        .await?;
    Ok(Json(ListenerResponse {
        agent_name,
        out_of_band_id,
        listening: true,
    }))
}

async fn issue_credential(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AgentParam>,
    Json(req): Json<IssueCredentialRequest>,
) -> ApiResult<Json<IssueCredentialResponse>> {
    let record = state
        .services
        .agents
        .issue_credential(
            params.agent.as_deref(),
            &req.connection_id,
            &req.credential_definition_id,
            &req.attributes,
        )
        .await?;
    Ok(Json(IssueCredentialResponse {
        credential_exchange_record: record,
    }))
}
