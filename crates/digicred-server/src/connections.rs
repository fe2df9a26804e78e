//! Connection record listings and lookups.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
};
use digicred_core::{ConnectionRecord, DidExchangeRole, DidExchangeState, DigiCredError};
use digicred_query::{CursorPage, Filter, OffsetPage, QuerySpec};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;

use crate::{AgentParam, ApiResult, AppState};

#[derive(Debug, Default, Deserialize)]
struct PageParams {
    agent: Option<String>,
    limit: Option<usize>,
    next: Option<String>,
    previous: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct OffsetParams {
    agent: Option<String>,
    #[serde(default)]
    offset: usize,
    limit: Option<usize>,
}

pub(crate) fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/connections", get(find_all))
        .route("/api/v1/connections/offset", get(find_all_offset))
        .route("/api/v1/connections/state/{state}", get(find_by_state))
        .route("/api/v1/connections/role/{role}", get(find_by_role))
        .route("/api/v1/connections/label/{their_label}", get(find_by_label))
        .route(
            "/api/v1/connections/metadata/{key}/{value}",
            get(find_by_metadata),
        )
        .route("/api/v1/connections/connection_id/{id}", get(find_by_id))
        .route("/api/v1/connections/did/{did}", get(find_by_did))
        .route("/api/v1/connections/thread_id/{id}", get(find_by_thread_id))
        .route(
            "/api/v1/connections/invitation_did/{did}",
            get(find_by_invitation_did),
        )
        .route(
            "/api/v1/connections/out_of_band_id/{id}",
            get(find_by_out_of_band_id),
        )
        .route(
            "/api/v1/connections/connection_types/{types}",
            get(find_by_connection_types),
        )
        .route("/api/v1/connections/{connection_id}", delete(delete_connection))
}

/// Build the query for a cursor listing. A token keeps the filter it was
/// minted with; a fresh listing starts from `filter`.
fn page_query(state: &AppState, params: &PageParams, filter: Option<Filter>) -> ApiResult<QuerySpec> {
    let limit = state.page_limit(params.limit);
    let mut query =
        QuerySpec::from_cursor_params(limit, params.next.as_deref(), params.previous.as_deref())?;
    if query.filter.is_none() {
        query.filter = filter;
    }
    Ok(query)
}

/// Parse a path segment as one of the runtime's state or role names.
fn parse_wire<T: DeserializeOwned>(kind: &str, raw: &str) -> ApiResult<T> {
    serde_json::from_value(serde_json::Value::String(raw.to_string()))
        .map_err(|_| DigiCredError::InvalidRequest(format!("unknown {kind} `{raw}`")).into())
}

async fn paged(
    state: &AppState,
    params: &PageParams,
    filter: Option<Filter>,
) -> ApiResult<Json<CursorPage<ConnectionRecord>>> {
    let query = page_query(state, params, filter)?;
    let page = state
        .services
        .connections
        .find_all(params.agent.as_deref(), &query)
        .await?;
    Ok(Json(page))
}

async fn find_all(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<CursorPage<ConnectionRecord>>> {
    paged(&state, &params, None).await
}

async fn find_all_offset(
    State(state): State<Arc<AppState>>,
    Query(params): Query<OffsetParams>,
) -> ApiResult<Json<OffsetPage<ConnectionRecord>>> {
    let limit = state.page_limit(params.limit);
    let page = state
        .services
        .connections
        .find_all_offset(params.agent.as_deref(), params.offset, limit)
        .await?;
    Ok(Json(page))
}

async fn find_by_state(
    State(state): State<Arc<AppState>>,
    Path(raw): Path<String>,
    Query(params): Query<AgentParam>,
) -> ApiResult<Json<Vec<ConnectionRecord>>> {
    let wanted: DidExchangeState = parse_wire("connection state", &raw)?;
    let records = state
        .services
        .connections
        .find_all_by_query(params.agent.as_deref(), &Filter::attribute("state", wanted.as_str()))
        .await?;
    Ok(Json(records))
}

async fn find_by_role(
    State(state): State<Arc<AppState>>,
    Path(raw): Path<String>,
    Query(params): Query<AgentParam>,
) -> ApiResult<Json<Vec<ConnectionRecord>>> {
    let wanted: DidExchangeRole = parse_wire("connection role", &raw)?;
    let records = state
        .services
        .connections
        .find_all_by_query(params.agent.as_deref(), &Filter::attribute("role", wanted.as_str()))
        .await?;
    Ok(Json(records))
}

async fn find_by_label(
    State(state): State<Arc<AppState>>,
    Path(their_label): Path<String>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<CursorPage<ConnectionRecord>>> {
    paged(&state, &params, Some(Filter::attribute("theirLabel", their_label))).await
}

async fn find_by_metadata(
    State(state): State<Arc<AppState>>,
    Path((key, value)): Path<(String, String)>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<CursorPage<ConnectionRecord>>> {
    paged(&state, &params, Some(Filter::metadata(key, value))).await
}

async fn find_by_id(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<AgentParam>,
) -> ApiResult<Json<Option<ConnectionRecord>>> {
    let record = state
        .services
        .connections
        .find_by_id(params.agent.as_deref(), &id)
        .await?;
    Ok(Json(record))
}

async fn find_by_did(
    State(state): State<Arc<AppState>>,
    Path(did): Path<String>,
    Query(params): Query<AgentParam>,
) -> ApiResult<Json<Option<ConnectionRecord>>> {
    let record = state
        .services
        .connections
        .find_by_did(params.agent.as_deref(), &did)
        .await?;
    Ok(Json(record))
}

async fn find_by_thread_id(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
    Query(params): Query<AgentParam>,
) -> ApiResult<Json<Option<ConnectionRecord>>> {
    let record = state
        .services
        .connections
        .find_by_thread_id(params.agent.as_deref(), &thread_id)
        .await?;
    Ok(Json(record))
}

async fn find_by_invitation_did(
    State(state): State<Arc<AppState>>,
    Path(did): Path<String>,
    Query(params): Query<AgentParam>,
) -> ApiResult<Json<Option<ConnectionRecord>>> {
    let record = state
        .services
        .connections
        .find_by_invitation_did(params.agent.as_deref(), &did)
        .await?;
    Ok(Json(record))
}

async fn find_by_out_of_band_id(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<AgentParam>,
) -> ApiResult<Json<Vec<ConnectionRecord>>> {
    let records = state
        .services
        .connections
        .find_all_by_out_of_band_id(params.agent.as_deref(), &id)
        .await?;
    Ok(Json(records))
}

async fn find_by_connection_types(
    State(state): State<Arc<AppState>>,
    Path(raw): Path<String>,
    Query(params): Query<AgentParam>,
) -> ApiResult<Json<Vec<ConnectionRecord>>> {
    let types: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect();
    if types.is_empty() {
        return Err(DigiCredError::InvalidRequest("no connection types given".into()).into());
    }
    let records = state
        .services
        .connections
        .find_all_by_connection_types(params.agent.as_deref(), &types)
        .await?;
    Ok(Json(records))
}

async fn delete_connection(
    State(state): State<Arc<AppState>>,
    Path(connection_id): Path<String>,
    Query(params): Query<AgentParam>,
) -> ApiResult<StatusCode> {
    state
        .services
        .connections
        .delete_by_id(params.agent.as_deref(), &connection_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
