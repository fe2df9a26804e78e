//! # digicred-server
//!
//! REST API server for the DigiCred gateway. Provides:
//!
//! - agent lifecycle and invitation endpoints
//! - connection listings with cursor and offset pagination
//! - basic messages, DID import, schema and credential definition registration
//! - `/health` and Prometheus `/metrics`

pub mod error;
pub mod metrics;

mod agents;
mod connections;
mod ledger;
mod messages;

pub use error::{ApiError, ApiResult};

use axum::{
    Router,
    extract::{Query, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{Html, Json, Response},
    routing::get,
};
use digicred_core::DigiCredError;
use digicred_runtime::{Services, qr};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared server state.
pub struct AppState {
    pub services: Arc<Services>,
    /// Prometheus-compatible metrics.
    pub metrics: metrics::Metrics,
}

impl AppState {
    /// Page size for a listing request, bounded by the live config.
    pub(crate) fn page_limit(&self, requested: Option<usize>) -> usize {
        self.services.config().read().pagination.effective_limit(requested)
    }
}

/// Optional `?agent=` selector; absent means the latest agent.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct AgentParam {
    pub agent: Option<String>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    uptime_secs: u64,
    agents: usize,
}

#[derive(Deserialize)]
struct QrCodeParams {
    data: String,
}

/// Build the Axum router.
pub fn build_router(services: Arc<Services>) -> Router {
    let cors = services.config().read().server.cors;
    let state = Arc::new(AppState {
        services,
        metrics: metrics::Metrics::new(),
    });

    let api_routes = Router::new()
        .route("/api/v1/qrcode", get(qrcode_handler))
        .merge(agents::routes())
        .merge(connections::routes())
        .merge(messages::routes())
        .merge(ledger::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let mut router = Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .merge(api_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            track_requests,
        ))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if cors {
        router = router.layer(CorsLayer::permissive());
    }

    router
}

/// Checks the Authorization header against the configured API key.
///
/// The key is read per request so a hot-reloaded config takes effect
/// without a restart.
async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let expected = state.services.config().read().server.api_key.clone();
    if let Some(expected_key) = expected {
        let provided = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        match provided {
            Some(key) if key == expected_key => {}
            _ => {
                state.metrics.inc_auth_rejections();
                warn!(path = %request.uri().path(), "unauthorized API request, invalid or missing API key");
                return Err(StatusCode::UNAUTHORIZED);
            }
        }
    }
    Ok(next.run(request).await)
}

async fn track_requests(State(state): State<Arc<AppState>>, request: Request, next: Next) -> Response {
    state.metrics.inc_http_requests();
    let response = next.run(request).await;
    if response.status().is_client_error() || response.status().is_server_error() {
        state.metrics.inc_http_errors();
    }
    response
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        uptime_secs: state.metrics.uptime_secs(),
        agents: state.services.registry.len(),
    })
}

/// Prometheus-compatible metrics endpoint.
async fn metrics_handler(
    State(state): State<Arc<AppState>>,
) -> (
    StatusCode,
    [(axum::http::header::HeaderName, &'static str); 1],
    String,
) {
    let workflow = state.services.correlator.stats().snapshot();
    let body = state
        .metrics
        .render_prometheus(&workflow, state.services.registry.len());
    (
        StatusCode::OK,
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        body,
    )
}

/// Render `data` as an HTML `<img>` holding a QR code.
async fn qrcode_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<QrCodeParams>,
) -> ApiResult<Html<String>> {
    if params.data.is_empty() {
        return Err(DigiCredError::InvalidRequest("`data` is empty".into()).into());
    }
    let min_dimension = state.services.config().read().qrcode.min_dimension;
    let data_url = qr::to_data_url(&params.data, min_dimension)?;
    Ok(Html(qr::img_tag(&data_url)))
}

/// Start the HTTP server and serve until Ctrl-C.
pub async fn start_server(services: Arc<Services>) -> digicred_core::Result<()> {
    let listen = services.config().read().server.listen.clone();
    let router = build_router(Arc::clone(&services));

    info!(listen = %listen, "starting HTTP server");

    let listener = tokio::net::TcpListener::bind(&listen)
        .await
        .map_err(|e| DigiCredError::Config(format!("failed to bind {listen}: {e}")))?;

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_err() {
                warn!("could not install Ctrl-C handler");
                std::future::pending::<()>().await;
            }
            info!("shutdown signal received");
        })
        .await?;

    services.shutdown();
    Ok(())
}
