//! Prometheus-compatible metrics for the gateway.
//!
//! HTTP counters live here; workflow counters are owned by the correlator and
//! passed in at render time.

use digicred_runtime::WorkflowStatsSnapshot;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug)]
struct MetricsInner {
    /// Total HTTP requests served.
    http_requests_total: AtomicU64,
    /// Total HTTP errors (4xx + 5xx).
    http_errors_total: AtomicU64,
    /// Total requests rejected by the API key check.
    auth_rejections_total: AtomicU64,
    started_at: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner {
                http_requests_total: AtomicU64::new(0),
                http_errors_total: AtomicU64::new(0),
                auth_rejections_total: AtomicU64::new(0),
                started_at: Instant::now(),
            }),
        }
    }

    pub fn inc_http_requests(&self) {
        self.inner
            .http_requests_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_http_errors(&self) {
        self.inner.http_errors_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_auth_rejections(&self) {
        self.inner
            .auth_rejections_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn uptime_secs(&self) -> u64 {
        self.inner.started_at.elapsed().as_secs()
    }

    /// Render metrics in Prometheus text exposition format.
    pub fn render_prometheus(&self, workflow: &WorkflowStatsSnapshot, agents: usize) -> String {
        let m = &self.inner;
        format!(
            r#"# HELP digicred_uptime_seconds Time since the server started.
# TYPE digicred_uptime_seconds gauge
digicred_uptime_seconds {}

# HELP digicred_agents Agents currently registered.
# TYPE digicred_agents gauge
digicred_agents {}

# HELP digicred_http_requests_total Total HTTP requests served.
# TYPE digicred_http_requests_total counter
digicred_http_requests_total {}

# HELP digicred_http_errors_total Total HTTP errors (4xx/5xx).
# TYPE digicred_http_errors_total counter
digicred_http_errors_total {}

# HELP digicred_auth_rejections_total Total requests rejected for a missing or wrong API key.
# TYPE digicred_auth_rejections_total counter
digicred_auth_rejections_total {}

# HELP digicred_invitations_watched_total Invitations watched for connection completion.
# TYPE digicred_invitations_watched_total counter
digicred_invitations_watched_total {}

# HELP digicred_connections_completed_total Watched invitations whose connection completed.
# TYPE digicred_connections_completed_total counter
digicred_connections_completed_total {}

# HELP digicred_credential_requests_accepted_total Credential requests auto-accepted.
# TYPE digicred_credential_requests_accepted_total counter
digicred_credential_requests_accepted_total {}

# HELP digicred_credential_accept_failures_total Credential request accepts that failed.
# TYPE digicred_credential_accept_failures_total counter
digicred_credential_accept_failures_total {}

# HELP digicred_listener_failures_total Completion callbacks that panicked.
# TYPE digicred_listener_failures_total counter
digicred_listener_failures_total {}

# HELP digicred_watchers_swept_total Matched invitation watchers pruned by the sweep.
# TYPE digicred_watchers_swept_total counter
digicred_watchers_swept_total {}
"#,
            self.uptime_secs(),
            agents,
            m.http_requests_total.load(Ordering::Relaxed),
            m.http_errors_total.load(Ordering::Relaxed),
            m.auth_rejections_total.load(Ordering::Relaxed),
            workflow.invitations_watched,
            workflow.connections_completed,
            workflow.credential_requests_accepted,
            workflow.accept_failures,
            workflow.listener_failures,
            workflow.watchers_swept,
        )
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
