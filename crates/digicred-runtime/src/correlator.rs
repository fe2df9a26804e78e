//! Invitation-to-credential workflow correlation.
//!
//! Two tiers of watchers run on each agent's event stream:
//!
//! 1. **Connection watchers** are keyed by the correlation token (out-of-band
//!    id) of an invitation. The first `completed` connection event carrying
//!    that token fires the watcher's callback and tombstones it.
//! 2. **Credential watchers** are scoped to the agent. They log every
//!    credential state change and auto-accept holder requests.
//!
//! Each agent has exactly one event pump task. Events for one agent are
//! handled in emission order and a handler finishes (including any awaited
//! accept call) before the next event is taken.

use dashmap::DashMap;
use digicred_config::{CredentialWatchMode, DigiCredConfig, WorkflowConfig};
use digicred_core::{
    AgentEvent, AgentHandle, ConnectionEvent, CredentialEvent, CredentialState, DigiCredError,
    Result,
};
use futures::FutureExt;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Runs once when the watched invitation's connection completes.
pub type CompletionCallback = Box<dyn FnOnce(&ConnectionEvent) + Send + 'static>;

/// Workflow counters, exported on `/metrics`.
#[derive(Debug, Default)]
pub struct WorkflowStats {
    pub invitations_watched: AtomicU64,
    pub connections_completed: AtomicU64,
    pub credential_requests_accepted: AtomicU64,
    pub accept_failures: AtomicU64,
    pub listener_failures: AtomicU64,
    pub watchers_swept: AtomicU64,
}

/// Point-in-time copy of [`WorkflowStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WorkflowStatsSnapshot {
    pub invitations_watched: u64,
    pub connections_completed: u64,
    pub credential_requests_accepted: u64,
    pub accept_failures: u64,
    pub listener_failures: u64,
    pub watchers_swept: u64,
}

impl WorkflowStats {
    pub fn snapshot(&self) -> WorkflowStatsSnapshot {
        WorkflowStatsSnapshot {
            invitations_watched: self.invitations_watched.load(Ordering::Relaxed),
            connections_completed: self.connections_completed.load(Ordering::Relaxed),
            credential_requests_accepted: self
                .credential_requests_accepted
                .load(Ordering::Relaxed),
            accept_failures: self.accept_failures.load(Ordering::Relaxed),
            listener_failures: self.listener_failures.load(Ordering::Relaxed),
            watchers_swept: self.watchers_swept.load(Ordering::Relaxed),
        }
    }
}

struct ConnectionWatcher {
    token: String,
    /// Set on first match; the sweep removes tombstoned watchers.
    matched: AtomicBool,
    on_complete: Mutex<Option<CompletionCallback>>,
}

struct AgentWorkflow {
    agent: Arc<dyn AgentHandle>,
    watchers: Mutex<Vec<Arc<ConnectionWatcher>>>,
    credential_watchers: AtomicUsize,
    pump: Mutex<Option<JoinHandle<()>>>,
}

/// Routes agent events to connection and credential watchers.
pub struct WorkflowCorrelator {
    agents: DashMap<String, Arc<AgentWorkflow>>,
    /// Shared with the config loader so hot reloads apply to new events.
    config: Arc<RwLock<DigiCredConfig>>,
    stats: WorkflowStats,
}

impl WorkflowCorrelator {
    pub fn new(settings: WorkflowConfig) -> Self {
        let config = DigiCredConfig {
            workflow: settings,
            ..Default::default()
        };
        Self::with_shared_config(Arc::new(RwLock::new(config)))
    }

    pub fn with_shared_config(config: Arc<RwLock<DigiCredConfig>>) -> Self {
        Self {
            agents: DashMap::new(),
            config,
            stats: WorkflowStats::default(),
        }
    }

    pub fn stats(&self) -> &WorkflowStats {
        &self.stats
    }

    /// Swap in new settings. Existing credential watchers stay installed.
    pub fn update_settings(&self, settings: WorkflowConfig) {
        self.config.write().workflow = settings;
    }

    /// Start routing `agent`'s events. Idempotent per agent name.
    ///
    /// The subscription is taken before this returns, so no event emitted
    /// afterwards is missed.
    pub fn attach(self: &Arc<Self>, agent: Arc<dyn AgentHandle>) {
        let name = agent.name().to_string();
        let workflow = self.workflow_for(agent);
        let mut pump = workflow.pump.lock();
        if pump.is_some() {
            return;
        }

        let mut rx = workflow.agent.subscribe();
        let correlator = Arc::clone(self);
        let agent_name = name.clone();
        *pump = Some(tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => correlator.handle_event(&agent_name, &event).await,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(agent = %agent_name, skipped, "event pump lagged, events dropped");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            debug!(agent = %agent_name, "event pump stopped");
        }));
        info!(agent = %name, "workflow event pump started");
    }

    /// Track `agent` without starting a pump; events are then fed through
    /// [`handle_event`](Self::handle_event) by the caller.
    pub fn register(&self, agent: Arc<dyn AgentHandle>) {
        self.workflow_for(agent);
    }

    fn workflow_for(&self, agent: Arc<dyn AgentHandle>) -> Arc<AgentWorkflow> {
        let name = agent.name().to_string();
        self.agents
            .entry(name)
            .or_insert_with(|| {
                Arc::new(AgentWorkflow {
                    agent,
                    watchers: Mutex::new(Vec::new()),
                    credential_watchers: AtomicUsize::new(0),
                    pump: Mutex::new(None),
                })
            })
            .clone()
    }

    /// Install a connection watcher for `token` on `agent_name`.
    pub fn watch_invitation(
        &self,
        agent_name: &str,
        token: &str,
        on_complete: Option<CompletionCallback>,
    ) -> Result<()> {
        let workflow = self
            .agents
            .get(agent_name)
            .map(|w| Arc::clone(w.value()))
            .ok_or_else(|| DigiCredError::AgentNotInitialized(agent_name.to_string()))?;
        workflow.watchers.lock().push(Arc::new(ConnectionWatcher {
            token: token.to_string(),
            matched: AtomicBool::new(false),
            on_complete: Mutex::new(on_complete),
        }));
        self.stats.invitations_watched.fetch_add(1, Ordering::Relaxed);
        info!(agent = %agent_name, out_of_band_id = %token, "watching invitation");
        Ok(())
    }

    /// Dispatch one event for `agent_name` to its watchers.
    pub async fn handle_event(&self, agent_name: &str, event: &AgentEvent) {
        let Some(workflow) = self.agents.get(agent_name).map(|w| Arc::clone(w.value())) else {
            debug!(agent = %agent_name, kind = event.kind(), "event for untracked agent");
            return;
        };
        match event {
            AgentEvent::ConnectionStateChanged(ev) => {
                self.on_connection_event(agent_name, &workflow, ev)
            }
            AgentEvent::CredentialStateChanged(ev) => {
                self.on_credential_event(agent_name, &workflow, ev).await
            }
            AgentEvent::BasicMessageReceived {
                connection_id,
                message_id,
            } => {
                debug!(agent = %agent_name, %connection_id, %message_id, "basic message received");
            }
        }
    }

    fn on_connection_event(&self, agent_name: &str, workflow: &AgentWorkflow, ev: &ConnectionEvent) {
        let Some(ref token) = ev.out_of_band_id else {
            return;
        };
        if !ev.state.is_completed() {
            return;
        }

        let candidates: Vec<Arc<ConnectionWatcher>> = workflow
            .watchers
            .lock()
            .iter()
            .filter(|w| &w.token == token && !w.matched.load(Ordering::Acquire))
            .cloned()
            .collect();

        for watcher in candidates {
            if watcher
                .matched
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                continue;
            }
            self.stats.connections_completed.fetch_add(1, Ordering::Relaxed);
            info!(
                agent = %agent_name,
                out_of_band_id = %token,
                connection_id = %ev.connection_id,
                "connection for invitation completed"
            );

            if let Some(callback) = watcher.on_complete.lock().take() {
                if std::panic::catch_unwind(AssertUnwindSafe(|| callback(ev))).is_err() {
                    self.stats.listener_failures.fetch_add(1, Ordering::Relaxed);
                    error!(agent = %agent_name, out_of_band_id = %token, "completion callback panicked");
                }
            }

            self.install_credential_watcher(agent_name, workflow);
        }
    }

    fn install_credential_watcher(&self, agent_name: &str, workflow: &AgentWorkflow) {
        let mode = self.config.read().workflow.credential_watch;
        match mode {
            CredentialWatchMode::PerAgent => {
                if workflow
                    .credential_watchers
                    .compare_exchange(0, 1, Ordering::AcqRel, Ordering::Acquire)
                    .is_ok()
                {
                    info!(agent = %agent_name, "credential watcher installed");
                }
            }
            CredentialWatchMode::PerCompletion => {
                let n = workflow.credential_watchers.fetch_add(1, Ordering::AcqRel) + 1;
                info!(agent = %agent_name, watchers = n, "credential watcher installed");
            }
        }
    }

    async fn on_credential_event(&self, agent_name: &str, workflow: &AgentWorkflow, ev: &CredentialEvent) {
        let watchers = workflow.credential_watchers.load(Ordering::Acquire);
        for _ in 0..watchers {
            let reaction = AssertUnwindSafe(self.react_to_credential(agent_name, workflow, ev));
            if reaction.catch_unwind().await.is_err() {
                self.stats.listener_failures.fetch_add(1, Ordering::Relaxed);
                error!(agent = %agent_name, credential_id = %ev.credential_id, "credential watcher panicked");
            }
        }
    }

    async fn react_to_credential(&self, agent_name: &str, workflow: &AgentWorkflow, ev: &CredentialEvent) {
        let id = &ev.credential_id;
        info!(agent = %agent_name, credential_id = %id, state = %ev.state, "credential state changed");
        match ev.state {
            CredentialState::OfferSent => {
                info!(agent = %agent_name, credential_id = %id, "credential offer sent to holder");
            }
            CredentialState::RequestReceived => {
                info!(agent = %agent_name, credential_id = %id, "credential request received from holder");
                let auto_accept = self.config.read().workflow.auto_accept_credentials;
                if !auto_accept {
                    info!(agent = %agent_name, credential_id = %id, "auto-accept disabled, leaving request pending");
                    return;
                }
                match workflow.agent.accept_credential_request(id).await {
                    Ok(()) => {
                        self.stats
                            .credential_requests_accepted
                            .fetch_add(1, Ordering::Relaxed);
                    }
                    Err(e) => {
                        self.stats.accept_failures.fetch_add(1, Ordering::Relaxed);
                        error!(agent = %agent_name, credential_id = %id, error = %e, "failed to accept credential request");
                    }
                }
            }
            CredentialState::CredentialIssued => {
                info!(agent = %agent_name, credential_id = %id, "credential issued to holder");
            }
            CredentialState::Done => {
                info!(agent = %agent_name, credential_id = %id, "credential accepted by the wallet");
            }
            CredentialState::Declined => {
                info!(agent = %agent_name, credential_id = %id, "credential rejected by the wallet");
            }
            other => {
                info!(agent = %agent_name, credential_id = %id, state = %other, "unhandled credential state");
            }
        }
    }

    /// Drop matched connection watchers. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let mut removed = 0;
        for entry in self.agents.iter() {
            let mut watchers = entry.value().watchers.lock();
            let before = watchers.len();
            watchers.retain(|w| !w.matched.load(Ordering::Acquire));
            removed += before - watchers.len();
        }
        if removed > 0 {
            self.stats
                .watchers_swept
                .fetch_add(removed as u64, Ordering::Relaxed);
            debug!(removed, "swept matched connection watchers");
        }
        removed
    }

    /// Run [`sweep`](Self::sweep) every `interval` until the task is aborted.
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let correlator = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                correlator.sweep();
            }
        })
    }

    /// Stop every agent's event pump. Watchers stay installed, so a later
    /// [`attach`](Self::attach) resumes routing.
    pub fn shutdown(&self) {
        let mut stopped = 0;
        for entry in self.agents.iter() {
            if let Some(pump) = entry.value().pump.lock().take() {
                pump.abort();
                stopped += 1;
            }
        }
        info!(stopped, "workflow event pumps stopped");
    }

    /// Connection watchers still waiting (or matched but not yet swept).
    pub fn watcher_count(&self, agent_name: &str) -> usize {
        self.agents
            .get(agent_name)
            .map(|w| w.watchers.lock().len())
            .unwrap_or(0)
    }

    /// Connection watchers on `agent_name` that have not matched yet.
    pub fn pending_watchers(&self, agent_name: &str) -> usize {
        self.agents
            .get(agent_name)
            .map(|w| {
                w.watchers
                    .lock()
                    .iter()
                    .filter(|w| !w.matched.load(Ordering::Acquire))
                    .count()
            })
            .unwrap_or(0)
    }

    pub fn credential_watchers(&self, agent_name: &str) -> usize {
        self.agents
            .get(agent_name)
            .map(|w| w.credential_watchers.load(Ordering::Acquire))
            .unwrap_or(0)
    }

    pub fn is_attached(&self, agent_name: &str) -> bool {
        self.agents
            .get(agent_name)
            .is_some_and(|w| w.pump.lock().is_some())
    }
}
