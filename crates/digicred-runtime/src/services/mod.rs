//! The service layer the REST surface calls into.

pub mod agents;
pub mod connections;
pub mod ledger;
pub mod messages;

pub use agents::{AgentService, AgentSummary, NewInvitation};
pub use connections::ConnectionService;
pub use ledger::{CREDENTIAL_DEFINITION_TAG, LedgerService};
pub use messages::MessageService;

use digicred_config::DigiCredConfig;
use digicred_core::{AgentRuntime, Result};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::info;

use crate::correlator::WorkflowCorrelator;
use crate::registry::AgentRegistry;

/// Everything the gateway needs, wired to one runtime and one config.
pub struct Services {
    pub registry: Arc<AgentRegistry>,
    pub correlator: Arc<WorkflowCorrelator>,
    pub agents: AgentService,
    pub connections: ConnectionService,
    pub messages: MessageService,
    pub ledger: LedgerService,
    config: Arc<RwLock<DigiCredConfig>>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl Services {
    pub fn new(runtime: Arc<dyn AgentRuntime>, config: Arc<RwLock<DigiCredConfig>>) -> Self {
        let registry = Arc::new(AgentRegistry::new(runtime));
        let correlator = Arc::new(WorkflowCorrelator::with_shared_config(Arc::clone(&config)));
        Self {
            agents: AgentService::new(
                Arc::clone(&registry),
                Arc::clone(&correlator),
                Arc::clone(&config),
            ),
            connections: ConnectionService::new(Arc::clone(&registry)),
            messages: MessageService::new(Arc::clone(&registry)),
            ledger: LedgerService::new(Arc::clone(&registry)),
            registry,
            correlator,
            config,
            sweeper: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &Arc<RwLock<DigiCredConfig>> {
        &self.config
    }

    /// Create the configured agents and start the watcher sweep.
    pub async fn bootstrap(&self) -> Result<Vec<String>> {
        let (specs, sweep_secs) = {
            let config = self.config.read();
            let specs: Vec<_> = config
                .agents
                .iter()
                .map(|agent| agent.to_spec(&config.ledger.networks))
                .collect();
            (specs, config.workflow.sweep_interval_secs)
        };

        let mut created = Vec::with_capacity(specs.len());
        for spec in &specs {
            created.push(self.agents.create_from_spec(spec).await?.name);
        }

        if sweep_secs > 0 {
            let handle = self
                .correlator
                .spawn_sweeper(Duration::from_secs(sweep_secs));
            if let Some(old) = self.sweeper.lock().replace(handle) {
                old.abort();
            }
        }

        info!(runtime = %self.registry.runtime_name(), agents = created.len(), "services ready");
        Ok(created)
    }

    /// Stop the watcher sweep and every agent's event pump.
    pub fn shutdown(&self) {
        if let Some(handle) = self.sweeper.lock().take() {
            handle.abort();
        }
        self.correlator.shutdown();
    }
}
