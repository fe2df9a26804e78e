//! Named agents, created at most once each.

use dashmap::DashMap;
use digicred_core::{AgentHandle, AgentRuntime, AgentSpec, DigiCredError, Result};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, warn};

type AgentCell = Arc<OnceCell<Arc<dyn AgentHandle>>>;

/// Maps agent names to running agents.
///
/// Creation is serialized per name through a `OnceCell`; concurrent callers
/// for the same name wait on the same initialisation, and lookups never block
/// on creation of other agents.
pub struct AgentRegistry {
    runtime: Arc<dyn AgentRuntime>,
    agents: DashMap<String, AgentCell>,
    /// Name of the most recently created agent.
    latest: RwLock<Option<String>>,
}

impl AgentRegistry {
    pub fn new(runtime: Arc<dyn AgentRuntime>) -> Self {
        Self {
            runtime,
            agents: DashMap::new(),
            latest: RwLock::new(None),
        }
    }

    pub fn runtime_name(&self) -> &str {
        self.runtime.name()
    }

    /// Return the agent named `spec.name`, creating it if needed.
    ///
    /// The flag is true only for the call that actually created the agent.
    /// A failed creation leaves the name free for a later attempt.
    pub async fn get_or_create(&self, spec: &AgentSpec) -> Result<(Arc<dyn AgentHandle>, bool)> {
        // Clone the cell out so no map guard is held across the await.
        let cell = self
            .agents
            .entry(spec.name.clone())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();

        let mut created = false;
        let agent = cell
            .get_or_try_init(|| {
                created = true;
                self.runtime.create_agent(spec)
            })
            .await
            .inspect_err(|e| warn!(agent = %spec.name, error = %e, "agent creation failed"))?
            .clone();

        if created {
            *self.latest.write() = Some(spec.name.clone());
            info!(agent = %spec.name, endpoint = %spec.public_endpoint(), "agent initialized");
        } else {
            info!(agent = %spec.name, "agent already initialized");
        }
        Ok((agent, created))
    }

    /// Look up an initialised agent. Absence is not an error.
    pub fn get_by_name(&self, name: &str) -> Option<Arc<dyn AgentHandle>> {
        self.agents
            .get(name)
            .and_then(|cell| cell.get().cloned())
    }

    /// The most recently created agent, if any.
    pub fn latest(&self) -> Option<Arc<dyn AgentHandle>> {
        let name = self.latest.read().clone()?;
        self.get_by_name(&name)
    }

    /// The named agent, or the latest one when no name is given.
    pub fn resolve(&self, name: Option<&str>) -> Result<Arc<dyn AgentHandle>> {
        match name {
            Some(name) => self
                .get_by_name(name)
                .ok_or_else(|| DigiCredError::AgentNotInitialized(name.to_string())),
            None => self
                .latest()
                .ok_or_else(|| DigiCredError::AgentNotInitialized("no agent created yet".into())),
        }
    }

    /// Names of all initialised agents, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .agents
            .iter()
            .filter(|entry| entry.value().initialized())
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.agents.iter().filter(|e| e.value().initialized()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
