use serde::{Deserialize, Serialize};

use std::sync::Arc;
use tokio::sync::broadcast;

use crate::state::{CredentialState, DidExchangeState};

/// A connection record changed state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionEvent {
    pub connection_id: String,
    /// Correlation token of the invitation the connection originated from.
    pub out_of_band_id: Option<String>,
    pub state: DidExchangeState,
    #[serde(default)]
    pub previous_state: Option<DidExchangeState>,
}

/// A credential exchange record changed state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialEvent {
    pub credential_id: String,
    pub state: CredentialState,
    #[serde(default)]
    pub previous_state: Option<CredentialState>,
}

/// Events emitted by a single agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AgentEvent {
    ConnectionStateChanged(ConnectionEvent),
    CredentialStateChanged(CredentialEvent),
    BasicMessageReceived {
        connection_id: String,
        message_id: String,
    },
}

impl AgentEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConnectionStateChanged(_) => "connection_state_changed",
            Self::CredentialStateChanged(_) => "credential_state_changed",
            Self::BasicMessageReceived { .. } => "basic_message_received",
        }
    }
}

/// A broadcast-based event bus; one per agent.
#[derive(Clone)]
pub struct EventBus {
    sender: Arc<broadcast::Sender<AgentEvent>>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn publish(&self, event: AgentEvent) {
        // Ignore send errors (no subscribers).
        if self.sender.send(event).is_err() {
            tracing::trace!("agent event dropped, no subscribers");
        }
    }

    /// Receive every event published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<AgentEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}
