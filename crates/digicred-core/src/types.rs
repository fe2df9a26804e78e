use serde::{Deserialize, Serialize};

/// Human-assigned unique agent name.
pub type AgentName = String;

/// Out-of-band record id; joins an invitation to its later connection.
pub type CorrelationToken = String;

/// An Indy ledger pool the agent can read from and write to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerNetwork {
    /// e.g. "bcovrin:test".
    pub indy_namespace: String,
    #[serde(default)]
    pub is_production: bool,
    /// Genesis transactions, one JSON document per line.
    #[serde(default)]
    pub genesis_transactions: String,
    #[serde(default = "default_true")]
    pub connect_on_startup: bool,
}

fn default_true() -> bool {
    true
}

/// Everything the runtime needs to bring up a new agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSpec {
    pub name: AgentName,
    /// Public endpoint without port, e.g. "http://localhost".
    pub endpoint: String,
    /// Inbound transport port.
    pub port: u16,
    #[serde(default)]
    pub ledgers: Vec<LedgerNetwork>,
}

impl AgentSpec {
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            port,
            ledgers: vec![],
        }
    }

    pub fn with_ledgers(mut self, ledgers: Vec<LedgerNetwork>) -> Self {
        self.ledgers = ledgers;
        self
    }

    /// The agent's advertised endpoint, `endpoint:port`.
    pub fn public_endpoint(&self) -> String {
        format!("{}:{}", self.endpoint.trim_end_matches('/'), self.port)
    }
}
