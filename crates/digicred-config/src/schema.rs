use digicred_core::{AgentSpec, LedgerNetwork};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Root configuration, maps to `digicred.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DigiCredConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub pagination: PaginationConfig,
    pub workflow: WorkflowConfig,
    pub qrcode: QrCodeConfig,
    pub ledger: LedgerConfig,
    /// Agents brought up when the server starts.
    pub agents: Vec<AgentConfig>,
}

// ── Server ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// HTTP listen address.
    pub listen: String,
    /// Optional bearer key for `/api/v1`.
    pub api_key: Option<String>,
    /// Allow any origin.
    pub cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:3000".into(),
            api_key: None,
            cors: true,
        }
    }
}

// ── Logging ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
    /// Output format: "pretty", "json", "compact".
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "pretty".into(),
        }
    }
}

// ── Pagination ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// Page size when the request has no `limit`.
    pub default_limit: usize,
    /// Requests asking for more are clamped to this.
    pub max_limit: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: 50,
            max_limit: 500,
        }
    }
}

impl PaginationConfig {
    /// The page size to use for a request that asked for `requested`.
    pub fn effective_limit(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.default_limit).min(self.max_limit)
    }
}

// ── Workflow ───────────────────────────────────────────────────

/// How credential watchers are installed after a connection completes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialWatchMode {
    /// One credential watcher per agent, installed on its first completion.
    #[default]
    PerAgent,
    /// One more credential watcher per completed invitation.
    PerCompletion,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub credential_watch: CredentialWatchMode,
    /// Accept credential requests from holders automatically.
    pub auto_accept_credentials: bool,
    /// How often matched connection watchers are pruned.
    pub sweep_interval_secs: u64,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            credential_watch: CredentialWatchMode::PerAgent,
            auto_accept_credentials: true,
            sweep_interval_secs: 300,
        }
    }
}

// ── QR code ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QrCodeConfig {
    /// Minimum rendered edge length in pixels.
    pub min_dimension: u32,
}

impl Default for QrCodeConfig {
    fn default() -> Self {
        Self { min_dimension: 200 }
    }
}

// ── Ledger ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub networks: Vec<LedgerNetwork>,
}

// ── Agents ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    pub name: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    pub port: u16,
}

fn default_endpoint() -> String {
    "http://localhost".into()
}

impl AgentConfig {
    /// [`AgentSpec`] handed to the runtime, carrying the configured ledgers.
    pub fn to_spec(&self, ledgers: &[LedgerNetwork]) -> AgentSpec {
        AgentSpec::new(&self.name, &self.endpoint, self.port).with_ledgers(ledgers.to_vec())
    }
}

// ── Validation ─────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub field: String,
    pub message: String,
    pub severity: WarningSeverity,
    pub hint: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningSeverity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let icon = match self.severity {
            WarningSeverity::Error => "❌",
            WarningSeverity::Warning => "⚠️ ",
            WarningSeverity::Info => "💡",
        };
        write!(f, "{} {}: {}", icon, self.field, self.message)?;
        if let Some(ref h) = self.hint {
            write!(f, "\n   ↳ {}", h)?;
        }
        Ok(())
    }
}

impl DigiCredConfig {
    /// Validate the config and return a list of warnings/errors.
    /// Returns `Err` with all messages joined if any severity is Error.
    pub fn validate(&self) -> Result<Vec<ConfigWarning>, String> {
        let mut warnings = Vec::new();

        // ── Server ───
        if self.server.listen.trim().is_empty() {
            warnings.push(ConfigWarning {
                field: "server.listen".into(),
                message: "listen address is empty".into(),
                severity: WarningSeverity::Error,
                hint: Some("Set to e.g. '0.0.0.0:3000'".into()),
            });
        }
        if self.server.api_key.is_none() && !self.server.listen.starts_with("127.0.0.1") {
            warnings.push(ConfigWarning {
                field: "server.api_key".into(),
                message: format!(
                    "API is reachable on {} without an api_key",
                    self.server.listen
                ),
                severity: WarningSeverity::Info,
                hint: Some("Set server.api_key or DIGICRED_API_KEY".into()),
            });
        }

        // ── Pagination ───
        if self.pagination.default_limit == 0 {
            warnings.push(ConfigWarning {
                field: "pagination.default_limit".into(),
                message: "default_limit is 0, every page would be empty".into(),
                severity: WarningSeverity::Error,
                hint: Some("Set to e.g. 50".into()),
            });
        }
        if self.pagination.default_limit > self.pagination.max_limit {
            warnings.push(ConfigWarning {
                field: "pagination.default_limit".into(),
                message: format!(
                    "default_limit {} exceeds max_limit {}",
                    self.pagination.default_limit, self.pagination.max_limit
                ),
                severity: WarningSeverity::Error,
                hint: None,
            });
        }

        // ── Workflow ───
        if self.workflow.sweep_interval_secs == 0 {
            warnings.push(ConfigWarning {
                field: "workflow.sweep_interval_secs".into(),
                message: "sweep disabled, matched watchers are never pruned".into(),
                severity: WarningSeverity::Warning,
                hint: Some("Set to e.g. 300".into()),
            });
        }
        if !self.workflow.auto_accept_credentials {
            warnings.push(ConfigWarning {
                field: "workflow.auto_accept_credentials".into(),
                message: "credential requests will be logged but not accepted".into(),
                severity: WarningSeverity::Info,
                hint: None,
            });
        }

        // ── Logging format ───
        let valid_formats = ["pretty", "json", "compact"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            warnings.push(ConfigWarning {
                field: "logging.format".into(),
                message: format!("unknown log format '{}'", self.logging.format),
                severity: WarningSeverity::Warning,
                hint: Some(format!("Valid values: {}", valid_formats.join(", "))),
            });
        }

        // ── Logging level ───
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            warnings.push(ConfigWarning {
                field: "logging.level".into(),
                message: format!("unknown log level '{}'", self.logging.level),
                severity: WarningSeverity::Warning,
                hint: Some(format!("Valid values: {}", valid_levels.join(", "))),
            });
        }

        // ── Ledger networks ───
        for (i, net) in self.ledger.networks.iter().enumerate() {
            if net.indy_namespace.is_empty() {
                warnings.push(ConfigWarning {
                    field: format!("ledger.networks[{}].indy_namespace", i),
                    message: "namespace is empty".into(),
                    severity: WarningSeverity::Error,
                    hint: Some("e.g. 'bcovrin:test'".into()),
                });
            }
            if net.genesis_transactions.trim().is_empty() {
                warnings.push(ConfigWarning {
                    field: format!("ledger.networks[{}].genesis_transactions", i),
                    message: "no genesis transactions, the pool cannot be reached".into(),
                    severity: WarningSeverity::Warning,
                    hint: None,
                });
            }
        }

        // ── Agents ───
        let mut seen = HashSet::new();
        for agent in &self.agents {
            if agent.name.is_empty() {
                warnings.push(ConfigWarning {
                    field: "agents.name".into(),
                    message: "agent name is empty".into(),
                    severity: WarningSeverity::Error,
                    hint: None,
                });
            } else if !seen.insert(agent.name.as_str()) {
                warnings.push(ConfigWarning {
                    field: format!("agents.{}", agent.name),
                    message: format!("duplicate agent name '{}'", agent.name),
                    severity: WarningSeverity::Error,
                    hint: Some("Agent names must be unique".into()),
                });
            }
            if agent.port == 0 {
                warnings.push(ConfigWarning {
                    field: format!("agents.{}.port", agent.name),
                    message: "port is 0".into(),
                    severity: WarningSeverity::Error,
                    hint: Some("Pick a free inbound port, e.g. 3001".into()),
                });
            }
        }

        // Check for hard errors
        let errors: Vec<String> = warnings
            .iter()
            .filter(|w| w.severity == WarningSeverity::Error)
            .map(|w| format!("{}: {}", w.field, w.message))
            .collect();

        if !errors.is_empty() {
            return Err(format!("Configuration errors:\n  • {}", errors.join("\n  • ")));
        }

        Ok(warnings)
    }
}
