use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use std::path::PathBuf;

use digicred_config::{ConfigLoader, DigiCredConfig, WarningSeverity};
use digicred_core::DigiCredError;
use digicred_query::DEFAULT_LIMIT;

pub mod cursor;
mod setup;
mod start;

pub use setup::STARTER_CONFIG;

/// 🪪 DigiCred: REST gateway for decentralized-identity agents
#[derive(Parser)]
#[command(name = "digicred", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to digicred.toml config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level override (e.g. debug, info, warn, error)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress all log output (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the configured agents and serve the REST API
    Start {
        /// Listen address, overriding server.listen
        #[arg(long)]
        listen: Option<String>,
    },
    /// Show current configuration
    Config {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Audit configuration for problems
    Doctor,
    /// Initialize a new digicred.toml in the current or home directory
    Init {
        /// Create in current directory instead of ~/.digicred/
        #[arg(long)]
        local: bool,
    },
    /// Print a QR code for some data in the terminal
    Qr {
        /// Data to encode, typically an invitation URL
        data: String,
    },
    /// Inspect or mint connection-listing cursors
    Cursor {
        #[command(subcommand)]
        action: CursorAction,
    },
    /// Show version and build info
    Version,
    /// Generate shell completions for bash, zsh, or fish
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum CursorAction {
    /// Show the query a cursor token carries
    Decode {
        /// Token from a `next` or `previous` field
        token: String,
    },
    /// Mint a token for a listing anchored on a record id
    Encode {
        /// Page size
        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: usize,
        /// Page forward from this record id
        #[arg(long, conflicts_with = "before")]
        after: Option<String>,
        /// Page backward from this record id
        #[arg(long)]
        before: Option<String>,
        /// Attribute filter as key=value (repeatable)
        #[arg(short, long, value_parser = parse_key_val)]
        filter: Vec<(String, String)>,
        /// Metadata filter as key=value
        #[arg(short, long, value_parser = parse_key_val)]
        metadata: Option<(String, String)>,
        /// Sort attribute, optionally suffixed with `:asc` or `:desc`
        #[arg(short, long)]
        sort: Option<String>,
    },
}

/// Parse "key=value" CLI arguments.
fn parse_key_val(s: &str) -> std::result::Result<(String, String), String> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid KEY=VALUE: no `=` found in `{s}`"))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

impl Cli {
    pub async fn run(self) -> digicred_core::Result<()> {
        // Load config first so we can use it for log format
        let config_loader = ConfigLoader::load(self.config.as_deref())?;
        let config = config_loader.get();

        // --verbose > --quiet > --log-level > config
        let log_level = if self.verbose {
            "debug".to_string()
        } else if self.quiet {
            "error".to_string()
        } else {
            self.log_level
                .clone()
                .unwrap_or_else(|| config.logging.level.clone())
        };
        init_logging(&log_level, &config.logging.format);

        match self.command {
            Commands::Start { listen } => start::cmd_start(config_loader, listen).await,
            Commands::Config { json } => Self::cmd_config(config, json),
            Commands::Doctor => Self::cmd_doctor(config),
            Commands::Init { local } => setup::cmd_init(local),
            Commands::Qr { data } => Self::cmd_qr(&data),
            Commands::Cursor { action } => Self::cmd_cursor(action),
            Commands::Version => Self::cmd_version(),
            Commands::Completions { shell } => Self::cmd_completions(shell),
        }
    }

    fn cmd_config(config: DigiCredConfig, json: bool) -> digicred_core::Result<()> {
        if json {
            println!("{}", serde_json::to_string_pretty(&config)?);
        } else {
            println!(
                "{}",
                toml::to_string_pretty(&config).map_err(|e| DigiCredError::Config(e.to_string()))?
            );
        }
        Ok(())
    }

    fn cmd_doctor(config: DigiCredConfig) -> digicred_core::Result<()> {
        println!("🩺 DigiCred Doctor: Configuration Audit");
        println!();

        let warnings = match config.validate() {
            Ok(w) => w,
            Err(e) => {
                println!("{e}");
                return Ok(());
            }
        };

        let mut warn_count = 0;
        let mut info_count = 0;
        for w in &warnings {
            println!("  {w}");
            match w.severity {
                WarningSeverity::Warning => warn_count += 1,
                WarningSeverity::Info => info_count += 1,
                WarningSeverity::Error => {}
            }
        }

        if config.agents.is_empty() {
            println!("  💡 agents: no agents configured, create them with POST /api/v1/agents");
            info_count += 1;
        }

        println!();
        println!("  ⚠️  {warn_count} warnings, 💡 {info_count} suggestions");
        Ok(())
    }

    fn cmd_qr(data: &str) -> digicred_core::Result<()> {
        print!("{}", digicred_runtime::qr::render_terminal(data)?);
        Ok(())
    }

    fn cmd_cursor(action: CursorAction) -> digicred_core::Result<()> {
        match action {
            CursorAction::Decode { token } => {
                println!("{}", cursor::describe(&token)?);
            }
            CursorAction::Encode {
                limit,
                after,
                before,
                filter,
                metadata,
                sort,
            } => {
                let query = cursor::build_query(
                    limit,
                    after.as_deref(),
                    before.as_deref(),
                    &filter,
                    metadata,
                    sort.as_deref(),
                )?;
                println!("{}", cursor::encode(&query)?);
            }
        }
        Ok(())
    }

    fn cmd_version() -> digicred_core::Result<()> {
        println!("🪪 DigiCred v{}", env!("CARGO_PKG_VERSION"));
        println!("   Rust edition: 2024");
        println!("   Target: {}", std::env::consts::ARCH);
        println!("   OS: {}", std::env::consts::OS);
        #[cfg(debug_assertions)]
        println!("   Profile: debug");
        #[cfg(not(debug_assertions))]
        println!("   Profile: release");
        Ok(())
    }

    fn cmd_completions(shell: Shell) -> digicred_core::Result<()> {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "digicred", &mut std::io::stdout());
        Ok(())
    }
}

/// Install the global subscriber. `RUST_LOG` wins over `level`.
fn init_logging(level: &str, format: &str) {
    let filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level))
    };
    match format {
        "json" => tracing_subscriber::fmt()
            .with_env_filter(filter())
            .json()
            .with_target(true)
            .init(),
        "compact" => tracing_subscriber::fmt()
            .with_env_filter(filter())
            .compact()
            .with_target(false)
            .init(),
        _ => tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_target(false)
            .init(),
    }
}
