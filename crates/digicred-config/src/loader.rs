use digicred_core::DigiCredError;
use notify::{Event as NotifyEvent, EventKind, RecursiveMode, Watcher};
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::schema::DigiCredConfig;

/// Loads and optionally hot-reloads the gateway configuration.
pub struct ConfigLoader {
    config: Arc<RwLock<DigiCredConfig>>,
    config_path: PathBuf,
}

impl ConfigLoader {
    /// Resolve the config path: explicit path > DIGICRED_CONFIG env > ~/.digicred/digicred.toml
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        if let Some(p) = explicit {
            return p.to_path_buf();
        }
        if let Ok(p) = std::env::var("DIGICRED_CONFIG") {
            return PathBuf::from(p);
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".digicred")
            .join("digicred.toml")
    }

    /// Load the config from disk, falling back to defaults.
    pub fn load(path: Option<&Path>) -> digicred_core::Result<Self> {
        let config_path = Self::resolve_path(path);
        let config = if config_path.exists() {
            info!(?config_path, "loading configuration");
            Self::read_file(&config_path)?
        } else {
            warn!(?config_path, "config file not found, using defaults");
            DigiCredConfig::default()
        };

        let config = Self::apply_env_overrides(config);

        // Validate config: log warnings, fail on errors
        match config.validate() {
            Ok(warnings) => {
                for w in &warnings {
                    warn!("{}", w);
                }
            }
            Err(e) => {
                return Err(DigiCredError::Config(e));
            }
        }

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            config_path,
        })
    }

    /// Get a read snapshot of the current config.
    pub fn get(&self) -> DigiCredConfig {
        self.config.read().clone()
    }

    /// Get a shared reference for subscription.
    pub fn shared(&self) -> Arc<RwLock<DigiCredConfig>> {
        Arc::clone(&self.config)
    }

    /// Path being watched.
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    fn read_file(path: &Path) -> digicred_core::Result<DigiCredConfig> {
        let raw = std::fs::read_to_string(path)?;
        toml::from_str::<DigiCredConfig>(&raw).map_err(|e| {
            DigiCredError::Config(format!("failed to parse {}: {}", path.display(), e))
        })
    }

    /// Apply env var overrides (DIGICRED_SERVER_LISTEN, DIGICRED_LOG_LEVEL, DIGICRED_API_KEY)
    fn apply_env_overrides(mut config: DigiCredConfig) -> DigiCredConfig {
        if let Ok(v) = std::env::var("DIGICRED_SERVER_LISTEN") {
            config.server.listen = v;
        }
        if let Ok(v) = std::env::var("DIGICRED_LOG_LEVEL") {
            config.logging.level = v;
        }
        // The file wins; env only fills a missing key.
        if config.server.api_key.is_none() {
            if let Ok(v) = std::env::var("DIGICRED_API_KEY") {
                config.server.api_key = Some(v);
            }
        }
        config
    }

    /// Reload the config from disk. An invalid file leaves the current config in place.
    pub fn reload(&self) -> digicred_core::Result<()> {
        if !self.config_path.exists() {
            return Err(DigiCredError::Config(format!(
                "config file not found: {}",
                self.config_path.display()
            )));
        }
        let new_config = Self::apply_env_overrides(Self::read_file(&self.config_path)?);
        new_config.validate().map_err(DigiCredError::Config)?;
        *self.config.write() = new_config;
        info!("configuration reloaded");
        Ok(())
    }

    /// Start a background file watcher that swaps in the new config when the file changes.
    /// The returned watcher must be kept alive for watching to continue.
    pub fn watch(&self) -> digicred_core::Result<notify::RecommendedWatcher> {
        let config = Arc::clone(&self.config);
        let config_path = self.config_path.clone();

        info!(?config_path, "starting config file watcher");

        let path_for_event = config_path.clone();
        let mut watcher =
            notify::recommended_watcher(move |res: Result<NotifyEvent, notify::Error>| match res {
                Ok(event) => {
                    if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                        return;
                    }
                    let is_our_file = event
                        .paths
                        .iter()
                        .any(|p| p.file_name() == path_for_event.file_name());
                    if !is_our_file {
                        return;
                    }

                    info!("config file changed, reloading");
                    match ConfigLoader::read_file(&path_for_event) {
                        Ok(new_config) => {
                            let new_config = ConfigLoader::apply_env_overrides(new_config);
                            if let Err(e) = new_config.validate() {
                                warn!(error = %e, "config file has errors, keeping current config");
                                return;
                            }
                            *config.write() = new_config;
                            info!("configuration hot-reloaded successfully");
                        }
                        Err(e) => {
                            warn!(error = %e, "config file has errors, keeping current config");
                        }
                    }
                }
                Err(e) => {
                    warn!(error = %e, "file watcher error");
                }
            })
            .map_err(|e| DigiCredError::Config(format!("failed to create file watcher: {}", e)))?;

        // Watch the parent directory (some editors create temp files + rename)
        let watch_path = self
            .config_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        watcher
            .watch(watch_path, RecursiveMode::NonRecursive)
            .map_err(|e| {
                DigiCredError::Config(format!("failed to watch config directory: {}", e))
            })?;

        Ok(watcher)
    }
}
