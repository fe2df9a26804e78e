use std::path::PathBuf;

/// Starter `digicred.toml` written by `digicred init`.
pub const STARTER_CONFIG: &str = r#"# 🪪 DigiCred Configuration

[server]
listen = "127.0.0.1:3000"
# api_key = "your-secret-key"   # or env: DIGICRED_API_KEY
cors = true

[logging]
level = "info"
# format = "pretty"   # pretty | json | compact

[pagination]
default_limit = 50
max_limit = 500

[workflow]
# per_agent: one credential watcher per agent
# per_completion: one more watcher for every completed invitation
credential_watch = "per_agent"
auto_accept_credentials = true
sweep_interval_secs = 300

[qrcode]
min_dimension = 200

# [[ledger.networks]]
# indy_namespace = "bcovrin:test"
# is_production = false
# genesis_transactions = "..."
# connect_on_startup = true

[[agents]]
name = "issuer"
endpoint = "http://localhost"
port = 3001
"#;

/// Write a starter configuration unless one already exists.
pub(super) fn cmd_init(local: bool) -> digicred_core::Result<()> {
    let dir = if local {
        std::env::current_dir()?
    } else {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".digicred")
    };

    std::fs::create_dir_all(&dir)?;
    let config_path = dir.join("digicred.toml");

    if config_path.exists() {
        println!("⚠️  {} already exists", config_path.display());
        println!("   Run 'digicred doctor' to audit it.");
        return Ok(());
    }

    std::fs::write(&config_path, STARTER_CONFIG)?;
    println!("✅ Created {}", config_path.display());
    println!("   Edit it to configure your agents, then run: digicred start");

    Ok(())
}
