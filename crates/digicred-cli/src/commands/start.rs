use std::sync::Arc;

use digicred_config::ConfigLoader;
use digicred_runtime::{MemoryRuntime, Services};

pub(super) async fn cmd_start(
    config_loader: ConfigLoader,
    listen: Option<String>,
) -> digicred_core::Result<()> {
    if let Some(listen) = listen {
        config_loader.shared().write().server.listen = listen;
    }
    let config = config_loader.get();

    println!("🪪 DigiCred v{}", env!("CARGO_PKG_VERSION"));
    println!("   Listen: {}", config.server.listen);
    println!(
        "   Auth: {}",
        if config.server.api_key.is_some() {
            "API key"
        } else {
            "none"
        }
    );
    println!("   Credential watch: {:?}", config.workflow.credential_watch);
    println!();

    // Kept alive for the lifetime of the server
    let _watcher = match config_loader.watch() {
        Ok(w) => {
            println!("   Config hot-reload: enabled");
            Some(w)
        }
        Err(e) => {
            tracing::warn!(error = %e, "config hot-reload disabled");
            None
        }
    };

    let runtime = Arc::new(MemoryRuntime::new());
    let services = Arc::new(Services::new(runtime, config_loader.shared()));
    for name in services.bootstrap().await? {
        println!("   Agent: {name}");
    }
    println!();

    digicred_server::start_server(services).await
}
