//! Squad Ledger Server
//!
//! Loads configuration, restores the last snapshot (or builds genesis state)
//! and serves transaction submission over WebSocket.

use std::path::PathBuf;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use squad_ledger::{
    network::{AuthConfig, LedgerServer, LedgerService, ServerConfig},
    store, Ledger, LedgerConfig, VERSION,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Squad Ledger v{}", VERSION);

    let config = LedgerConfig::load(std::env::args().nth(1).map(PathBuf::from))
        .context("loading ledger config")?;
    info!(admin = %config.admin, squad_size = config.squad_size, "config loaded");

    let restored = match &config.snapshot_path {
        Some(path) => store::load_if_exists(path)
            .with_context(|| format!("restoring snapshot {}", path.display()))?,
        None => None,
    };
    let ledger = match restored {
        Some(ledger) => ledger,
        None => {
            info!("No snapshot, starting from genesis");
            Ledger::genesis(&config)
        }
    };
    if let Some(path) = &config.snapshot_path {
        // Drops superseded journal lines and writes genesis on first start
        store::save(path, &ledger)
            .with_context(|| format!("compacting snapshot {}", path.display()))?;
    }
    info!(
        sequence = ledger.sequence(),
        state_hash = %hex::encode(ledger.state_hash()),
        "ledger ready"
    );

    let auth = AuthConfig::from_env();
    if !auth.is_configured() {
        warn!("No AUTH_SECRET or AUTH_PUBLIC_KEY_PEM set; every submit will be rejected");
    }

    let server_config = ServerConfig::from_env()?;
    let service = LedgerService::new(ledger, auth, config.snapshot_path.clone());
    let server = LedgerServer::new(server_config, service);

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received");
            server.shutdown();
        }
    }

    Ok(())
}
