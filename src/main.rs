//! lircd - line-protocol multi-user chat daemon.

use lircd::config::Config;
use lircd::network::{Gateway, Supervisor};
use lircd::state::Matrix;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = Config::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    info!(
        server = %config.server.name,
        network = %config.server.network,
        password = config.server.password.is_some(),
        opers = config.oper.len(),
        "Starting lircd"
    );

    let listen = config.listen.address;
    let matrix = Arc::new(Matrix::new(config));

    Supervisor::new(Arc::clone(&matrix)).spawn();
    info!("Supervisor started");

    let gateway = Gateway::bind(listen, matrix).await?;

    tokio::select! {
        result = gateway.run() => result?,
        _ = tokio::signal::ctrl_c() => info!("Shutdown requested"),
    }

    Ok(())
}
