use anyhow::{anyhow, Result};
use clap::Args;
use netinv::database::ensure_data_dir;
use netinv::server::{start_server, ApiState, ServerConfig};
use netinv::{EntityCodec, InventoryDatabase, NetinvConfig};
use std::sync::Arc;
use tracing::info;

/// Arguments for the Serve command
#[derive(Args)]
pub struct ServeArgs {
    /// Address to bind to, overrides the configured address
    #[clap(short, long)]
    pub address: Option<String>,

    /// Port to listen on, overrides the configured port
    #[clap(short, long)]
    pub port: Option<u16>,

    /// Drop all stored inventory and recreate the database before serving
    #[clap(long)]
    pub reset_database: bool,
}

pub fn run(config: &NetinvConfig, args: ServeArgs) -> Result<()> {
    let ServeArgs {
        address,
        port,
        reset_database,
    } = args;

    let mut server_config = ServerConfig::from(config);
    if let Some(address) = address {
        server_config = server_config.with_address(address);
    }
    if let Some(port) = port {
        server_config = server_config.with_port(port);
    }

    // fail before touching the database if secrets could not be handled
    let cipher = config.secret_cipher()?;
    let codec = EntityCodec::new(Arc::new(cipher));

    ensure_data_dir(&config.data_dir)?;
    let sqlite_path = config.sqlite_path();
    let db = InventoryDatabase::open_with_reset(&sqlite_path, reset_database)?;
    info!("inventory database at {}", sqlite_path);

    let state = ApiState::new(db, codec);

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| anyhow!("Failed to start async runtime: {}", e))?;
    runtime.block_on(start_server(state, server_config))
}
