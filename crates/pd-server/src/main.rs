use std::sync::Arc;

use clap::Parser;
use pd_common::PdConfig;
use pd_kv::MemoryKvClient;
use pd_server::startup::{LogConfig, bootstrap, init_logger, kv_endpoints};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "pd-server", version, about = "PD metadata and RPC core")]
struct Cli {
    /// Configuration file (toml, yaml or json); `PD_*` variables override it
    #[arg(short = 'c', long = "config", env = "PD_CONFIG_FILE")]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = PdConfig::load(cli.config.as_deref())?;

    let _guard = init_logger(&LogConfig::from_config(&config))?;

    // Standalone mode: the store lives in this process and answers for the
    // configured endpoints.
    let kv = Arc::new(MemoryKvClient::with_members(kv_endpoints(&config)?));

    let core = bootstrap(&config, kv).await?;

    tokio::signal::ctrl_c().await?;
    info!(
        committed = core.metrics.count(pd_kv::metrics::OUTCOME_SUCCESS),
        failed = core.metrics.count(pd_kv::metrics::OUTCOME_FAILED),
        "Shutting down"
    );

    Ok(())
}
