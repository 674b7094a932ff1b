use clap::{Parser, Subcommand};
use std::{path::PathBuf, sync::Arc};
use tokio_util::sync::CancellationToken;
use tracing::info;
use validator_mev_api::{
    build_info::{mev_api_version, print_version_info},
    config::load_config_toml,
    metrics::set_version,
    rpc::start_rpc_server,
    telemetry::{init_tracing, spawn_metrics_server},
    validator::MevApi,
};

#[derive(Parser, Debug)]
#[command(version, about = "Validator side bid admission API")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the mev_* API
    Run {
        #[arg(long, env = "MEV_API_CONFIG")]
        config: PathBuf,
    },
    /// Print build information
    Version,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = Cli::parse();
    let config_path = match cli.command {
        Command::Run { config } => config,
        Command::Version => {
            print_version_info();
            return Ok(());
        }
    };

    let config = load_config_toml(&config_path)?;
    init_tracing(&config.logging)?;
    let version = mev_api_version();
    set_version(&version);
    info!(?version, config = ?config_path, "Starting validator mev api");

    let cancel = CancellationToken::new();
    let metrics_task = match config.metrics_addr {
        Some(addr) => Some(spawn_metrics_server(addr, cancel.clone())?.1),
        None => None,
    };

    let backend = Arc::new(config.create_local_backend());
    let api = MevApi::new(backend.clone());
    let admin = config.enable_admin_api.then_some(backend);
    let (_, rpc_handle) = start_rpc_server(&config.rpc_addr, api, admin).await?;

    tokio::signal::ctrl_c().await?;
    info!("Received ctrl-c, shutting down");
    cancel.cancel();
    rpc_handle.stop()?;
    rpc_handle.stopped().await;
    if let Some(task) = metrics_task {
        task.await?;
    }
    Ok(())
}
