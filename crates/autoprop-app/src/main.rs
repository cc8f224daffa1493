//! autoprop binary - composition root.
//!
//! 1. Parse CLI arguments and load configuration from TOML
//! 2. Initialize tracing
//! 3. Build the simulated node (deploy pool, producer, proposer)
//! 4. Start the auto-proposer under the shared propose lock
//! 5. Stop everything on Ctrl-C and report final metrics

mod cli;
mod node;

use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;

use autoprop_core::AutopropConfig;
use autoprop_scheduler::{AutoProposer, DeployPool, ProposeLock, SchedulerConfig};

use cli::CliArgs;
use node::{spawn_deploy_producer, PoolProposer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config. Loaded before tracing so the file can set the log level; the
    // outcome is logged once tracing is up.
    let config_file = args.resolve_config_path();
    let (mut config, load_error) = match AutopropConfig::load(&config_file) {
        Ok(config) => (config, None),
        Err(e) => (AutopropConfig::default(), Some(e)),
    };
    args.apply_overrides(&mut config);

    // Tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .init();

    tracing::info!("Starting autoprop v{}", env!("CARGO_PKG_VERSION"));
    match load_error {
        None => tracing::info!(path = %config_file.display(), "Configuration loaded"),
        Some(e) => tracing::warn!(
            path = %config_file.display(),
            error = %e,
            "Failed to load config, using defaults"
        ),
    }

    if args.write_config {
        config.save(&config_file)?;
        return Ok(());
    }

    // Simulated node.
    let pool = Arc::new(DeployPool::new());
    let lock = ProposeLock::new();
    let proposer = Arc::new(PoolProposer::new(Arc::clone(&pool), &config.simulation));

    let shutdown = CancellationToken::new();
    let producer = spawn_deploy_producer(
        Arc::clone(&pool),
        config.simulation.deploy_interval(),
        shutdown.child_token(),
    );

    // Auto-proposer.
    let mut handle = if config.auto_propose.enabled {
        let scheduler_config = SchedulerConfig::try_from(&config.auto_propose)?;
        let auto_proposer =
            AutoProposer::new(scheduler_config, pool.clone(), proposer.clone(), lock.clone());
        Some(auto_proposer.start())
    } else {
        tracing::info!("Auto-propose disabled in config");
        None
    };

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown requested");

    shutdown.cancel();
    if let Err(e) = producer.await {
        tracing::warn!(error = %e, "Deploy producer did not exit cleanly");
    }

    if let Some(handle) = handle.as_mut() {
        if let Err(e) = handle.stop().await {
            tracing::error!(error = %e, "Auto-proposer exited with error");
        }
        let metrics = handle.auto_proposer().metrics().snapshot();
        tracing::info!(metrics = %serde_json::to_string(&metrics)?, "Final auto-proposer metrics");
    }

    tracing::info!(pending = pool.len(), "autoprop stopped");
    Ok(())
}
