//! # DFS Node
//!
//! Loads a node configuration, builds the node (host + DHT), starts it and
//! logs the DHT routing table on a fixed interval until Ctrl+C.
//!
//! A generated key is logged at startup; put it into `libp2p.key` to keep
//! the same peer id across restarts.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use dfs_network::{observe_routing_table, NetworkConfig, Node, TracingObserver};

/// Run a DFS network node
#[derive(Parser, Debug)]
#[command(name = "dfs-node")]
#[command(about = "Bootstrap a DFS network node and watch its DHT routing table")]
struct Args {
    /// Node configuration file (TOML, `[libp2p]` section)
    #[arg(short, long)]
    config: PathBuf,

    /// Routing table poll interval in seconds
    #[arg(short, long, default_value = "1")]
    monitor_interval_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let config = NetworkConfig::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;

    let node = Node::new(&config).await.context("creating node")?;
    node.start();

    let monitor = observe_routing_table(
        &node,
        Duration::from_secs(args.monitor_interval_secs),
        TracingObserver,
    )
    .context("starting routing table monitor")?;

    info!(peer_id = %node.peer_id(), "Node is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    let ticks = monitor.stop().await;
    info!(peer_id = %node.peer_id(), ticks, "Node stopped");

    Ok(())
}
