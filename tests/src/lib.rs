//! # DFS Network Test Suite
//!
//! Multi-node tests over real libp2p transports on loopback.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── bootstrap.rs   # config-driven DHT seeding, key reuse
//!     ├── sharding.rs    # anchor-wired node groups
//!     └── monitor.rs     # routing table observation
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p dfs-tests
//! RUST_LOG=dfs_network=debug cargo test -p dfs-tests -- --nocapture
//! ```

use std::future::Future;
use std::time::Duration;

use dfs_network::{Dht, Host, NetworkStack, Node, PeerId};
use tracing_subscriber::EnvFilter;

pub mod integration;

/// Install a test-friendly subscriber; repeated calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_test_writer()
        .try_init();
}

/// Poll `check` every 100ms until it returns true or `timeout` elapses.
pub async fn eventually<F, Fut>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if check().await {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

/// Whether `node`'s routing table currently holds `peer`.
pub async fn has_route<S: NetworkStack>(node: &Node<S>, peer: PeerId) -> bool {
    match node.dht().routing_table_peers().await {
        Ok(peers) => peers.contains(&peer),
        Err(_) => false,
    }
}

/// `/…/p2p/<id>` entries for every address `node` listens on.
pub async fn bootstrap_entries<S: NetworkStack>(node: &Node<S>) -> Vec<String> {
    let addrs = node.host().addrs().await.unwrap_or_default();
    addrs
        .into_iter()
        .map(|addr| format!("{addr}/p2p/{}", node.peer_id()))
        .collect()
}
