use tracing::{info, warn};

use crate::domain::{resolve_bootstrap_peers, Libp2pConfig, NetworkError, NetworkResult};
use crate::ports::{DhtOptions, Host, NetworkStack};

/// Attach a DHT to `host`, seeded with the peers in `libp2p.dht.boostrap`.
///
/// # Errors
///
/// - `BootstrapAddress` / `BootstrapPeer` for a malformed entry
/// - `DhtBootstrap` when no peer resolved and peers are required
/// - `DhtCreate` when the stack cannot attach the DHT
pub async fn create_dht<S: NetworkStack>(
    stack: &S,
    config: &Libp2pConfig,
    host: &S::Host,
) -> NetworkResult<S::Dht> {
    let bootstrap_peers = resolve_bootstrap_peers(config)?;

    if bootstrap_peers.is_empty() {
        if config.dht.require_bootstrap_peers {
            return Err(NetworkError::DhtBootstrap);
        }
        warn!(peer_id = %host.id(), "no dht bootstrap peers, starting standalone");
    }

    for peer in bootstrap_peers.iter() {
        for addr in &peer.addrs {
            info!(peer = %peer.peer_id, %addr, "dht bootstrap peer");
        }
    }

    stack
        .build_dht(host, DhtOptions { bootstrap_peers })
        .await
        .map_err(|e| match e {
            NetworkError::DhtCreate { .. } => e,
            other => NetworkError::DhtCreate {
                reason: other.to_string(),
            },
        })
}
