//! # DFS Network Node
//!
//! Bootstraps a peer-to-peer node for the DFS network: loads or generates the
//! node key, mounts QUIC (and optionally TCP) transports, joins the Kademlia
//! DHT through configured seed peers and supervises the routing table.
//!
//! ## Architecture
//!
//! - **Domain Layer:** configuration, identity, address and transport values
//! - **Ports Layer:** `NetworkStack` / `Host` / `Dht` traits
//! - **Service Layer:** `Node`, `create_dht`, routing table monitor
//! - **Adapters Layer:** libp2p stack, in-memory stack, TOML loading
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use dfs_network::{observe_routing_table, NetworkConfig, Node, TracingObserver};
//!
//! # async fn run() -> Result<(), dfs_network::NetworkError> {
//! let config = NetworkConfig::load("node.toml")?;
//! let node = Node::new(&config).await?;
//! node.start();
//!
//! let monitor = observe_routing_table(&node, Duration::from_secs(1), TracingObserver)?;
//! // ...
//! monitor.stop().await;
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

// =============================================================================
// RE-EXPORTS
// =============================================================================

pub use adapters::{
    Libp2pDht, Libp2pHost, Libp2pStack, MemoryDht, MemoryHost, MemoryStack, WeakLibp2pDht,
    WeakMemoryDht,
};
pub use domain::{
    resolve_bootstrap_peers, resolve_identity, resolve_listen_addresses, BootstrapPeerSet,
    DhtConfig, IdentityOrigin, Libp2pConfig, ListenAddressSet, NetworkConfig, NetworkError,
    NetworkResult, NodeIdentity, PeerAddr, RelayPolicy, TransportConfig, TransportKind,
    TransportSet, DEFAULT_LISTEN_PORT,
};
pub use ports::{Dht, DhtOptions, Host, HostOptions, NetworkStack, WeakDht};
pub use service::{
    create_dht, observe_routing_table, Node, RoutingObserver, RoutingSnapshot,
    RoutingTableMonitor, TracingObserver,
};

// Re-exported so downstream crates name the same types.
pub use libp2p::{Multiaddr, PeerId};
