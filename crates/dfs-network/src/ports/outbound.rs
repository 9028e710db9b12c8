//! # Driven Ports (Outbound SPI)
//!
//! Interfaces the node core requires from a network stack.

use std::time::Duration;

use async_trait::async_trait;
use libp2p::{Multiaddr, PeerId};

use crate::domain::{
    BootstrapPeerSet, ListenAddressSet, NetworkResult, NodeIdentity, PeerAddr, RelayPolicy,
    TransportSet,
};

/// Everything a stack needs to build a host.
#[derive(Debug, Clone)]
pub struct HostOptions {
    pub identity: NodeIdentity,
    pub listen_addrs: ListenAddressSet,
    pub transports: TransportSet,
    pub relay: RelayPolicy,
    pub idle_connection_timeout: Duration,
}

/// Everything a stack needs to attach a DHT to a host.
#[derive(Debug, Clone, Default)]
pub struct DhtOptions {
    pub bootstrap_peers: BootstrapPeerSet,
}

/// A running network host: identity, listeners and connections.
///
/// Handles are cheap to clone and refer to the same host.
#[async_trait]
pub trait Host: Clone + Send + Sync + 'static {
    /// Peer id of this host.
    fn id(&self) -> PeerId;

    /// Addresses the host is currently listening on.
    async fn addrs(&self) -> NetworkResult<Vec<Multiaddr>>;

    /// Open a direct connection to `peer`, returning once it is established.
    ///
    /// Succeeds immediately when already connected.
    async fn connect(&self, peer: &PeerAddr) -> NetworkResult<()>;

    /// Whether a connection to `peer` is currently open.
    async fn is_connected(&self, peer: &PeerId) -> NetworkResult<bool>;
}

/// A DHT attached to a host.
#[async_trait]
pub trait Dht: Clone + Send + Sync + 'static {
    type Host: Host;
    type Weak: WeakDht<Dht = Self>;

    /// The host the DHT runs on.
    fn host(&self) -> &Self::Host;

    /// A handle that does not keep the host running.
    fn downgrade(&self) -> Self::Weak;

    /// Peers currently in the routing table.
    async fn routing_table_peers(&self) -> NetworkResult<Vec<PeerId>>;
}

/// Non-owning DHT handle.
///
/// Once every strong handle to the host is dropped the host shuts down and
/// `upgrade` returns `None`.
pub trait WeakDht: Clone + Send + Sync + 'static {
    type Dht: Dht;

    fn upgrade(&self) -> Option<Self::Dht>;
}

/// Builds hosts and attaches DHTs to them.
///
/// Construction is two-phase: `build_host` first, then `build_dht` on the
/// returned host. A stack attaches at most one DHT per host.
#[async_trait]
pub trait NetworkStack: Send + Sync {
    type Host: Host;
    type Dht: Dht<Host = Self::Host>;

    async fn build_host(&self, options: HostOptions) -> NetworkResult<Self::Host>;

    async fn build_dht(&self, host: &Self::Host, options: DhtOptions) -> NetworkResult<Self::Dht>;
}
