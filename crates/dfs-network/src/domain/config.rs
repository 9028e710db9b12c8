//! Node configuration
//!
//! Mirrors the `libp2p.*` key paths of the node configuration file:
//!
//! ```toml
//! [libp2p]
//! key = "CAESQ..."
//! listen = ["/ip4/0.0.0.0/udp/1902/quic-v1"]
//! relay = "disabled"
//!
//! [libp2p.transports]
//! tcp = true
//!
//! [libp2p.dht]
//! boostrap = ["/ip4/10.0.0.1/udp/1902/quic-v1/p2p/12D3KooW..."]
//! require_bootstrap_peers = true
//! ```

use serde::{Deserialize, Serialize};

/// Default swarm idle connection timeout.
pub const DEFAULT_IDLE_CONNECTION_TIMEOUT_SECS: u64 = 600;

/// Root of the node configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default)]
    pub libp2p: Libp2pConfig,
}

/// `libp2p.*` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Libp2pConfig {
    /// Encoded node key; empty means "generate one"
    #[serde(default)]
    pub key: String,
    /// Listen multi-addresses; empty means loopback defaults
    #[serde(default)]
    pub listen: Vec<String>,
    #[serde(default)]
    pub relay: RelayPolicy,
    #[serde(default)]
    pub transports: TransportConfig,
    #[serde(default)]
    pub dht: DhtConfig,
    #[serde(default = "default_idle_connection_timeout_secs")]
    pub idle_connection_timeout_secs: u64,
}

impl Default for Libp2pConfig {
    fn default() -> Self {
        Self {
            key: String::new(),
            listen: Vec::new(),
            relay: RelayPolicy::default(),
            transports: TransportConfig::default(),
            dht: DhtConfig::default(),
            idle_connection_timeout_secs: DEFAULT_IDLE_CONNECTION_TIMEOUT_SECS,
        }
    }
}

/// `libp2p.transports.*` section.
///
/// QUIC is always mounted; only the stream transport is switchable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportConfig {
    #[serde(default = "default_true")]
    pub tcp: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self { tcp: true }
    }
}

/// `libp2p.dht.*` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DhtConfig {
    /// Seed peers, each ending in `/p2p/<peer-id>`
    #[serde(default, rename = "boostrap", alias = "bootstrap")]
    pub bootstrap: Vec<String>,
    /// Fail construction when no seed peer resolves
    #[serde(default = "default_true")]
    pub require_bootstrap_peers: bool,
}

impl Default for DhtConfig {
    fn default() -> Self {
        Self {
            bootstrap: Vec::new(),
            require_bootstrap_peers: true,
        }
    }
}

/// Relay / NAT policy handed to the host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelayPolicy {
    /// No relay client, no relay service
    #[default]
    Disabled,
    /// Reserve slots on discovered relays when not publicly reachable
    #[serde(alias = "autorelay")]
    Auto,
}

fn default_true() -> bool {
    true
}

fn default_idle_connection_timeout_secs() -> u64 {
    DEFAULT_IDLE_CONNECTION_TIMEOUT_SECS
}

impl NetworkConfig {
    /// Create an empty configuration (generated key, default listeners,
    /// bootstrap peers required).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the encoded node key.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.libp2p.key = key.into();
        self
    }

    /// Set the listen addresses.
    #[must_use]
    pub fn with_listen<I, S>(mut self, addrs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.libp2p.listen = addrs.into_iter().map(Into::into).collect();
        self
    }

    /// Set the DHT bootstrap peers.
    #[must_use]
    pub fn with_bootstrap<I, S>(mut self, addrs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.libp2p.dht.bootstrap = addrs.into_iter().map(Into::into).collect();
        self
    }

    /// Set the empty-bootstrap policy.
    #[must_use]
    pub fn with_require_bootstrap_peers(mut self, required: bool) -> Self {
        self.libp2p.dht.require_bootstrap_peers = required;
        self
    }

    /// Enable or disable the TCP stream transport.
    #[must_use]
    pub fn with_tcp(mut self, enabled: bool) -> Self {
        self.libp2p.transports.tcp = enabled;
        self
    }

    /// Set the relay policy.
    #[must_use]
    pub fn with_relay(mut self, relay: RelayPolicy) -> Self {
        self.libp2p.relay = relay;
        self
    }
}
