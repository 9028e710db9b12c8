//! Domain Layer - configuration, identity and address handling with no I/O
//!
//! This module contains the value types a node is built from:
//! - Node configuration (`libp2p.*` key paths)
//! - Node identity (Ed25519 key pair, peer id)
//! - Listen address set and bootstrap peer set
//! - Transport composition
//! - Errors

pub mod addresses;
pub mod config;
pub mod errors;
pub mod identity;
pub mod transport;

pub use addresses::{
    resolve_bootstrap_peers, resolve_listen_addresses, BootstrapPeerSet, ListenAddressSet,
    PeerAddr, DEFAULT_LISTEN_PORT,
};
pub use config::{
    DhtConfig, Libp2pConfig, NetworkConfig, RelayPolicy, TransportConfig,
    DEFAULT_IDLE_CONNECTION_TIMEOUT_SECS,
};
pub use errors::{NetworkError, NetworkResult};
pub use identity::{resolve_identity, IdentityOrigin, NodeIdentity};
pub use transport::{TransportKind, TransportSet};
