//! Domain Errors for node construction and supervision

use thiserror::Error;

/// Errors that can occur while building, wiring or observing a node.
///
/// Every construction step maps its failure onto exactly one variant and
/// carries the config key or address that caused it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NetworkError {
    /// Key generation, encoding or decoding failed
    #[error("libp2p key error: {reason}")]
    Identity { reason: String },

    /// A configuration value could not be loaded or parsed
    #[error("load config {key} error: {reason}")]
    Config { key: String, reason: String },

    /// A transport could not be constructed or cannot serve a listen address
    #[error("libp2p transport error: {reason}")]
    Transport { reason: String },

    /// Host construction failed or the host is no longer running
    #[error("create libp2p host error: {reason}")]
    Host { reason: String },

    /// A bootstrap entry is not a valid multi-address
    #[error("load config libp2p dht boostrap addr {addr} error: {reason}")]
    BootstrapAddress { addr: String, reason: String },

    /// A bootstrap entry does not resolve to a peer id and address
    #[error("load config libp2p dht boostrap peer {addr} error: {reason}")]
    BootstrapPeer { addr: String, reason: String },

    /// No bootstrap peer resolved while peers are required
    #[error("libp2p.dht.boostrap can't be empty")]
    DhtBootstrap,

    /// The DHT could not be attached to the host
    #[error("create libp2p dht error: {reason}")]
    DhtCreate { reason: String },

    /// Direct connection to a peer failed
    #[error("connect to peer {peer} error: {reason}")]
    PeerConnect { peer: String, reason: String },

    /// A periodic task was given a zero interval
    #[error("interval must be greater than zero")]
    InvalidInterval,
}

impl NetworkError {
    pub(crate) fn config(key: impl Into<String>, reason: impl ToString) -> Self {
        Self::Config {
            key: key.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn host(reason: impl ToString) -> Self {
        Self::Host {
            reason: reason.to_string(),
        }
    }
}

/// Result type for network operations
pub type NetworkResult<T> = Result<T, NetworkError>;
