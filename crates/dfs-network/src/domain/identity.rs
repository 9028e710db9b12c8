//! Node identity
//!
//! A node is identified by an Ed25519 key pair. The configuration carries the
//! key as base64 of the libp2p protobuf key encoding, which keeps keys
//! interchangeable with other libp2p implementations.

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use libp2p::identity::Keypair;
use libp2p::PeerId;
use tracing::info;

use super::config::Libp2pConfig;
use super::errors::{NetworkError, NetworkResult};

/// Where a node identity came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityOrigin {
    /// Decoded from `libp2p.key`
    Loaded,
    /// Generated because `libp2p.key` was empty
    Generated,
}

/// Cryptographic identity of a node.
///
/// Immutable once created; the derived [`PeerId`] is computed once.
#[derive(Clone)]
pub struct NodeIdentity {
    keypair: Keypair,
    peer_id: PeerId,
    origin: IdentityOrigin,
}

impl NodeIdentity {
    /// Generate a fresh Ed25519 identity.
    #[must_use]
    pub fn generate() -> Self {
        Self::from_keypair(Keypair::generate_ed25519(), IdentityOrigin::Generated)
    }

    /// Decode an identity from its configuration encoding.
    pub fn from_encoded(encoded: &str) -> NetworkResult<Self> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| NetworkError::Identity {
                reason: format!("load libp2p key error: {e}"),
            })?;

        let keypair =
            Keypair::from_protobuf_encoding(&bytes).map_err(|e| NetworkError::Identity {
                reason: format!("load libp2p key error: {e}"),
            })?;

        Ok(Self::from_keypair(keypair, IdentityOrigin::Loaded))
    }

    fn from_keypair(keypair: Keypair, origin: IdentityOrigin) -> Self {
        let peer_id = keypair.public().to_peer_id();
        Self {
            keypair,
            peer_id,
            origin,
        }
    }

    /// Encode the identity for storage in `libp2p.key`.
    pub fn encode(&self) -> NetworkResult<String> {
        let bytes = self
            .keypair
            .to_protobuf_encoding()
            .map_err(|e| NetworkError::Identity {
                reason: format!("create libp2p key error: {e}"),
            })?;
        Ok(STANDARD.encode(bytes))
    }

    pub fn peer_id(&self) -> PeerId {
        self.peer_id
    }

    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }

    pub fn origin(&self) -> IdentityOrigin {
        self.origin
    }
}

impl fmt::Debug for NodeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeIdentity")
            .field("peer_id", &self.peer_id)
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

/// Load the node identity from `libp2p.key`, or generate one.
///
/// A generated key is logged once so the operator can copy it into the
/// configuration; nothing is written back.
pub fn resolve_identity(config: &Libp2pConfig) -> NetworkResult<NodeIdentity> {
    if config.key.trim().is_empty() {
        let identity = NodeIdentity::generate();
        let encoded = identity.encode()?;
        info!(key = %encoded, peer_id = %identity.peer_id(), "create new libp2p key");
        return Ok(identity);
    }

    NodeIdentity::from_encoded(&config.key)
}
