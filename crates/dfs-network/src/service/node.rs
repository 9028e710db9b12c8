use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use libp2p::PeerId;
use tracing::{debug, info};

use super::dht::create_dht;
use crate::adapters::Libp2pStack;
use crate::domain::{
    resolve_identity, resolve_listen_addresses, ListenAddressSet, NetworkConfig, NetworkResult,
    NodeIdentity, TransportSet,
};
use crate::ports::{Host, HostOptions, NetworkStack};

/// A network node: a running host with its DHT attached.
///
/// A `Node` never exists without its DHT. Dropping the node (and every
/// host/DHT handle cloned from it) shuts the host down; routing table
/// monitors do not keep it running.
pub struct Node<S: NetworkStack = Libp2pStack> {
    identity: NodeIdentity,
    listen_addrs: ListenAddressSet,
    host: S::Host,
    dht: S::Dht,
    started: AtomicBool,
}

impl Node {
    /// Build a node on the libp2p stack.
    ///
    /// # Errors
    ///
    /// Fails on the first construction step that fails; no node is returned.
    pub async fn new(config: &NetworkConfig) -> NetworkResult<Self> {
        Self::with_stack(&Libp2pStack::new(), config).await
    }
}

impl<S: NetworkStack> Node<S> {
    /// Build a node on `stack`.
    ///
    /// Resolves the identity, composes transports, resolves and checks the
    /// listen addresses, builds the host and finally attaches the DHT.
    pub async fn with_stack(stack: &S, config: &NetworkConfig) -> NetworkResult<Self> {
        let libp2p = &config.libp2p;

        let identity = resolve_identity(libp2p)?;
        let transports = TransportSet::compose(&libp2p.transports);
        let listen_addrs = resolve_listen_addresses(libp2p)?;
        transports.check_listen_addrs(&listen_addrs)?;

        debug!(
            peer_id = %identity.peer_id(),
            listen = listen_addrs.len(),
            tcp = libp2p.transports.tcp,
            "building libp2p host"
        );

        let host = stack
            .build_host(HostOptions {
                identity: identity.clone(),
                listen_addrs: listen_addrs.clone(),
                transports,
                relay: libp2p.relay,
                idle_connection_timeout: Duration::from_secs(libp2p.idle_connection_timeout_secs),
            })
            .await?;

        info!(peer_id = %host.id(), "libp2p host created");

        let dht = create_dht(stack, libp2p, &host).await?;

        Ok(Self {
            identity,
            listen_addrs,
            host,
            dht,
            started: AtomicBool::new(false),
        })
    }

    pub fn host(&self) -> &S::Host {
        &self.host
    }

    pub fn dht(&self) -> &S::Dht {
        &self.dht
    }

    pub fn identity(&self) -> &NodeIdentity {
        &self.identity
    }

    pub fn peer_id(&self) -> PeerId {
        self.identity.peer_id()
    }

    /// Configured listen addresses (the host may report resolved ports).
    pub fn listen_addrs(&self) -> &ListenAddressSet {
        &self.listen_addrs
    }

    /// Mark the node started. Idempotent; returns `true` on the first call.
    pub fn start(&self) -> bool {
        let first = !self.started.swap(true, Ordering::SeqCst);
        if first {
            info!(peer_id = %self.peer_id(), "node started");
        }
        first
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }
}

impl<S: NetworkStack> fmt::Debug for Node<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("peer_id", &self.peer_id())
            .field("listen_addrs", &self.listen_addrs)
            .field("started", &self.is_started())
            .finish_non_exhaustive()
    }
}
