//! # In-Memory Network Stack
//!
//! Process-local stand-in for the libp2p stack. Hosts register their listen
//! addresses in a shared table, `connect` links two hosts directly, and an
//! attached DHT's routing table holds every connected peer that also has a
//! DHT, plus its seed peers.
//!
//! Useful for testing node construction, sharding and monitoring without
//! sockets. Hosts unregister when their last handle is dropped.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use libp2p::{Multiaddr, PeerId};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::domain::{NetworkError, NetworkResult, PeerAddr};
use crate::ports::{Dht, DhtOptions, Host, HostOptions, NetworkStack, WeakDht};

// =============================================================================
// SHARED NETWORK STATE
// =============================================================================

#[derive(Debug, Default)]
struct HostState {
    addrs: Vec<Multiaddr>,
    connections: HashSet<PeerId>,
    /// `Some` once a DHT is attached; insertion-ordered routing table
    routing_table: Option<Vec<PeerId>>,
}

impl HostState {
    fn add_route(&mut self, peer: PeerId) {
        if let Some(table) = self.routing_table.as_mut() {
            if !table.contains(&peer) {
                table.push(peer);
            }
        }
    }

    fn has_dht(&self) -> bool {
        self.routing_table.is_some()
    }
}

#[derive(Debug, Default)]
struct MemoryNetwork {
    hosts: HashMap<PeerId, HostState>,
    listeners: HashMap<Multiaddr, PeerId>,
}

impl MemoryNetwork {
    fn link(&mut self, a: PeerId, b: PeerId) {
        let both_dht = self.hosts.get(&a).is_some_and(HostState::has_dht)
            && self.hosts.get(&b).is_some_and(HostState::has_dht);

        if let Some(state) = self.hosts.get_mut(&a) {
            state.connections.insert(b);
            if both_dht {
                state.add_route(b);
            }
        }
        if let Some(state) = self.hosts.get_mut(&b) {
            state.connections.insert(a);
            if both_dht {
                state.add_route(a);
            }
        }
    }

    fn resolve(&self, peer: &PeerAddr) -> Result<PeerId, String> {
        let target = self
            .hosts
            .get(&peer.peer_id)
            .ok_or_else(|| "peer is not running".to_string())?;

        if peer.addrs.iter().any(|addr| target.addrs.contains(addr)) {
            Ok(peer.peer_id)
        } else {
            Err("no reachable address".to_string())
        }
    }
}

/// Unregisters a host when the last handle goes away.
#[derive(Debug)]
struct Registration {
    peer_id: PeerId,
    network: Arc<Mutex<MemoryNetwork>>,
}

impl Drop for Registration {
    fn drop(&mut self) {
        let mut network = self.network.lock();
        if let Some(state) = network.hosts.remove(&self.peer_id) {
            for addr in &state.addrs {
                network.listeners.remove(addr);
            }
            for peer in &state.connections {
                if let Some(other) = network.hosts.get_mut(peer) {
                    other.connections.remove(&self.peer_id);
                }
            }
        }
    }
}

// =============================================================================
// MemoryStack
// =============================================================================

/// Network stack whose hosts live in a shared in-process table.
///
/// Clones share the same network; independent `MemoryStack::new()` values
/// are isolated from each other.
#[derive(Debug, Clone, Default)]
pub struct MemoryStack {
    network: Arc<Mutex<MemoryNetwork>>,
}

impl MemoryStack {
    /// Create an empty, isolated network.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of hosts currently running.
    pub fn host_count(&self) -> usize {
        self.network.lock().hosts.len()
    }
}

#[async_trait]
impl NetworkStack for MemoryStack {
    type Host = MemoryHost;
    type Dht = MemoryDht;

    async fn build_host(&self, options: HostOptions) -> NetworkResult<MemoryHost> {
        let peer_id = options.identity.peer_id();
        let addrs: Vec<Multiaddr> = options.listen_addrs.iter().cloned().collect();

        let mut network = self.network.lock();

        if network.hosts.contains_key(&peer_id) {
            return Err(NetworkError::host(format!("peer {peer_id} is already running")));
        }
        if let Some(addr) = addrs.iter().find(|a| network.listeners.contains_key(*a)) {
            return Err(NetworkError::host(format!(
                "listen on {addr}: address already in use"
            )));
        }

        for addr in &addrs {
            network.listeners.insert(addr.clone(), peer_id);
        }
        network.hosts.insert(
            peer_id,
            HostState {
                addrs,
                ..HostState::default()
            },
        );
        drop(network);

        debug!(%peer_id, "memory host started");

        Ok(MemoryHost {
            peer_id,
            network: Arc::clone(&self.network),
            _registration: Arc::new(Registration {
                peer_id,
                network: Arc::clone(&self.network),
            }),
        })
    }

    async fn build_dht(&self, host: &MemoryHost, options: DhtOptions) -> NetworkResult<MemoryDht> {
        let local = host.peer_id;
        let mut network = self.network.lock();

        let state = network.hosts.get_mut(&local).ok_or_else(|| NetworkError::DhtCreate {
            reason: "host is not running".into(),
        })?;
        if state.has_dht() {
            return Err(NetworkError::DhtCreate {
                reason: "dht already attached to host".into(),
            });
        }
        state.routing_table = Some(Vec::new());

        let connected: Vec<PeerId> = state.connections.iter().copied().collect();
        for peer in connected {
            network.link(local, peer);
        }

        for seed in options.bootstrap_peers.iter() {
            if let Some(state) = network.hosts.get_mut(&local) {
                state.add_route(seed.peer_id);
            }
            match network.resolve(seed) {
                Ok(peer) => network.link(local, peer),
                Err(reason) => warn!(peer = %seed.peer_id, %reason, "bootstrap peer unreachable"),
            }
        }

        Ok(MemoryDht { host: host.clone() })
    }
}

// =============================================================================
// MemoryHost / MemoryDht
// =============================================================================

/// Handle to a host registered in a [`MemoryStack`].
#[derive(Debug, Clone)]
pub struct MemoryHost {
    peer_id: PeerId,
    network: Arc<Mutex<MemoryNetwork>>,
    _registration: Arc<Registration>,
}

#[async_trait]
impl Host for MemoryHost {
    fn id(&self) -> PeerId {
        self.peer_id
    }

    async fn addrs(&self) -> NetworkResult<Vec<Multiaddr>> {
        let network = self.network.lock();
        network
            .hosts
            .get(&self.peer_id)
            .map(|state| state.addrs.clone())
            .ok_or_else(|| NetworkError::host("host is not running"))
    }

    async fn connect(&self, peer: &PeerAddr) -> NetworkResult<()> {
        if peer.peer_id == self.peer_id {
            return Err(NetworkError::PeerConnect {
                peer: peer.peer_id.to_string(),
                reason: "cannot dial self".into(),
            });
        }

        let mut network = self.network.lock();
        let target = network.resolve(peer).map_err(|reason| NetworkError::PeerConnect {
            peer: peer.peer_id.to_string(),
            reason,
        })?;
        network.link(self.peer_id, target);
        Ok(())
    }

    async fn is_connected(&self, peer: &PeerId) -> NetworkResult<bool> {
        let network = self.network.lock();
        Ok(network
            .hosts
            .get(&self.peer_id)
            .is_some_and(|state| state.connections.contains(peer)))
    }
}

/// DHT attached to a [`MemoryHost`].
#[derive(Debug, Clone)]
pub struct MemoryDht {
    host: MemoryHost,
}

#[async_trait]
impl Dht for MemoryDht {
    type Host = MemoryHost;
    type Weak = WeakMemoryDht;

    fn host(&self) -> &MemoryHost {
        &self.host
    }

    fn downgrade(&self) -> WeakMemoryDht {
        WeakMemoryDht {
            peer_id: self.host.peer_id,
            network: Arc::clone(&self.host.network),
            registration: Arc::downgrade(&self.host._registration),
        }
    }

    async fn routing_table_peers(&self) -> NetworkResult<Vec<PeerId>> {
        let network = self.host.network.lock();
        network
            .hosts
            .get(&self.host.peer_id)
            .and_then(|state| state.routing_table.clone())
            .ok_or_else(|| NetworkError::host("host is not running"))
    }
}

/// [`MemoryDht`] handle that does not keep its host registered.
#[derive(Debug, Clone)]
pub struct WeakMemoryDht {
    peer_id: PeerId,
    network: Arc<Mutex<MemoryNetwork>>,
    registration: Weak<Registration>,
}

impl WeakDht for WeakMemoryDht {
    type Dht = MemoryDht;

    fn upgrade(&self) -> Option<MemoryDht> {
        let registration = self.registration.upgrade()?;
        Some(MemoryDht {
            host: MemoryHost {
                peer_id: self.peer_id,
                network: Arc::clone(&self.network),
                _registration: registration,
            },
        })
    }
}
