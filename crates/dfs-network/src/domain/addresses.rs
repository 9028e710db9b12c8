//! Listen addresses and bootstrap peers

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use libp2p::multiaddr::Protocol;
use libp2p::{Multiaddr, PeerId};

use super::config::Libp2pConfig;
use super::errors::{NetworkError, NetworkResult};

/// UDP port of the QUIC listeners used when `libp2p.listen` is empty.
pub const DEFAULT_LISTEN_PORT: u16 = 1902;

const LISTEN_KEY: &str = "libp2p.listen";

// =============================================================================
// LISTEN ADDRESSES
// =============================================================================

/// Ordered, non-empty set of listen addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenAddressSet {
    addrs: Vec<Multiaddr>,
}

impl ListenAddressSet {
    /// QUIC on [`DEFAULT_LISTEN_PORT`] over IPv4 and IPv6 loopback.
    #[must_use]
    pub fn defaults() -> Self {
        let loopback = [IpAddr::V4(Ipv4Addr::LOCALHOST), IpAddr::V6(Ipv6Addr::LOCALHOST)];
        Self {
            addrs: loopback
                .into_iter()
                .map(|ip| {
                    Multiaddr::from(ip)
                        .with(Protocol::Udp(DEFAULT_LISTEN_PORT))
                        .with(Protocol::QuicV1)
                })
                .collect(),
        }
    }

    /// Parse address strings; an empty input yields the defaults.
    pub fn parse<'a, I>(addrs: I) -> NetworkResult<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let addrs = addrs
            .into_iter()
            .map(|s| {
                s.parse::<Multiaddr>().map_err(|e| {
                    NetworkError::config(LISTEN_KEY, format!("invalid address {s}: {e}"))
                })
            })
            .collect::<NetworkResult<Vec<_>>>()?;

        if addrs.is_empty() {
            return Ok(Self::defaults());
        }

        Ok(Self { addrs })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Multiaddr> {
        self.addrs.iter()
    }

    pub fn as_slice(&self) -> &[Multiaddr] {
        &self.addrs
    }

    pub fn len(&self) -> usize {
        self.addrs.len()
    }

    /// Always false for a resolved set.
    pub fn is_empty(&self) -> bool {
        self.addrs.is_empty()
    }
}

/// Resolve `libp2p.listen`.
pub fn resolve_listen_addresses(config: &Libp2pConfig) -> NetworkResult<ListenAddressSet> {
    ListenAddressSet::parse(config.listen.iter().map(String::as_str))
}

// =============================================================================
// BOOTSTRAP PEERS
// =============================================================================

/// A peer id together with the addresses it can be dialed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerAddr {
    pub peer_id: PeerId,
    pub addrs: Vec<Multiaddr>,
}

impl PeerAddr {
    pub fn new(peer_id: PeerId, addrs: Vec<Multiaddr>) -> Self {
        Self { peer_id, addrs }
    }

    /// Split a `.../p2p/<peer-id>` address into peer id and transport address.
    ///
    /// Returns the raw reason on failure; callers attach the config context.
    pub fn from_p2p_addr(addr: &Multiaddr) -> Result<Self, String> {
        let mut transport_addr = addr.clone();
        let peer_id = match transport_addr.pop() {
            Some(Protocol::P2p(peer_id)) => peer_id,
            _ => return Err("missing trailing /p2p/<peer-id> component".to_string()),
        };

        if transport_addr.iter().next().is_none() {
            return Err("missing transport address before /p2p component".to_string());
        }

        if transport_addr.iter().any(|p| matches!(p, Protocol::P2p(_))) {
            return Err("relayed or nested /p2p addresses are not supported".to_string());
        }

        Ok(Self {
            peer_id,
            addrs: vec![transport_addr],
        })
    }
}

/// Seed peers for the DHT, one entry per peer, in order of first appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootstrapPeerSet {
    peers: Vec<PeerAddr>,
}

impl BootstrapPeerSet {
    /// Parse bootstrap entries; the first malformed entry aborts.
    pub fn parse<'a, I>(entries: I) -> NetworkResult<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut set = Self::default();

        for entry in entries {
            let multiaddr: Multiaddr =
                entry
                    .parse()
                    .map_err(|e: libp2p::multiaddr::Error| NetworkError::BootstrapAddress {
                        addr: entry.to_string(),
                        reason: e.to_string(),
                    })?;

            let peer = PeerAddr::from_p2p_addr(&multiaddr).map_err(|reason| {
                NetworkError::BootstrapPeer {
                    addr: entry.to_string(),
                    reason,
                }
            })?;

            set.insert(peer);
        }

        Ok(set)
    }

    fn insert(&mut self, peer: PeerAddr) {
        match self.peers.iter_mut().find(|p| p.peer_id == peer.peer_id) {
            Some(existing) => {
                for addr in peer.addrs {
                    if !existing.addrs.contains(&addr) {
                        existing.addrs.push(addr);
                    }
                }
            }
            None => self.peers.push(peer),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &PeerAddr> {
        self.peers.iter()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn into_vec(self) -> Vec<PeerAddr> {
        self.peers
    }
}

/// Resolve `libp2p.dht.boostrap`.
pub fn resolve_bootstrap_peers(config: &Libp2pConfig) -> NetworkResult<BootstrapPeerSet> {
    BootstrapPeerSet::parse(config.dht.bootstrap.iter().map(String::as_str))
}
