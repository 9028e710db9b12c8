//! # libp2p Network Stack
//!
//! Production adapter. Each host is a `Swarm` carrying identify and Kademlia,
//! driven by a dedicated tokio task. [`Libp2pHost`] and [`Libp2pDht`] are
//! thin handles that send commands to that task; [`WeakLibp2pDht`] refers to
//! the task without keeping it alive.

mod behaviour;
mod driver;

use std::time::Duration;

use async_trait::async_trait;
use libp2p::swarm::{self, Swarm};
use libp2p::{Multiaddr, PeerId};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::domain::{NetworkError, NetworkResult, PeerAddr, RelayPolicy};
use crate::ports::{Dht, DhtOptions, Host, HostOptions, NetworkStack, WeakDht};

pub use behaviour::{IDENTIFY_PROTOCOL, KAD_PROTOCOL};

use behaviour::{build_transport, HostBehaviour};
use driver::{Command, SwarmDriver};

/// Upper bound on a single `connect` call.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

const COMMAND_BUFFER: usize = 64;

// =============================================================================
// Libp2pStack
// =============================================================================

/// Builds libp2p hosts on the current tokio runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct Libp2pStack;

impl Libp2pStack {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NetworkStack for Libp2pStack {
    type Host = Libp2pHost;
    type Dht = Libp2pDht;

    async fn build_host(&self, options: HostOptions) -> NetworkResult<Libp2pHost> {
        if options.relay == RelayPolicy::Auto {
            return Err(NetworkError::host("automatic relay is not supported"));
        }

        let keypair = options.identity.keypair().clone();
        let peer_id = options.identity.peer_id();

        let transport = build_transport(&keypair, &options.transports)?;
        let behaviour = HostBehaviour::new(&keypair);
        let config = swarm::Config::with_tokio_executor()
            .with_idle_connection_timeout(options.idle_connection_timeout);

        let mut swarm = Swarm::new(transport, behaviour, peer_id, config);
        driver::listen(&mut swarm, &options.listen_addrs).await?;

        let (commands, receiver) = mpsc::channel(COMMAND_BUFFER);
        tokio::spawn(SwarmDriver::new(swarm, receiver).run());

        debug!(%peer_id, "libp2p host started");
        Ok(Libp2pHost { peer_id, commands })
    }

    async fn build_dht(&self, host: &Libp2pHost, options: DhtOptions) -> NetworkResult<Libp2pDht> {
        let bootstrap_peers = options.bootstrap_peers.into_vec();
        let seeds = bootstrap_peers.len();

        host.request(|reply| Command::AttachDht {
            bootstrap_peers,
            reply,
        })
        .await?
        .map_err(|reason| NetworkError::DhtCreate { reason })?;

        info!(peer_id = %host.peer_id, seeds, "libp2p dht attached");
        Ok(Libp2pDht { host: host.clone() })
    }
}

// =============================================================================
// Libp2pHost / Libp2pDht
// =============================================================================

/// Handle to a running libp2p host.
///
/// The swarm task stops once every handle has been dropped.
#[derive(Debug, Clone)]
pub struct Libp2pHost {
    peer_id: PeerId,
    commands: mpsc::Sender<Command>,
}

impl Libp2pHost {
    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> NetworkResult<T> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| NetworkError::host("host is not running"))?;
        response
            .await
            .map_err(|_| NetworkError::host("host is not running"))
    }
}

#[async_trait]
impl Host for Libp2pHost {
    fn id(&self) -> PeerId {
        self.peer_id
    }

    async fn addrs(&self) -> NetworkResult<Vec<Multiaddr>> {
        self.request(|reply| Command::ListenAddrs { reply }).await
    }

    async fn connect(&self, peer: &PeerAddr) -> NetworkResult<()> {
        let connect_error = |reason: String| NetworkError::PeerConnect {
            peer: peer.peer_id.to_string(),
            reason,
        };

        if peer.peer_id == self.peer_id {
            return Err(connect_error("cannot dial self".into()));
        }

        let dial = self.request(|reply| Command::Connect {
            peer: peer.clone(),
            reply,
        });

        match tokio::time::timeout(CONNECT_TIMEOUT, dial).await {
            Ok(result) => result?.map_err(connect_error),
            Err(_) => Err(connect_error(format!(
                "timed out after {}s",
                CONNECT_TIMEOUT.as_secs()
            ))),
        }
    }

    async fn is_connected(&self, peer: &PeerId) -> NetworkResult<bool> {
        self.request(|reply| Command::IsConnected { peer: *peer, reply })
            .await
    }
}

/// Kademlia DHT attached to a [`Libp2pHost`].
#[derive(Debug, Clone)]
pub struct Libp2pDht {
    host: Libp2pHost,
}

#[async_trait]
impl Dht for Libp2pDht {
    type Host = Libp2pHost;
    type Weak = WeakLibp2pDht;

    fn host(&self) -> &Libp2pHost {
        &self.host
    }

    fn downgrade(&self) -> WeakLibp2pDht {
        WeakLibp2pDht {
            peer_id: self.host.peer_id,
            commands: self.host.commands.downgrade(),
        }
    }

    async fn routing_table_peers(&self) -> NetworkResult<Vec<PeerId>> {
        self.host
            .request(|reply| Command::RoutingTable { reply })
            .await
    }
}

/// [`Libp2pDht`] handle that does not count towards keeping the swarm task
/// running.
#[derive(Debug, Clone)]
pub struct WeakLibp2pDht {
    peer_id: PeerId,
    commands: mpsc::WeakSender<Command>,
}

impl WeakDht for WeakLibp2pDht {
    type Dht = Libp2pDht;

    fn upgrade(&self) -> Option<Libp2pDht> {
        let commands = self.commands.upgrade()?;
        Some(Libp2pDht {
            host: Libp2pHost {
                peer_id: self.peer_id,
                commands,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        BootstrapPeerSet, ListenAddressSet, NodeIdentity, TransportConfig, TransportSet,
    };

    fn options(addrs: &[&str], tcp: bool) -> HostOptions {
        HostOptions {
            identity: NodeIdentity::generate(),
            listen_addrs: ListenAddressSet::parse(addrs.iter().copied()).unwrap(),
            transports: TransportSet::compose(&TransportConfig { tcp }),
            relay: RelayPolicy::Disabled,
            idle_connection_timeout: Duration::from_secs(60),
        }
    }

    async fn wait_for_route(dht: &Libp2pDht, peer: PeerId) -> bool {
        for _ in 0..50 {
            if dht.routing_table_peers().await.unwrap().contains(&peer) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        false
    }

    #[tokio::test]
    async fn test_host_reports_bound_quic_address() {
        let stack = Libp2pStack::new();
        let host = stack
            .build_host(options(&["/ip4/127.0.0.1/udp/0/quic-v1"], false))
            .await
            .unwrap();

        let addrs = host.addrs().await.unwrap();
        assert_eq!(addrs.len(), 1);
        assert!(addrs[0].to_string().ends_with("/quic-v1"));
        assert!(!addrs[0].to_string().contains("/udp/0/"));
    }

    #[tokio::test]
    async fn test_auto_relay_is_rejected() {
        let mut opts = options(&["/ip4/127.0.0.1/udp/0/quic-v1"], false);
        opts.relay = RelayPolicy::Auto;

        let err = Libp2pStack::new().build_host(opts).await.unwrap_err();
        assert!(matches!(err, NetworkError::Host { .. }));
    }

    #[tokio::test]
    async fn test_second_dht_attach_fails() {
        let stack = Libp2pStack::new();
        let host = stack
            .build_host(options(&["/ip4/127.0.0.1/udp/0/quic-v1"], false))
            .await
            .unwrap();

        stack.build_dht(&host, DhtOptions::default()).await.unwrap();
        let err = stack
            .build_dht(&host, DhtOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, NetworkError::DhtCreate { .. }));
    }

    #[tokio::test]
    async fn test_connect_over_quic_fills_routing_tables() {
        let stack = Libp2pStack::new();

        let seed_host = stack
            .build_host(options(&["/ip4/127.0.0.1/udp/0/quic-v1"], false))
            .await
            .unwrap();
        let seed = stack
            .build_dht(&seed_host, DhtOptions::default())
            .await
            .unwrap();

        let seed_addr = PeerAddr::new(seed_host.id(), seed_host.addrs().await.unwrap());
        let entries: Vec<String> = seed_addr
            .addrs
            .iter()
            .map(|a| format!("{a}/p2p/{}", seed_addr.peer_id))
            .collect();
        let bootstrap_peers = BootstrapPeerSet::parse(entries.iter().map(String::as_str)).unwrap();

        let host = stack
            .build_host(options(&["/ip4/127.0.0.1/udp/0/quic-v1"], false))
            .await
            .unwrap();
        let dht = stack
            .build_dht(&host, DhtOptions { bootstrap_peers })
            .await
            .unwrap();

        host.connect(&seed_addr).await.unwrap();

        assert!(host.is_connected(&seed_host.id()).await.unwrap());
        assert!(wait_for_route(&dht, seed_host.id()).await);
        assert!(wait_for_route(&seed, host.id()).await);
    }

    #[tokio::test]
    async fn test_weak_dht_does_not_keep_host_running() {
        let stack = Libp2pStack::new();
        let host = stack
            .build_host(options(&["/ip4/127.0.0.1/udp/0/quic-v1"], false))
            .await
            .unwrap();
        let dht = stack.build_dht(&host, DhtOptions::default()).await.unwrap();

        let weak = dht.downgrade();
        let upgraded = weak.upgrade().unwrap();
        assert_eq!(upgraded.host().id(), host.id());
        assert!(upgraded.routing_table_peers().await.unwrap().is_empty());

        drop(upgraded);
        drop(dht);
        drop(host);
        assert!(weak.upgrade().is_none());
    }

    #[tokio::test]
    async fn test_connect_to_unreachable_peer_fails() {
        let stack = Libp2pStack::new();
        let host = stack
            .build_host(options(&["/ip4/127.0.0.1/tcp/0"], true))
            .await
            .unwrap();

        let ghost = PeerAddr::new(
            NodeIdentity::generate().peer_id(),
            vec!["/ip4/127.0.0.1/tcp/1".parse().unwrap()],
        );
        let err = host.connect(&ghost).await.unwrap_err();
        assert!(matches!(err, NetworkError::PeerConnect { .. }));
    }
}
