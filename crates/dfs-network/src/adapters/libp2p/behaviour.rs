//! Swarm behaviour and transport stack of the libp2p host

use futures::future::Either;
use libp2p::core::muxing::StreamMuxerBox;
use libp2p::core::transport::Boxed;
use libp2p::core::upgrade;
use libp2p::identity::Keypair;
use libp2p::swarm::NetworkBehaviour;
use libp2p::{identify, kad, noise, quic, tcp, yamux, PeerId, StreamProtocol, Transport};

use crate::domain::{NetworkError, NetworkResult, TransportKind, TransportSet};

/// Kademlia protocol spoken by DFS nodes.
pub const KAD_PROTOCOL: StreamProtocol = StreamProtocol::new("/dfs/kad/1.0.0");

/// Identify protocol version advertised by DFS nodes.
pub const IDENTIFY_PROTOCOL: &str = "/dfs/id/1.0.0";

/// Behaviours mounted on every host.
///
/// Kademlia starts in client mode and is switched to server mode when the
/// DHT is attached; identify feeds inbound peers' listen addresses to it.
#[derive(NetworkBehaviour)]
pub(crate) struct HostBehaviour {
    pub(crate) identify: identify::Behaviour,
    pub(crate) kademlia: kad::Behaviour<kad::store::MemoryStore>,
}

impl HostBehaviour {
    pub(crate) fn new(keypair: &Keypair) -> Self {
        let peer_id = keypair.public().to_peer_id();

        let identify = identify::Behaviour::new(identify::Config::new(
            IDENTIFY_PROTOCOL.to_string(),
            keypair.public(),
        ));

        let mut kademlia = kad::Behaviour::with_config(
            peer_id,
            kad::store::MemoryStore::new(peer_id),
            kad::Config::new(KAD_PROTOCOL),
        );
        kademlia.set_mode(Some(kad::Mode::Client));

        Self { identify, kademlia }
    }
}

/// Build the boxed transport for a host.
///
/// QUIC is always mounted and tried first. TCP is upgraded with Noise and
/// Yamux when enabled.
pub(crate) fn build_transport(
    keypair: &Keypair,
    transports: &TransportSet,
) -> NetworkResult<Boxed<(PeerId, StreamMuxerBox)>> {
    let quic_transport = quic::tokio::Transport::new(quic::Config::new(keypair))
        .map(|(peer_id, connection), _| (peer_id, StreamMuxerBox::new(connection)));

    if !transports.contains(TransportKind::Tcp) {
        return Ok(quic_transport.boxed());
    }

    let noise_config = noise::Config::new(keypair).map_err(|e| NetworkError::Transport {
        reason: format!("noise handshake config: {e}"),
    })?;

    let tcp_transport = tcp::tokio::Transport::new(tcp::Config::default().nodelay(true))
        .upgrade(upgrade::Version::V1Lazy)
        .authenticate(noise_config)
        .multiplex(yamux::Config::default())
        .map(|(peer_id, muxer), _| (peer_id, StreamMuxerBox::new(muxer)));

    Ok(quic_transport
        .or_transport(tcp_transport)
        .map(|output, _| match output {
            Either::Left(output) => output,
            Either::Right(output) => output,
        })
        .boxed())
}
