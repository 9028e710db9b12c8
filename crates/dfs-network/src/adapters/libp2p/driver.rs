//! Swarm driver task
//!
//! The swarm is owned by a single tokio task. Host and DHT handles talk to it
//! over an mpsc command channel; the task ends once every handle is dropped.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use futures::StreamExt;
use libp2p::swarm::dial_opts::{DialOpts, PeerCondition};
use libp2p::swarm::{Swarm, SwarmEvent};
use libp2p::{identify, kad, Multiaddr, PeerId};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use super::behaviour::{HostBehaviour, HostBehaviourEvent, KAD_PROTOCOL};
use crate::domain::{ListenAddressSet, NetworkError, NetworkResult, PeerAddr};

/// How long host construction waits for every listener to come up.
const LISTEN_TIMEOUT: Duration = Duration::from_secs(10);

type Reply<T> = oneshot::Sender<T>;

/// Requests handled by the driver task.
#[derive(Debug)]
pub(crate) enum Command {
    ListenAddrs {
        reply: Reply<Vec<Multiaddr>>,
    },
    Connect {
        peer: PeerAddr,
        reply: Reply<Result<(), String>>,
    },
    IsConnected {
        peer: PeerId,
        reply: Reply<bool>,
    },
    AttachDht {
        bootstrap_peers: Vec<PeerAddr>,
        reply: Reply<Result<(), String>>,
    },
    RoutingTable {
        reply: Reply<Vec<PeerId>>,
    },
}

/// Start listening on every address and wait until each listener is bound.
pub(crate) async fn listen(
    swarm: &mut Swarm<HostBehaviour>,
    addrs: &ListenAddressSet,
) -> NetworkResult<()> {
    let mut pending = HashSet::new();
    for addr in addrs.iter() {
        let listener = swarm
            .listen_on(addr.clone())
            .map_err(|e| NetworkError::host(format!("listen on {addr}: {e}")))?;
        pending.insert(listener);
    }

    let deadline = tokio::time::sleep(LISTEN_TIMEOUT);
    tokio::pin!(deadline);

    while !pending.is_empty() {
        tokio::select! {
            event = swarm.select_next_some() => match event {
                SwarmEvent::NewListenAddr { listener_id, address, .. } => {
                    debug!(%address, "listening");
                    pending.remove(&listener_id);
                }
                SwarmEvent::ListenerClosed { listener_id, reason, .. }
                    if pending.contains(&listener_id) =>
                {
                    return Err(NetworkError::host(format!("listener closed: {reason:?}")));
                }
                SwarmEvent::ListenerError { listener_id, error, .. }
                    if pending.contains(&listener_id) =>
                {
                    return Err(NetworkError::host(format!("listener error: {error}")));
                }
                _ => {}
            },
            _ = &mut deadline => {
                return Err(NetworkError::host("timed out waiting for listeners"));
            }
        }
    }

    Ok(())
}

/// Owns the swarm and serves [`Command`]s.
pub(crate) struct SwarmDriver {
    swarm: Swarm<HostBehaviour>,
    commands: mpsc::Receiver<Command>,
    pending_dials: HashMap<PeerId, Vec<Reply<Result<(), String>>>>,
    dht_attached: bool,
}

impl SwarmDriver {
    pub(crate) fn new(swarm: Swarm<HostBehaviour>, commands: mpsc::Receiver<Command>) -> Self {
        Self {
            swarm,
            commands,
            pending_dials: HashMap::new(),
            dht_attached: false,
        }
    }

    pub(crate) async fn run(mut self) {
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                event = self.swarm.select_next_some() => self.handle_event(event),
            }
        }

        info!(peer_id = %self.swarm.local_peer_id(), "libp2p host stopped");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::ListenAddrs { reply } => {
                let _ = reply.send(self.swarm.listeners().cloned().collect());
            }
            Command::Connect { peer, reply } => self.connect(peer, reply),
            Command::IsConnected { peer, reply } => {
                let _ = reply.send(self.swarm.is_connected(&peer));
            }
            Command::AttachDht {
                bootstrap_peers,
                reply,
            } => {
                let _ = reply.send(self.attach_dht(bootstrap_peers));
            }
            Command::RoutingTable { reply } => {
                let _ = reply.send(self.routing_table_peers());
            }
        }
    }

    fn connect(&mut self, peer: PeerAddr, reply: Reply<Result<(), String>>) {
        if self.swarm.is_connected(&peer.peer_id) {
            let _ = reply.send(Ok(()));
            return;
        }

        let opts = DialOpts::peer_id(peer.peer_id)
            .addresses(peer.addrs)
            .condition(PeerCondition::Always)
            .build();

        match self.swarm.dial(opts) {
            Ok(()) => self
                .pending_dials
                .entry(peer.peer_id)
                .or_default()
                .push(reply),
            Err(e) => {
                let _ = reply.send(Err(e.to_string()));
            }
        }
    }

    fn attach_dht(&mut self, bootstrap_peers: Vec<PeerAddr>) -> Result<(), String> {
        if self.dht_attached {
            return Err("dht already attached to host".to_string());
        }

        let kademlia = &mut self.swarm.behaviour_mut().kademlia;
        kademlia.set_mode(Some(kad::Mode::Server));

        for peer in &bootstrap_peers {
            for addr in &peer.addrs {
                kademlia.add_address(&peer.peer_id, addr.clone());
            }
        }

        if !bootstrap_peers.is_empty() {
            if let Err(e) = kademlia.bootstrap() {
                warn!(error = %e, "dht bootstrap not started");
            }
        }

        self.dht_attached = true;
        Ok(())
    }

    fn routing_table_peers(&mut self) -> Vec<PeerId> {
        let mut peers = Vec::new();
        for bucket in self.swarm.behaviour_mut().kademlia.kbuckets() {
            for entry in bucket.iter() {
                peers.push(*entry.node.key.preimage());
            }
        }
        peers
    }

    fn resolve_dials(&mut self, peer_id: &PeerId, result: Result<(), String>) {
        if let Some(waiters) = self.pending_dials.remove(peer_id) {
            for waiter in waiters {
                let _ = waiter.send(result.clone());
            }
        }
    }

    fn handle_event(&mut self, event: SwarmEvent<HostBehaviourEvent>) {
        match event {
            SwarmEvent::ConnectionEstablished {
                peer_id, endpoint, ..
            } => {
                debug!(%peer_id, address = %endpoint.get_remote_address(), "connection established");
                self.resolve_dials(&peer_id, Ok(()));
            }
            SwarmEvent::OutgoingConnectionError {
                peer_id: Some(peer_id),
                error,
                ..
            } => {
                if !self.swarm.is_connected(&peer_id) {
                    self.resolve_dials(&peer_id, Err(error.to_string()));
                }
            }
            SwarmEvent::ConnectionClosed { peer_id, cause, .. } => {
                debug!(%peer_id, ?cause, "connection closed");
            }
            SwarmEvent::NewListenAddr { address, .. } => {
                debug!(%address, "new listen address");
            }
            SwarmEvent::ExpiredListenAddr { address, .. } => {
                debug!(%address, "listen address expired");
            }
            SwarmEvent::Behaviour(HostBehaviourEvent::Identify(identify::Event::Received {
                peer_id,
                info,
                ..
            })) => self.on_identify(peer_id, info),
            SwarmEvent::Behaviour(HostBehaviourEvent::Kademlia(kad::Event::RoutingUpdated {
                peer,
                is_new_peer,
                ..
            })) => {
                if is_new_peer {
                    debug!(%peer, "dht routing table updated");
                }
            }
            SwarmEvent::Behaviour(HostBehaviourEvent::Kademlia(
                kad::Event::OutboundQueryProgressed {
                    result: kad::QueryResult::Bootstrap(result),
                    ..
                },
            )) => match result {
                Ok(ok) => debug!(peer = %ok.peer, remaining = ok.num_remaining, "dht bootstrap progressed"),
                Err(e) => warn!(error = %e, "dht bootstrap failed"),
            },
            _ => {}
        }
    }

    fn on_identify(&mut self, peer_id: PeerId, info: identify::Info) {
        if !self.dht_attached || !info.protocols.contains(&KAD_PROTOCOL) {
            return;
        }

        let kademlia = &mut self.swarm.behaviour_mut().kademlia;
        for addr in info.listen_addrs {
            kademlia.add_address(&peer_id, addr);
        }
    }
}
