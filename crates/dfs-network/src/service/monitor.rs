//! Routing table monitor
//!
//! Polls a DHT's routing table on a fixed interval and hands every snapshot
//! to a [`RoutingObserver`]. One tokio task per monitor; polls of one
//! monitor never overlap.
//!
//! The task holds only a weak DHT handle between polls. It ends on its own
//! once the observed host has shut down or the observer reports it is
//! closed.

use std::time::Duration;

use libp2p::PeerId;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::node::Node;
use crate::domain::{NetworkError, NetworkResult};
use crate::ports::{Dht, Host, NetworkStack, WeakDht};

/// Peers in a node's routing table at one poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingSnapshot {
    /// Node whose table was read
    pub node: PeerId,
    pub peers: Vec<PeerId>,
    /// 1-based poll counter
    pub tick: u64,
}

/// Receives routing table snapshots from a monitor.
pub trait RoutingObserver: Send + 'static {
    fn on_snapshot(&mut self, snapshot: RoutingSnapshot);

    /// Called when a poll fails. The monitor keeps running.
    fn on_poll_error(&mut self, node: PeerId, error: &NetworkError) {
        warn!(%node, %error, "list dht peer failed");
    }

    /// Whether the observer no longer accepts snapshots. Checked after every
    /// poll; `true` ends the monitor.
    fn is_closed(&self) -> bool {
        false
    }
}

/// Logs every snapshot at INFO.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl RoutingObserver for TracingObserver {
    fn on_snapshot(&mut self, snapshot: RoutingSnapshot) {
        info!(node = %snapshot.node, tick = snapshot.tick, "list dht peer");
        for peer in &snapshot.peers {
            info!(node = %snapshot.node, %peer, "find peer");
        }
        info!(
            node = %snapshot.node,
            peers = snapshot.peers.len(),
            "list dht peer -- complete"
        );
    }
}

/// Closed once the receiving half is dropped.
impl RoutingObserver for mpsc::UnboundedSender<RoutingSnapshot> {
    fn on_snapshot(&mut self, snapshot: RoutingSnapshot) {
        let _ = self.send(snapshot);
    }

    fn is_closed(&self) -> bool {
        mpsc::UnboundedSender::is_closed(self)
    }
}

/// Handle to a running monitor task.
///
/// Dropping the handle also stops the task.
#[derive(Debug)]
pub struct RoutingTableMonitor {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<u64>,
}

impl RoutingTableMonitor {
    /// Spawn a monitor over `dht` on the current tokio runtime.
    ///
    /// The first poll happens immediately. The monitor keeps a weak handle
    /// only, so it never keeps the host running.
    pub fn spawn<D, O>(dht: &D, interval: Duration, mut observer: O) -> NetworkResult<Self>
    where
        D: Dht,
        O: RoutingObserver,
    {
        if interval.is_zero() {
            return Err(NetworkError::InvalidInterval);
        }

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let node = dht.host().id();
        let weak = dht.downgrade();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut ticks = 0u64;

            loop {
                tokio::select! {
                    biased;

                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        let Some(dht) = weak.upgrade() else {
                            debug!(%node, "observed host is gone");
                            break;
                        };
                        ticks += 1;
                        let result = dht.routing_table_peers().await;
                        drop(dht);

                        match result {
                            Ok(peers) => observer.on_snapshot(RoutingSnapshot {
                                node,
                                peers,
                                tick: ticks,
                            }),
                            Err(e) => observer.on_poll_error(node, &e),
                        }
                        if observer.is_closed() {
                            debug!(%node, "routing observer closed");
                            break;
                        }
                    }
                }
            }

            debug!(%node, ticks, "routing table monitor stopped");
            ticks
        });

        Ok(Self { shutdown_tx, task })
    }

    /// Stop the monitor and return the number of polls it made.
    pub async fn stop(self) -> u64 {
        let _ = self.shutdown_tx.send(true);
        match self.task.await {
            Ok(ticks) => ticks,
            Err(e) => {
                warn!(error = %e, "routing table monitor task failed");
                0
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Start observing `node`'s routing table every `interval`.
///
/// Dropping `node` shuts its host down as usual; the monitor then ends
/// at its next tick.
///
/// # Errors
///
/// `InvalidInterval` for a zero interval.
pub fn observe_routing_table<S, O>(
    node: &Node<S>,
    interval: Duration,
    observer: O,
) -> NetworkResult<RoutingTableMonitor>
where
    S: NetworkStack,
    O: RoutingObserver,
{
    RoutingTableMonitor::spawn(node.dht(), interval, observer)
}
