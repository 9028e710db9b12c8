//! # Routing table monitor over libp2p

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};
    use std::time::Duration;

    use dfs_network::{
        observe_routing_table, Host, Libp2pStack, NetworkConfig, NetworkError, Node, PeerAddr,
        RoutingSnapshot,
    };
    use dfs_network_mock::{Sharding, ShardingConfig};
    use tokio::sync::mpsc;

    use crate::init_tracing;

    fn standalone() -> NetworkConfig {
        NetworkConfig::new()
            .with_listen(["/ip4/127.0.0.1/udp/0/quic-v1"])
            .with_require_bootstrap_peers(false)
    }

    #[tokio::test]
    async fn test_lonely_node_reports_empty_table_and_keeps_ticking() {
        init_tracing();
        let node = Node::new(&standalone()).await.unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel::<RoutingSnapshot>();

        let monitor = observe_routing_table(&node, Duration::from_secs(2), tx).unwrap();

        let first = tokio::time::timeout(Duration::from_secs(3), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(first.peers.is_empty());

        let second = tokio::time::timeout(Duration::from_secs(3), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(second.tick, 2);

        assert!(monitor.stop().await >= 2);
    }

    #[tokio::test]
    async fn test_anchor_monitor_observes_members() {
        init_tracing();
        let config = ShardingConfig::new()
            .with_listen_ip(IpAddr::V4(Ipv4Addr::LOCALHOST))
            .with_base_port(24400)
            .with_tcp(false);
        let sharding = Sharding::create("X", 3, &Libp2pStack::new(), &config)
            .await
            .unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel::<RoutingSnapshot>();

        let monitor =
            observe_routing_table(sharding.anchor(), Duration::from_millis(200), tx).unwrap();

        let peer_ids = sharding.peer_ids();
        let members = &peer_ids[1..];
        let converged = tokio::time::timeout(Duration::from_secs(15), async {
            while let Some(snapshot) = rx.recv().await {
                if members.iter().all(|m| snapshot.peers.contains(m)) {
                    return true;
                }
            }
            false
        })
        .await
        .unwrap_or(false);

        assert!(converged);
        monitor.stop().await;
    }

    #[tokio::test]
    async fn test_dropped_node_stops_listening_while_monitored() {
        init_tracing();
        let node = Node::new(&standalone()).await.unwrap();
        let target = PeerAddr::new(node.peer_id(), node.host().addrs().await.unwrap());
        let (tx, mut rx) = mpsc::unbounded_channel::<RoutingSnapshot>();

        let monitor = observe_routing_table(&node, Duration::from_millis(100), tx).unwrap();
        assert!(rx.recv().await.is_some());
        drop(node);

        // The monitor exits on its own once the host is gone.
        let drained = tokio::time::timeout(Duration::from_secs(5), async {
            while rx.recv().await.is_some() {}
        })
        .await;
        assert!(drained.is_ok());
        monitor.stop().await;
        tokio::time::sleep(Duration::from_millis(500)).await;

        let other = Node::new(&standalone()).await.unwrap();
        let err = other.host().connect(&target).await.unwrap_err();
        assert!(matches!(err, NetworkError::PeerConnect { .. }));
    }
}
