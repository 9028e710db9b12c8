//! # Sharding over libp2p
//!
//! Members dial the anchor over QUIC; identify and Kademlia then put every
//! member into the anchor's routing table.

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};
    use std::time::Duration;

    use dfs_network::{Host, Libp2pStack};
    use dfs_network_mock::{
        create_sharding, Sharding, ShardingConfig, ShardingError, DEFAULT_BASE_PORT,
    };

    use crate::{eventually, has_route, init_tracing};

    const CONVERGE: Duration = Duration::from_secs(15);

    fn loopback(base_port: u16) -> ShardingConfig {
        ShardingConfig::new()
            .with_listen_ip(IpAddr::V4(Ipv4Addr::LOCALHOST))
            .with_base_port(base_port)
            .with_tcp(false)
    }

    #[tokio::test]
    async fn test_three_node_sharding_converges_on_anchor() {
        init_tracing();
        let sharding = Sharding::create("X", 3, &Libp2pStack::new(), &loopback(24100))
            .await
            .unwrap();
        assert_eq!(sharding.len(), 3);

        let anchor = sharding.anchor();
        for node in &sharding.nodes()[1..] {
            assert!(node.host().is_connected(&anchor.peer_id()).await.unwrap());
            assert!(eventually(CONVERGE, || has_route(node, anchor.peer_id())).await);
            assert!(eventually(CONVERGE, || has_route(anchor, node.peer_id())).await);
        }
    }

    #[tokio::test]
    async fn test_default_sharding_wires_members_to_anchor() {
        init_tracing();
        let sharding = create_sharding("default", 3).await.unwrap();
        assert_eq!(sharding.name(), "default");
        assert_eq!(sharding.len(), 3);

        let anchor = sharding.anchor();
        let first = anchor.listen_addrs().as_slice()[0].to_string();
        assert_eq!(first, format!("/ip4/0.0.0.0/udp/{DEFAULT_BASE_PORT}/quic-v1"));

        for node in &sharding.nodes()[1..] {
            assert!(node.host().is_connected(&anchor.peer_id()).await.unwrap());
        }
    }

    #[tokio::test]
    async fn test_size_one_is_rejected() {
        let err = Sharding::create("X", 1, &Libp2pStack::new(), &loopback(24200))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, ShardingError::InvalidSize { .. }));
    }
}
