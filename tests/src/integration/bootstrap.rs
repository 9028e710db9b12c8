//! # Config-driven bootstrap
//!
//! A node whose `libp2p.dht.boostrap` names a running seed ends up in the
//! seed's routing table and vice versa, over QUIC and over TCP.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use dfs_network::{Host, NetworkConfig, NetworkError, Node, NodeIdentity};

    use crate::{bootstrap_entries, eventually, has_route, init_tracing};

    const CONVERGE: Duration = Duration::from_secs(15);

    fn seed_config(listen: &str) -> NetworkConfig {
        NetworkConfig::new()
            .with_listen([listen])
            .with_require_bootstrap_peers(false)
    }

    #[tokio::test]
    async fn test_quic_bootstrap_fills_both_tables() {
        init_tracing();
        let seed = Node::new(&seed_config("/ip4/127.0.0.1/udp/0/quic-v1"))
            .await
            .unwrap();

        let config = NetworkConfig::new()
            .with_listen(["/ip4/127.0.0.1/udp/0/quic-v1"])
            .with_bootstrap(bootstrap_entries(&seed).await);
        let node = Node::new(&config).await.unwrap();

        assert!(eventually(CONVERGE, || has_route(&node, seed.peer_id())).await);
        assert!(eventually(CONVERGE, || has_route(&seed, node.peer_id())).await);
        assert!(node.host().is_connected(&seed.peer_id()).await.unwrap());
    }

    #[tokio::test]
    async fn test_tcp_bootstrap_fills_both_tables() {
        init_tracing();
        let seed = Node::new(&seed_config("/ip4/127.0.0.1/tcp/0")).await.unwrap();

        let config = NetworkConfig::new()
            .with_listen(["/ip4/127.0.0.1/tcp/0"])
            .with_bootstrap(bootstrap_entries(&seed).await);
        let node = Node::new(&config).await.unwrap();

        assert!(eventually(CONVERGE, || has_route(&node, seed.peer_id())).await);
        assert!(eventually(CONVERGE, || has_route(&seed, node.peer_id())).await);
    }

    #[tokio::test]
    async fn test_configured_key_survives_restart() {
        init_tracing();
        let key = NodeIdentity::generate().encode().unwrap();
        let config = seed_config("/ip4/127.0.0.1/udp/0/quic-v1").with_key(key);

        let first = Node::new(&config).await.unwrap().peer_id();
        let second = Node::new(&config).await.unwrap().peer_id();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_missing_seed_is_fatal_by_default() {
        init_tracing();
        let config = NetworkConfig::new().with_listen(["/ip4/127.0.0.1/udp/0/quic-v1"]);

        let err = Node::new(&config).await.unwrap_err();
        assert_eq!(err, NetworkError::DhtBootstrap);
    }

    #[tokio::test]
    async fn test_config_file_round_trip() {
        use std::io::Write;

        init_tracing();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
            [libp2p]
            listen = ["/ip4/127.0.0.1/udp/0/quic-v1"]

            [libp2p.transports]
            tcp = false

            [libp2p.dht]
            require_bootstrap_peers = false
            "#
        )
        .unwrap();

        let config = NetworkConfig::load(file.path()).unwrap();
        let node = Node::new(&config).await.unwrap();

        let addrs = node.host().addrs().await.unwrap();
        assert_eq!(addrs.len(), 1);
        assert!(addrs[0].to_string().starts_with("/ip4/127.0.0.1/udp/"));
    }
}
