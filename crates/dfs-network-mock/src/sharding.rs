use dfs_network::{
    Dht, Host, Libp2pStack, NetworkConfig, NetworkError, NetworkStack, Node, PeerAddr, PeerId,
};
use tracing::{debug, info};

use crate::config::ShardingConfig;
use crate::error::{ShardingError, ShardingResult};

/// Smallest group that has an anchor and at least one member.
pub const MIN_SHARDING_SIZE: usize = 2;

/// A fixed group of nodes wired to an anchor (node 0).
pub struct Sharding<S: NetworkStack = Libp2pStack> {
    name: String,
    nodes: Vec<Node<S>>,
}

/// Build a sharding of `size` libp2p nodes with the default [`ShardingConfig`].
pub async fn create_sharding(name: &str, size: usize) -> ShardingResult<Sharding> {
    Sharding::create(name, size, &Libp2pStack::new(), &ShardingConfig::default()).await
}

impl<S: NetworkStack> Sharding<S> {
    /// Build `size` nodes on `stack` and connect nodes `1..size` to node 0.
    ///
    /// Nodes are built one after another. On the first failure every node
    /// built so far is dropped.
    pub async fn create(
        name: &str,
        size: usize,
        stack: &S,
        config: &ShardingConfig,
    ) -> ShardingResult<Self> {
        if size < MIN_SHARDING_SIZE {
            return Err(ShardingError::InvalidSize {
                size,
                min: MIN_SHARDING_SIZE,
            });
        }

        let mut nodes = Vec::with_capacity(size);
        for index in 0..size {
            let node_config = node_config(config, index)
                .map_err(|source| ShardingError::Node { index, source })?;
            let node = Node::with_stack(stack, &node_config)
                .await
                .map_err(|source| ShardingError::Node { index, source })?;

            debug!(sharding = name, index, peer_id = %node.peer_id(), "sharding node created");
            nodes.push(node);
        }

        let anchor = &nodes[0];
        let anchor_addr = PeerAddr::new(
            anchor.peer_id(),
            anchor
                .host()
                .addrs()
                .await
                .map_err(|source| ShardingError::PeerConnect { index: 0, source })?,
        );

        for (index, node) in nodes.iter().enumerate().skip(1) {
            node.dht()
                .host()
                .connect(&anchor_addr)
                .await
                .map_err(|source| ShardingError::PeerConnect { index, source })?;
        }

        info!(sharding = name, size, anchor = %anchor_addr.peer_id, "sharding created");

        Ok(Self {
            name: name.to_string(),
            nodes,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn nodes(&self) -> &[Node<S>] {
        &self.nodes
    }

    /// Node 0.
    pub fn anchor(&self) -> &Node<S> {
        &self.nodes[0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false; a sharding holds at least [`MIN_SHARDING_SIZE`] nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn peer_ids(&self) -> Vec<PeerId> {
        self.nodes.iter().map(|node| node.peer_id()).collect()
    }
}

/// Standalone node config for member `index`: fresh key, one QUIC listener,
/// no seed peers.
fn node_config(config: &ShardingConfig, index: usize) -> Result<NetworkConfig, NetworkError> {
    let listen = config
        .listen_addr(index)
        .ok_or_else(|| NetworkError::Config {
            key: "libp2p.listen".to_string(),
            reason: format!("port {} + {index} is out of range", config.base_port),
        })?;

    Ok(NetworkConfig::new()
        .with_listen([listen])
        .with_tcp(config.tcp)
        .with_require_bootstrap_peers(false))
}
