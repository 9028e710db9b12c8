use dfs_network::NetworkError;
use thiserror::Error;

/// Errors raised while building a sharding.
#[derive(Debug, Error)]
pub enum ShardingError {
    /// Requested group is smaller than the minimum
    #[error("sharding size {size} is below the minimum of {min}")]
    InvalidSize { size: usize, min: usize },

    /// A node of the group could not be constructed
    #[error("create sharding node {index} error: {source}")]
    Node {
        index: usize,
        #[source]
        source: NetworkError,
    },

    /// A node could not connect to the anchor
    #[error("connect sharding node {index} to anchor error: {source}")]
    PeerConnect {
        index: usize,
        #[source]
        source: NetworkError,
    },
}

pub type ShardingResult<T> = Result<T, ShardingError>;
