//! # DFS Network Mock
//!
//! Builds local clusters ("shardings") of DFS network nodes for tests and
//! simulations. Node 0 of a sharding is the anchor; every other node holds a
//! direct connection to it, so the anchor's DHT learns the whole group.
//!
//! ```rust,no_run
//! # async fn run() -> Result<(), dfs_network_mock::ShardingError> {
//! let sharding = dfs_network_mock::create_sharding("local", 3).await?;
//! assert_eq!(sharding.len(), 3);
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod sharding;

pub use config::{ShardingConfig, DEFAULT_BASE_PORT, DEFAULT_LISTEN_IP};
pub use error::{ShardingError, ShardingResult};
pub use sharding::{create_sharding, Sharding, MIN_SHARDING_SIZE};
