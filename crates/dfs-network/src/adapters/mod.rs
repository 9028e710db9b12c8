//! # Adapters
//!
//! Network stack implementations and configuration loading.
//!
//! - [`libp2p`]: production stack (QUIC, TCP + Noise + Yamux, Kademlia)
//! - [`memory`]: in-process stack for tests and simulations

mod config;
pub mod libp2p;
pub mod memory;

pub use self::libp2p::{Libp2pDht, Libp2pHost, Libp2pStack, WeakLibp2pDht};
pub use memory::{MemoryDht, MemoryHost, MemoryStack, WeakMemoryDht};
