//! # Ports Layer - Hexagonal Architecture Boundaries
//!
//! The node core never talks to libp2p directly. Host and DHT construction
//! go through the driven ports defined here; `adapters` provides a libp2p
//! implementation and an in-memory one for tests.

pub mod outbound;

pub use outbound::{Dht, DhtOptions, Host, HostOptions, NetworkStack, WeakDht};
