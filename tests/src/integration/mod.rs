//! # Integration Tests
//!
//! Every test here binds real sockets on 127.0.0.1. Fixed-port tests use
//! disjoint port ranges so they can run in parallel.

pub mod bootstrap;
pub mod monitor;
pub mod sharding;
