//! # Node Service
//!
//! Node construction, DHT bootstrapping and routing table supervision,
//! written against the `ports` traits so they run on any network stack.

mod dht;
mod monitor;
mod node;

pub use dht::create_dht;
pub use monitor::{
    observe_routing_table, RoutingObserver, RoutingSnapshot, RoutingTableMonitor, TracingObserver,
};
pub use node::Node;
