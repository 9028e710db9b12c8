use std::net::{IpAddr, Ipv4Addr};

/// First port of a sharding; node `i` listens on `base_port + i`.
pub const DEFAULT_BASE_PORT: u16 = 4000;

/// Listen on every interface by default.
pub const DEFAULT_LISTEN_IP: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);

/// Where the nodes of a sharding listen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardingConfig {
    pub listen_ip: IpAddr,
    pub base_port: u16,
    /// Mount TCP next to QUIC on every node
    pub tcp: bool,
}

impl Default for ShardingConfig {
    fn default() -> Self {
        Self {
            listen_ip: DEFAULT_LISTEN_IP,
            base_port: DEFAULT_BASE_PORT,
            tcp: true,
        }
    }
}

impl ShardingConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_listen_ip(mut self, ip: IpAddr) -> Self {
        self.listen_ip = ip;
        self
    }

    #[must_use]
    pub fn with_base_port(mut self, port: u16) -> Self {
        self.base_port = port;
        self
    }

    #[must_use]
    pub fn with_tcp(mut self, enabled: bool) -> Self {
        self.tcp = enabled;
        self
    }

    /// QUIC listen address of node `index`, `None` if the port overflows.
    pub fn listen_addr(&self, index: usize) -> Option<String> {
        let offset = u16::try_from(index).ok()?;
        let port = self.base_port.checked_add(offset)?;
        let ip = match self.listen_ip {
            IpAddr::V4(ip) => format!("/ip4/{ip}"),
            IpAddr::V6(ip) => format!("/ip6/{ip}"),
        };
        Some(format!("{ip}/udp/{port}/quic-v1"))
    }
}
