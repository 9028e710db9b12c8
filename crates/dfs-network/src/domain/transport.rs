//! Transport composition
//!
//! QUIC is the mandatory transport and always comes first; it is the
//! encrypted datagram transport with TLS 1.3 built in. TCP (Noise + Yamux)
//! is the secondary stream transport and is switchable from configuration.

use std::fmt;

use libp2p::multiaddr::Protocol;
use libp2p::Multiaddr;

use super::addresses::ListenAddressSet;
use super::config::TransportConfig;
use super::errors::{NetworkError, NetworkResult};

/// A transport implementation a host can mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportKind {
    /// QUIC v1 over UDP, TLS 1.3 encrypted
    Quic,
    /// TCP upgraded with Noise and Yamux
    Tcp,
}

impl TransportKind {
    /// Whether this transport can listen on / dial `addr`.
    pub fn serves(&self, addr: &Multiaddr) -> bool {
        match self {
            Self::Quic => addr.iter().any(|p| matches!(p, Protocol::QuicV1)),
            Self::Tcp => {
                addr.iter().any(|p| matches!(p, Protocol::Tcp(_)))
                    && !addr.iter().any(|p| {
                        matches!(p, Protocol::Ws(_) | Protocol::Wss(_) | Protocol::Tls)
                    })
            }
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Quic => write!(f, "quic-v1"),
            Self::Tcp => write!(f, "tcp"),
        }
    }
}

/// Ordered set of transports mounted on a host, highest priority first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportSet {
    kinds: Vec<TransportKind>,
}

impl TransportSet {
    /// Compose the transport set from configuration.
    pub fn compose(config: &TransportConfig) -> Self {
        let mut kinds = vec![TransportKind::Quic];
        if config.tcp {
            kinds.push(TransportKind::Tcp);
        }
        Self { kinds }
    }

    pub fn contains(&self, kind: TransportKind) -> bool {
        self.kinds.contains(&kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = TransportKind> + '_ {
        self.kinds.iter().copied()
    }

    /// Check that every listen address is served by a mounted transport.
    pub fn check_listen_addrs(&self, addrs: &ListenAddressSet) -> NetworkResult<()> {
        for addr in addrs.iter() {
            if !self.kinds.iter().any(|kind| kind.serves(addr)) {
                return Err(NetworkError::Transport {
                    reason: format!(
                        "no mounted transport ({}) can listen on {addr}",
                        self.describe()
                    ),
                });
            }
        }
        Ok(())
    }

    fn describe(&self) -> String {
        self.kinds
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addrs(list: &[&str]) -> ListenAddressSet {
        ListenAddressSet::parse(list.iter().copied()).unwrap()
    }

    #[test]
    fn test_quic_is_always_first() {
        let set = TransportSet::compose(&TransportConfig { tcp: true });
        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            vec![TransportKind::Quic, TransportKind::Tcp]
        );

        let quic_only = TransportSet::compose(&TransportConfig { tcp: false });
        assert_eq!(quic_only.iter().collect::<Vec<_>>(), vec![TransportKind::Quic]);
    }

    #[test]
    fn test_tcp_listen_addr_requires_tcp_transport() {
        let listen = addrs(&["/ip4/127.0.0.1/tcp/4001"]);

        let with_tcp = TransportSet::compose(&TransportConfig { tcp: true });
        assert!(with_tcp.check_listen_addrs(&listen).is_ok());

        let quic_only = TransportSet::compose(&TransportConfig { tcp: false });
        let err = quic_only.check_listen_addrs(&listen).unwrap_err();
        assert!(matches!(err, NetworkError::Transport { .. }));
        assert!(err.to_string().contains("/ip4/127.0.0.1/tcp/4001"));
    }

    #[test]
    fn test_plain_udp_is_not_served() {
        let listen = addrs(&["/ip4/127.0.0.1/udp/4001"]);
        let set = TransportSet::compose(&TransportConfig::default());
        assert!(set.check_listen_addrs(&listen).is_err());
    }

    #[test]
    fn test_quic_serves_default_listen_addrs() {
        let set = TransportSet::compose(&TransportConfig { tcp: false });
        assert!(set.check_listen_addrs(&ListenAddressSet::defaults()).is_ok());
    }
}
