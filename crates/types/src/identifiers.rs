//! Domain-specific identifier types.

use std::fmt;
use std::net::{IpAddr, Ipv6Addr, SocketAddr};

/// Consensus epoch number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Epoch(pub u64);

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Epoch({})", self.0)
    }
}

/// Cumulative number of leader failures within an epoch.
///
/// Each unit corresponds to exactly one leader skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ViewChangeCounter(pub u32);

impl ViewChangeCounter {
    /// Counter as a committee offset.
    pub fn as_index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ViewChangeCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Network location of a committee member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NetworkAddress(pub SocketAddr);

impl NetworkAddress {
    /// Fixed encoded size: 16 bytes IP (IPv4 mapped into IPv6) + 2 bytes port.
    pub const SIZE: usize = 18;

    /// Create an address from an IP and port.
    pub fn new(ip: IpAddr, port: u16) -> Self {
        Self(SocketAddr::new(ip, port))
    }

    /// Encode to the fixed-width wire form.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let ip = match self.0.ip() {
            IpAddr::V4(v4) => v4.to_ipv6_mapped(),
            IpAddr::V6(v6) => v6,
        };
        let mut out = [0u8; Self::SIZE];
        out[..16].copy_from_slice(&ip.octets());
        out[16..].copy_from_slice(&self.0.port().to_be_bytes());
        out
    }

    /// Decode from the fixed-width wire form.
    ///
    /// IPv4-mapped addresses decode back to IPv4 so that equality with the
    /// locally configured committee holds.
    pub fn from_bytes(bytes: &[u8; Self::SIZE]) -> Self {
        let mut octets = [0u8; 16];
        octets.copy_from_slice(&bytes[..16]);
        let ip = Ipv6Addr::from(octets).to_canonical();
        let port = u16::from_be_bytes([bytes[16], bytes[17]]);
        Self::new(ip, port)
    }
}

impl fmt::Display for NetworkAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
