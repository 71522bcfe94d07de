//! CIDR block parsing and containment math.
//!
//! Blocks are kept in canonical network form (host bits cleared), so two
//! literals that name the same range compare and print identically.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use crate::error::TopologyError;

/// The catch-all IPv4 block, treated as a wildcard by the reachability graph
pub const SENTINEL_CIDR: &str = "0.0.0.0/0";

/// A network address range plus prefix length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cidr {
    network: IpAddr,
    prefix: u8,
}

impl Cidr {
    /// Build a block from any address inside it, clearing the host bits
    pub fn new(addr: IpAddr, prefix: u8) -> Result<Self, TopologyError> {
        let max = max_prefix(&addr);
        if prefix > max {
            return Err(TopologyError::InvalidCidr {
                value: format!("{}/{}", addr, prefix),
                reason: format!("prefix length must be at most {}", max),
            });
        }
        Ok(Self {
            network: mask(addr, prefix),
            prefix,
        })
    }

    /// The `0.0.0.0/0` block
    pub fn sentinel() -> Self {
        Self {
            network: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            prefix: 0,
        }
    }

    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    /// True for the `0.0.0.0/0` wildcard block
    pub fn is_sentinel(&self) -> bool {
        self.prefix == 0 && self.network == IpAddr::V4(Ipv4Addr::UNSPECIFIED)
    }

    /// Check whether an address falls inside this block
    pub fn contains_addr(&self, addr: IpAddr) -> bool {
        if max_prefix(&addr) != max_prefix(&self.network) {
            return false;
        }
        mask(addr, self.prefix) == self.network
    }

    /// Check whether the entire range of `other` lies inside this block.
    ///
    /// A /16 contains each of its /24s, but a /25 never contains a /24 even
    /// when the two share a network address.
    pub fn contains(&self, other: &Cidr) -> bool {
        self.prefix <= other.prefix && self.contains_addr(other.network)
    }
}

impl FromStr for Cidr {
    type Err = TopologyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| TopologyError::InvalidCidr {
            value: s.to_string(),
            reason: reason.to_string(),
        };

        let (addr, prefix) = s
            .trim()
            .split_once('/')
            .ok_or_else(|| invalid("missing '/' prefix length"))?;
        let addr: IpAddr = addr.parse().map_err(|_| invalid("invalid IP address"))?;
        let prefix: u8 = prefix.parse().map_err(|_| invalid("invalid prefix length"))?;

        Cidr::new(addr, prefix).map_err(|_| invalid("prefix length out of range"))
    }
}

impl fmt::Display for Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix)
    }
}

fn max_prefix(addr: &IpAddr) -> u8 {
    match addr {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => 128,
    }
}

fn mask(addr: IpAddr, prefix: u8) -> IpAddr {
    match addr {
        IpAddr::V4(v4) => {
            let bits = u32::from(v4);
            let masked = if prefix == 0 { 0 } else { bits & (u32::MAX << (32 - u32::from(prefix))) };
            IpAddr::V4(Ipv4Addr::from(masked))
        }
        IpAddr::V6(v6) => {
            let bits = u128::from(v6);
            let masked = if prefix == 0 { 0 } else { bits & (u128::MAX << (128 - u32::from(prefix))) };
            IpAddr::V6(Ipv6Addr::from(masked))
        }
    }
}
