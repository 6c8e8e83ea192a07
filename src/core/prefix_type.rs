use ipnetwork::IpNetwork;
use std::net::IpAddr;

/*-------------------------------------------------------------------------------------------------
  Prefix Type
-------------------------------------------------------------------------------------------------*/

/// IP prefix type (address family). IPv4 and IPv6 prefixes never match each other's addresses.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum PrefixType {
    IPv4,
    IPv6,
}

impl PrefixType {
    pub fn is_ipv4(&self) -> bool {
        match self {
            PrefixType::IPv4 => true,
            PrefixType::IPv6 => false,
        }
    }

    pub fn is_ipv6(&self) -> bool {
        match self {
            PrefixType::IPv4 => false,
            PrefixType::IPv6 => true,
        }
    }

    /// Number of bits in an address of this family.
    pub fn bits(&self) -> u8 {
        match self {
            PrefixType::IPv4 => 32,
            PrefixType::IPv6 => 128,
        }
    }

    pub(crate) fn of_network(network: &IpNetwork) -> Self {
        match network {
            IpNetwork::V4(_) => PrefixType::IPv4,
            IpNetwork::V6(_) => PrefixType::IPv6,
        }
    }

    pub(crate) fn of_addr(addr: &IpAddr) -> Self {
        match addr {
            IpAddr::V4(_) => PrefixType::IPv4,
            IpAddr::V6(_) => PrefixType::IPv6,
        }
    }
}

/*-------------------------------------------------------------------------------------------------
  Unit Tests
-------------------------------------------------------------------------------------------------*/
