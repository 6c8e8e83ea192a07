use std::collections::BTreeSet;
use std::sync::Arc;

/*-------------------------------------------------------------------------------------------------
  Utilities
-------------------------------------------------------------------------------------------------*/

/*--------------------------------------------------------------------------------------
  Work with Reference Counted String Slices
--------------------------------------------------------------------------------------*/

pub fn get_arc_str_from_set(value: &str, set: &BTreeSet<Arc<str>>) -> Option<Arc<str>> {
    set.get(value).map(Arc::clone)
}

/// Return the shared copy of `value` from the set, inserting it first when missing.
pub fn intern_arc_str(value: &str, set: &mut BTreeSet<Arc<str>>) -> Arc<str> {
    if let Some(existing) = get_arc_str_from_set(value, set) {
        return existing;
    }
    let interned: Arc<str> = Arc::from(value);
    set.insert(Arc::clone(&interned));
    interned
}

/*--------------------------------------------------------------------------------------
  IP Network Supplemental Functions
--------------------------------------------------------------------------------------*/

pub mod ipnetwork {
    use crate::core::errors::PrefixError;
    use ipnetwork::{IpNetwork, Ipv4Network, Ipv6Network};
    use std::net::IpAddr;

    /*
        The IpNetwork type does not reduce (or provide a method to reduce) an
        interface CIDR prefix to a network prefix (where all host bits are set to
        `0`). It does provide a network() method that will extract the network IP.

        `network_prefix` builds the canonical network prefix from an IpNetwork.
        The prefix length is copied from a valid network, so the constructors
        cannot fail; the original value is kept if they ever do.
    */

    pub fn network_prefix(ip_network: &IpNetwork) -> IpNetwork {
        match ip_network {
            IpNetwork::V4(ipv4_network) => {
                Ipv4Network::new(ipv4_network.network(), ipv4_network.prefix())
                    .map(IpNetwork::V4)
                    .unwrap_or(*ip_network)
            }
            IpNetwork::V6(ipv6_network) => {
                Ipv6Network::new(ipv6_network.network(), ipv6_network.prefix())
                    .map(IpNetwork::V6)
                    .unwrap_or(*ip_network)
            }
        }
    }

    /// Parse a textual CIDR literal (`a.b.c.d/n` or `h:h::/n`) into a canonical network
    /// prefix. Host bits are masked off; a literal without a prefix length, or with a signed or
    /// zero-padded one (`/+8`, `/08`), is rejected.
    pub fn parse_cidr(text: &str) -> Result<IpNetwork, PrefixError> {
        let trimmed = text.trim();
        let Some((_, length)) = trimmed.split_once('/') else {
            return Err(PrefixError::MalformedPrefix(text.to_string()));
        };

        // Prefix lengths are plain decimal without sign or leading zeros
        let canonical_length = !length.is_empty()
            && length.bytes().all(|byte| byte.is_ascii_digit())
            && (length == "0" || !length.starts_with('0'));
        if !canonical_length {
            return Err(PrefixError::MalformedPrefix(text.to_string()));
        }

        trimmed
            .parse::<IpNetwork>()
            .map(|ip_network| network_prefix(&ip_network))
            .map_err(|_| PrefixError::MalformedPrefix(text.to_string()))
    }

    /*
        Trie keys are the address bits left-aligned in a u128, so bit 0 is the
        most significant bit for both IPv4 and IPv6.
    */

    pub fn addr_bits(addr: &IpAddr) -> u128 {
        match addr {
            IpAddr::V4(ipv4_addr) => (u32::from(*ipv4_addr) as u128) << 96,
            IpAddr::V6(ipv6_addr) => u128::from(*ipv6_addr),
        }
    }

    pub fn network_bits(ip_network: &IpNetwork) -> u128 {
        addr_bits(&ip_network.network())
    }

    pub fn bit_at(bits: u128, index: u8) -> usize {
        ((bits >> (127 - index as u32)) & 1) as usize
    }

    /*
        The Ipv4Network and Ipv6Network types implement an is_supernet_of() method;
        however, the IpNetwork type does not.

        This helper function implements the is_supernet_of() functionality to
        compare two IpNetwork objects. Networks of different families are never
        supernets of each other.
    */

    #[cfg(test)]
    pub(crate) fn is_supernet_of(supernet: IpNetwork, subnet: IpNetwork) -> bool {
        match (supernet, subnet) {
            (IpNetwork::V4(ipv4_supernet), IpNetwork::V4(ipv4_subnet)) => {
                ipv4_supernet.is_supernet_of(ipv4_subnet)
            }
            (IpNetwork::V6(ipv6_supernet), IpNetwork::V6(ipv6_subnet)) => {
                ipv6_supernet.is_supernet_of(ipv6_subnet)
            }
            _ => false,
        }
    }
}

/*-------------------------------------------------------------------------------------------------
  Unit Tests
-------------------------------------------------------------------------------------------------*/

#[cfg(test)]
mod tests {
    use super::ipnetwork::*;
    use super::*;
    use crate::core::errors::PrefixError;
    use ::ipnetwork::IpNetwork;

    #[test]
    fn test_intern_arc_str() {
        let mut set: BTreeSet<Arc<str>> = BTreeSet::new();
        let first = intern_arc_str("api", &mut set);
        let second = intern_arc_str("api", &mut set);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(set.len(), 1);
        assert_eq!(get_arc_str_from_set("api", &set), Some(first));
        assert_eq!(get_arc_str_from_set("git", &set), None);
    }

    #[test]
    fn test_parse_cidr_canonicalizes_host_bits() {
        let prefix = parse_cidr("10.1.2.3/8").unwrap();
        assert_eq!(prefix, "10.0.0.0/8".parse::<IpNetwork>().unwrap());

        let prefix = parse_cidr(" 2001:db8::1/32 ").unwrap();
        assert_eq!(prefix, "2001:db8::/32".parse::<IpNetwork>().unwrap());
    }

    #[test]
    fn test_parse_cidr_rejects_malformed_literals() {
        for literal in [
            "",
            "10.0.0.1",
            "10.0.0.0/33",
            "2001:db8::/129",
            "not-a-prefix/8",
            "/8",
            "10/8",
            "1.2.3/24",
            "10.0.0.0/08",
            "10.0.0.0/+8",
            "10.0.0.0/",
            "2001:db8::/032",
        ] {
            assert_eq!(
                parse_cidr(literal),
                Err(PrefixError::MalformedPrefix(literal.to_string())),
                "{literal:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_cidr_zero_length() {
        assert_eq!(
            parse_cidr("0.0.0.0/0").unwrap(),
            "0.0.0.0/0".parse::<IpNetwork>().unwrap()
        );
        assert_eq!(parse_cidr("::/0").unwrap(), "::/0".parse::<IpNetwork>().unwrap());
    }

    #[test]
    fn test_bits() {
        let ipv4: IpNetwork = "128.0.0.0/1".parse().unwrap();
        assert_eq!(bit_at(network_bits(&ipv4), 0), 1);
        assert_eq!(bit_at(network_bits(&ipv4), 1), 0);

        let ipv6: IpNetwork = "::1/128".parse().unwrap();
        assert_eq!(bit_at(network_bits(&ipv6), 127), 1);
        assert_eq!(bit_at(network_bits(&ipv6), 126), 0);
    }

    #[test]
    fn test_is_supernet_of() {
        let supernet: IpNetwork = "10.0.0.0/8".parse().unwrap();
        let subnet: IpNetwork = "10.1.0.0/16".parse().unwrap();
        let ipv6: IpNetwork = "::a00:0/104".parse().unwrap();

        assert!(is_supernet_of(supernet, subnet));
        assert!(is_supernet_of(supernet, supernet));
        assert!(!is_supernet_of(subnet, supernet));
        assert!(!is_supernet_of(supernet, ipv6));
    }
}
