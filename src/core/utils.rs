/*-------------------------------------------------------------------------------------------------
  Utilities
-------------------------------------------------------------------------------------------------*/

/*--------------------------------------------------------------------------------------
  IP Network Supplemental Functions
--------------------------------------------------------------------------------------*/

pub mod ipnetwork {
    use ipnetwork::{IpNetwork, Ipv4Network, Ipv6Network};
    use std::net::{Ipv4Addr, Ipv6Addr};

    /*
        The IpNetwork type keeps any host bits present in the parsed CIDR
        string (`10.0.0.1/8` stays `10.0.0.1/8`). The prefix set arithmetic
        works on integer address intervals, so these helpers convert a network
        to its first and last address (host bits cleared and set) and convert
        an aligned interval start back into an IpNetwork.
    */

    pub const IPV4_BITS: u8 = 32;
    pub const IPV6_BITS: u8 = 128;

    /// Mask with every bit of a `bits`-wide address space set.
    pub fn address_mask(bits: u8) -> u128 {
        if bits >= 128 {
            u128::MAX
        } else {
            (1u128 << bits) - 1
        }
    }

    /// Mask with the `prefix` most significant bits set, in a `bits`-wide space.
    pub fn network_mask(prefix: u8, bits: u8) -> u128 {
        let full = address_mask(bits);
        match bits - prefix {
            0 => full,
            host_bits if host_bits >= 128 => 0,
            host_bits => full & !((1u128 << host_bits) - 1),
        }
    }

    /// First and last address covered by the network, as integers.
    pub fn bounds(ip_network: &IpNetwork) -> (u128, u128) {
        let (address, prefix, bits) = match ip_network {
            IpNetwork::V4(ipv4_network) => (
                u32::from(ipv4_network.ip()) as u128,
                ipv4_network.prefix(),
                IPV4_BITS,
            ),
            IpNetwork::V6(ipv6_network) => (
                u128::from(ipv6_network.ip()),
                ipv6_network.prefix(),
                IPV6_BITS,
            ),
        };
        let mask = network_mask(prefix, bits);
        let host_mask = address_mask(bits) & !mask;
        (address & mask, (address & mask) | host_mask)
    }

    /// Build an IPv4 or IPv6 network from an integer start address and prefix length.
    pub fn from_bounds(start: u128, prefix: u8, bits: u8) -> Option<IpNetwork> {
        match bits {
            IPV4_BITS => {
                let address = Ipv4Addr::from(u32::try_from(start).ok()?);
                Ipv4Network::new(address, prefix).ok().map(IpNetwork::V4)
            }
            IPV6_BITS => {
                let address = Ipv6Addr::from(start);
                Ipv6Network::new(address, prefix).ok().map(IpNetwork::V6)
            }
            _ => None,
        }
    }

    /// Render a network in canonical form (host bits cleared).
    pub fn canonical(ip_network: &IpNetwork) -> IpNetwork {
        let (start, _) = bounds(ip_network);
        let bits = match ip_network {
            IpNetwork::V4(_) => IPV4_BITS,
            IpNetwork::V6(_) => IPV6_BITS,
        };
        from_bounds(start, ip_network.prefix(), bits).unwrap_or(*ip_network)
    }
}

/*-------------------------------------------------------------------------------------------------
  Unit Tests
-------------------------------------------------------------------------------------------------*/
