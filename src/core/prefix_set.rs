use crate::core::utils::ipnetwork as net;
use ipnet::{Ipv4Subnets, Ipv6Subnets};
use ipnetwork::{IpNetwork, Ipv4Network, Ipv6Network};
use std::net::{Ipv4Addr, Ipv6Addr};

/*-------------------------------------------------------------------------------------------------
  Prefix Set
-------------------------------------------------------------------------------------------------*/

/// A normalized union of IPv4 and IPv6 address ranges.
///
/// Each address family is stored as a sorted list of inclusive integer intervals in which no two
/// intervals overlap or touch. The difference is computed on the intervals; [PrefixSet::cidrs]
/// renders the minimal list of CIDR blocks covering exactly the same addresses.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PrefixSet {
    ipv4: Vec<Interval>,
    ipv6: Vec<Interval>,
}

/// Inclusive `(first, last)` address interval.
type Interval = (u128, u128);

/*--------------------------------------------------------------------------------------
  Prefix Set Implementation
--------------------------------------------------------------------------------------*/

impl PrefixSet {
    /// Build a normalized set from any collection of IPv4 and IPv6 networks. Overlapping and
    /// adjacent networks are merged; host bits in the input networks are ignored.
    pub fn from_networks<'n, I>(networks: I) -> Self
    where
        I: IntoIterator<Item = &'n IpNetwork>,
    {
        let mut ipv4 = Vec::new();
        let mut ipv6 = Vec::new();

        for network in networks {
            match network {
                IpNetwork::V4(_) => ipv4.push(net::bounds(network)),
                IpNetwork::V6(_) => ipv6.push(net::bounds(network)),
            }
        }

        Self {
            ipv4: normalize(ipv4),
            ipv6: normalize(ipv6),
        }
    }

    /*-------------------------------------------------------------------------
      Getters
    -------------------------------------------------------------------------*/

    pub fn is_empty(&self) -> bool {
        self.ipv4.is_empty() && self.ipv6.is_empty()
    }

    /// Number of IPv4 addresses covered by the set.
    pub fn ipv4_address_count(&self) -> u128 {
        address_count(&self.ipv4)
    }

    /// Number of IPv6 addresses covered by the set; saturates at `u128::MAX`.
    pub fn ipv6_address_count(&self) -> u128 {
        address_count(&self.ipv6)
    }

    /// True when every address of `network` is covered by the set.
    pub fn contains(&self, network: &IpNetwork) -> bool {
        let (first, last) = net::bounds(network);
        let intervals = match network {
            IpNetwork::V4(_) => &self.ipv4,
            IpNetwork::V6(_) => &self.ipv6,
        };
        intervals
            .iter()
            .any(|&(start, end)| start <= first && last <= end)
    }

    /*-------------------------------------------------------------------------
      Set Operations
    -------------------------------------------------------------------------*/

    /// Every address covered by `self` and not covered by `other`.
    pub fn difference(&self, other: &PrefixSet) -> PrefixSet {
        PrefixSet {
            ipv4: subtract(&self.ipv4, &other.ipv4),
            ipv6: subtract(&self.ipv6, &other.ipv6),
        }
    }

    /*-------------------------------------------------------------------------
      Aggregation
    -------------------------------------------------------------------------*/

    /// The smallest list of CIDR blocks covering exactly the addresses in the set, ordered by
    /// ascending address with all IPv4 blocks before the IPv6 blocks.
    pub fn cidrs(&self) -> Vec<IpNetwork> {
        self.ipv4
            .iter()
            .flat_map(|&(first, last)| ipv4_cidrs(first, last))
            .chain(
                self.ipv6
                    .iter()
                    .flat_map(|&(first, last)| ipv6_cidrs(first, last)),
            )
            .collect()
    }
}

/*-------------------------------------------------------------------------------------------------
  Interval Arithmetic
-------------------------------------------------------------------------------------------------*/

/// Sort intervals and merge the ones that overlap or touch.
fn normalize(mut intervals: Vec<Interval>) -> Vec<Interval> {
    intervals.sort_unstable();

    let mut merged: Vec<Interval> = Vec::with_capacity(intervals.len());
    for (first, last) in intervals {
        match merged.last_mut() {
            // `checked_add` fails only when the previous interval already ends at the top of
            // the address space, in which case it covers this one too.
            Some((_, end)) if end.checked_add(1).map_or(true, |next| first <= next) => {
                *end = (*end).max(last);
            }
            _ => merged.push((first, last)),
        }
    }
    merged
}

/// Remove the `excluded` intervals from the `included` intervals. Both inputs are normalized.
fn subtract(included: &[Interval], excluded: &[Interval]) -> Vec<Interval> {
    let mut remaining = Vec::new();
    let mut index = 0;

    for &(first, last) in included {
        // Exclusions ending before this interval cannot affect it or any later one
        while index < excluded.len() && excluded[index].1 < first {
            index += 1;
        }

        let mut cursor = first;
        let mut covered = false;
        for &(start, end) in &excluded[index..] {
            if start > last {
                break;
            }
            if start > cursor {
                remaining.push((cursor, start - 1));
            }
            if end >= last {
                covered = true;
                break;
            }
            cursor = cursor.max(end + 1);
        }

        if !covered {
            remaining.push((cursor, last));
        }
    }

    remaining
}

/*-------------------------------------------------------------------------------------------------
  Aggregation
-------------------------------------------------------------------------------------------------*/

/// Fewest CIDR-aligned IPv4 blocks covering an inclusive interval.
fn ipv4_cidrs(first: u128, last: u128) -> Vec<IpNetwork> {
    let (Ok(first), Ok(last)) = (u32::try_from(first), u32::try_from(last)) else {
        return Vec::new();
    };

    Ipv4Subnets::new(Ipv4Addr::from(first), Ipv4Addr::from(last), 0)
        .filter_map(|subnet| Ipv4Network::new(subnet.network(), subnet.prefix_len()).ok())
        .map(IpNetwork::V4)
        .collect()
}

/// Fewest CIDR-aligned IPv6 blocks covering an inclusive interval.
fn ipv6_cidrs(first: u128, last: u128) -> Vec<IpNetwork> {
    Ipv6Subnets::new(Ipv6Addr::from(first), Ipv6Addr::from(last), 0)
        .filter_map(|subnet| Ipv6Network::new(subnet.network(), subnet.prefix_len()).ok())
        .map(IpNetwork::V6)
        .collect()
}

/// Total number of addresses in a list of disjoint intervals.
fn address_count(intervals: &[Interval]) -> u128 {
    intervals.iter().fold(0u128, |total, &(first, last)| {
        total.saturating_add((last - first).saturating_add(1))
    })
}

/*-------------------------------------------------------------------------------------------------
  Unit Tests
-------------------------------------------------------------------------------------------------*/
