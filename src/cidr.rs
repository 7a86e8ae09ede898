//! IPv4 address and CIDR block model.

use ipnet::Ipv4Net;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use crate::error::{Error, Result};

/// Number of bits in an IPv4 address.
pub const ADDRESS_BITS: u8 = 32;

/// A canonical IPv4 CIDR block `prefix/size`.
///
/// Only the top `size` bits of `prefix` are significant; the remaining bits
/// are always zero. Construct through [`Cidr::new`] or by parsing to keep
/// that guarantee.
///
/// # Examples
/// ```
/// use geotrie::Cidr;
///
/// let cidr: Cidr = "10.1.2.3/8".parse().unwrap();
/// assert_eq!(cidr.to_string(), "10.0.0.0/8");
/// assert!(cidr.contains(0x0A_FF_00_01));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cidr {
    prefix: u32,
    size: u8,
}

impl Cidr {
    /// Create a block, masking away host bits beyond `size`.
    pub fn new(prefix: u32, size: u8) -> Result<Self> {
        if size > ADDRESS_BITS {
            return Err(Error::InvalidPrefixLength(size));
        }
        Ok(Self {
            prefix: prefix & size_to_mask(size),
            size,
        })
    }

    /// Build a block from bits already known to be canonical.
    pub(crate) fn from_raw(prefix: u32, size: u8) -> Self {
        debug_assert!(size <= ADDRESS_BITS);
        debug_assert_eq!(prefix & !size_to_mask(size), 0);
        Self { prefix, size }
    }

    /// A single-address `/32` block.
    pub fn host(addr: u32) -> Self {
        Self {
            prefix: addr,
            size: ADDRESS_BITS,
        }
    }

    /// Network address of the block.
    pub fn prefix(&self) -> u32 {
        self.prefix
    }

    /// Prefix length in bits.
    pub fn size(&self) -> u8 {
        self.size
    }

    /// Lowest address in the block.
    pub fn first(&self) -> u32 {
        self.prefix
    }

    /// Highest address in the block.
    pub fn last(&self) -> u32 {
        self.prefix | !size_to_mask(self.size)
    }

    /// Check whether `addr` falls inside the block.
    pub fn contains(&self, addr: u32) -> bool {
        addr & size_to_mask(self.size) == self.prefix
    }
}

impl fmt::Display for Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.prefix.to_be_bytes();
        write!(f, "{}.{}.{}.{}/{}", a, b, c, d, self.size)
    }
}

impl From<Ipv4Net> for Cidr {
    fn from(net: Ipv4Net) -> Self {
        let net = net.trunc();
        Self {
            prefix: u32::from(net.network()),
            size: net.prefix_len(),
        }
    }
}

impl From<Cidr> for Ipv4Net {
    fn from(cidr: Cidr) -> Self {
        // size is always <= 32 by construction
        Ipv4Net::new(Ipv4Addr::from(cidr.prefix), cidr.size)
            .unwrap_or_else(|_| unreachable!("prefix length out of range"))
    }
}

impl FromStr for Cidr {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        s.parse::<Ipv4Net>()
            .map(Cidr::from)
            .map_err(|_| Error::InvalidCidr(s.to_string()))
    }
}

/// Mask with the top `size` bits set and the rest cleared.
pub fn size_to_mask(size: u8) -> u32 {
    debug_assert!(size <= ADDRESS_BITS);
    u32::MAX.checked_shl(u32::from(ADDRESS_BITS - size)).unwrap_or(0)
}

/// Convert an address to its 32-bit integer form.
///
/// IPv4-mapped IPv6 addresses (`::ffff:a.b.c.d`) are accepted; any other
/// IPv6 address yields `None`.
pub fn ip_to_u32(ip: IpAddr) -> Option<u32> {
    match ip {
        IpAddr::V4(v4) => Some(u32::from(v4)),
        IpAddr::V6(v6) => v6.to_ipv4_mapped().map(u32::from),
    }
}

/// Parse a textual address into its 32-bit integer form.
pub fn parse_ip(s: &str) -> Result<u32> {
    let s = s.trim();
    s.parse::<IpAddr>()
        .ok()
        .and_then(ip_to_u32)
        .ok_or_else(|| Error::InvalidIpAddress(s.to_string()))
}

/// Split the inclusive range `[low, high]` into the minimal list of CIDR
/// blocks covering it, sorted by address.
///
/// Reversed bounds are swapped.
///
/// # Examples
/// ```
/// use geotrie::cidr::range_to_cidrs;
///
/// let blocks: Vec<String> = range_to_cidrs(0xC0A8_0002, 0xC0A8_000A)
///     .iter()
///     .map(|c| c.to_string())
///     .collect();
/// assert_eq!(
///     blocks,
///     ["192.168.0.2/31", "192.168.0.4/30", "192.168.0.8/31", "192.168.0.10/32"]
/// );
/// ```
pub fn range_to_cidrs(low: u32, high: u32) -> Vec<Cidr> {
    let (low, high) = if low > high { (high, low) } else { (low, high) };
    let mut blocks = Vec::new();
    split_range(low, high, &mut blocks);
    blocks
}

fn split_range(low: u32, high: u32, out: &mut Vec<Cidr>) {
    let diff = low ^ high;
    let trailing = diff.trailing_ones();

    // diff is a run of trailing ones and low has zeros under it
    if diff.checked_shr(trailing).unwrap_or(0) == 0 && low | diff == high {
        out.push(Cidr {
            prefix: low,
            size: ADDRESS_BITS - trailing as u8,
        });
        return;
    }

    // split on the highest differing bit
    let bit = 31 - diff.leading_zeros();
    let mid = high & !((1u32 << bit) - 1);
    split_range(low, mid - 1, out);
    split_range(mid, high, out);
}
