//! IPv4 prefixes and prefix ranges.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

#[derive(Debug, thiserror::Error, Eq, PartialEq)]
#[error("invalid prefix '{0}'")]
pub struct ParsePrefixError(String);

/// A canonical IPv4 prefix: host bits are always zero.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Prefix {
    address: Ipv4Addr,
    length: u8,
}

impl Prefix {
    /// # Panics
    ///
    /// Panics if `length > 32`.
    pub fn new(address: Ipv4Addr, length: u8) -> Self {
        assert!(length <= 32, "Prefix length {} is out of range", length);
        let mask = mask(length);
        Prefix {
            address: Ipv4Addr::from(u32::from(address) & mask),
            length,
        }
    }

    pub fn address(&self) -> Ipv4Addr {
        self.address
    }

    pub fn bits(&self) -> u32 {
        u32::from(self.address)
    }

    pub fn length(&self) -> u8 {
        self.length
    }

    /// Does this prefix contain `other` (as a more specific or equal prefix)?
    pub fn contains(&self, other: &Prefix) -> bool {
        other.length >= self.length && other.bits() & mask(self.length) == self.bits()
    }
}

fn mask(length: u8) -> u32 {
    if length == 0 {
        0
    } else {
        u32::MAX << (32 - length as u32)
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.length)
    }
}

impl FromStr for Prefix {
    type Err = ParsePrefixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParsePrefixError(s.to_string());
        let (address, length) = s.split_once('/').ok_or_else(err)?;
        let address: Ipv4Addr = address.parse().map_err(|_| err())?;
        let length: u8 = length.parse().map_err(|_| err())?;
        if length > 32 {
            return Err(err());
        }
        Ok(Prefix::new(address, length))
    }
}

/// An inclusive range of prefix lengths.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct SubRange {
    pub start: u8,
    pub end: u8,
}

impl SubRange {
    pub fn new(start: u8, end: u8) -> Self {
        SubRange { start, end }
    }

    pub fn singleton(length: u8) -> Self {
        SubRange::new(length, length)
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }
}

/// A prefix together with the lengths of the routes it matches.
///
/// `1.0.0.0/8 16-24` matches any route inside `1.0.0.0/8` whose length is
/// between 16 and 24.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PrefixRange {
    pub prefix: Prefix,
    pub lengths: SubRange,
}

impl PrefixRange {
    pub fn new(prefix: Prefix, start: u8, end: u8) -> Self {
        PrefixRange {
            prefix,
            lengths: SubRange::new(start, end),
        }
    }

    /// Only the prefix itself.
    pub fn exact(prefix: Prefix) -> Self {
        PrefixRange::new(prefix, prefix.length(), prefix.length())
    }

    /// The prefix and everything more specific.
    pub fn more_specifics(prefix: Prefix) -> Self {
        PrefixRange::new(prefix, prefix.length(), 32)
    }

    pub fn includes(&self, route: &Prefix) -> bool {
        self.prefix.contains(route)
            && route.length() >= self.lengths.start
            && route.length() <= self.lengths.end
    }
}

impl fmt::Display for PrefixRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}-{}", self.prefix, self.lengths.start, self.lengths.end)
    }
}
