//! BSD loopback link layer
//!
//! Loopback interfaces on BSD-derived systems (`DLT_NULL`) prefix each
//! packet with a 4-byte address family instead of an Ethernet header. The
//! family is in host byte order; headers are written little-endian and a
//! big-endian header is recognized by its two leading zero bytes.

use bytes::{BufMut, BytesMut};
use natwire_core::{Error, Result};
use std::fmt;

/// Address family carried in a loopback header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolFamily {
    /// AF_INET (2)
    IPv4,
    /// AF_INET6 on Linux (10)
    IPv6Linux,
    /// AF_INET6 on NetBSD/OpenBSD (24)
    IPv6Bsd,
    /// AF_INET6 on FreeBSD (28)
    IPv6FreeBsd,
    /// AF_INET6 on macOS (30)
    IPv6Darwin,
    /// Custom family
    Custom(u32),
}

impl ProtocolFamily {
    pub fn to_u32(self) -> u32 {
        match self {
            ProtocolFamily::IPv4 => 2,
            ProtocolFamily::IPv6Linux => 10,
            ProtocolFamily::IPv6Bsd => 24,
            ProtocolFamily::IPv6FreeBsd => 28,
            ProtocolFamily::IPv6Darwin => 30,
            ProtocolFamily::Custom(val) => val,
        }
    }

    pub fn from_u32(value: u32) -> Self {
        match value {
            2 => ProtocolFamily::IPv4,
            10 => ProtocolFamily::IPv6Linux,
            24 => ProtocolFamily::IPv6Bsd,
            28 => ProtocolFamily::IPv6FreeBsd,
            30 => ProtocolFamily::IPv6Darwin,
            val => ProtocolFamily::Custom(val),
        }
    }

    /// Whether the family names IPv6 on any platform
    pub fn is_ipv6(self) -> bool {
        matches!(
            self,
            ProtocolFamily::IPv6Linux
                | ProtocolFamily::IPv6Bsd
                | ProtocolFamily::IPv6FreeBsd
                | ProtocolFamily::IPv6Darwin
        )
    }
}

impl fmt::Display for ProtocolFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolFamily::IPv4 => write!(f, "IPv4"),
            ProtocolFamily::Custom(val) => write!(f, "family {}", val),
            ipv6 => write!(f, "IPv6 ({})", ipv6.to_u32()),
        }
    }
}

/// Loopback header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopbackHeader {
    pub family: ProtocolFamily,
}

impl LoopbackHeader {
    pub const HEADER_SIZE: usize = 4;

    pub fn new(family: ProtocolFamily) -> Self {
        LoopbackHeader { family }
    }

    /// Append the 4-byte header to `buffer`
    pub fn write_to(&self, buffer: &mut BytesMut) {
        buffer.put_u32_le(self.family.to_u32());
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buffer = BytesMut::with_capacity(Self::HEADER_SIZE);
        self.write_to(&mut buffer);
        buffer.to_vec()
    }

    /// Parse a loopback header in either byte order, returning it with the
    /// bytes that follow
    pub fn parse(data: &[u8]) -> Result<(Self, &[u8])> {
        if data.len() < Self::HEADER_SIZE {
            return Err(Error::truncated("Loopback", Self::HEADER_SIZE, data.len()));
        }

        let raw = [data[0], data[1], data[2], data[3]];
        let family = if raw[0] == 0 && raw[1] == 0 {
            u32::from_be_bytes(raw)
        } else {
            u32::from_le_bytes(raw)
        };

        Ok((
            LoopbackHeader::new(ProtocolFamily::from_u32(family)),
            &data[Self::HEADER_SIZE..],
        ))
    }
}
