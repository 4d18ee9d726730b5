//! Ethernet frame construction and parsing
//!
//! This module provides the Ethernet II header layer. The payload is not
//! owned by the frame; it is whatever layers follow it in a serialized stack.

use bytes::{BufMut, BytesMut};
use natwire_core::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// EtherType values used in Ethernet II frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EtherType {
    /// IPv4 (0x0800)
    IPv4,
    /// ARP (0x0806)
    ARP,
    /// VLAN-tagged frame (0x8100)
    VLAN,
    /// IPv6 (0x86DD)
    IPv6,
    /// Custom EtherType
    Custom(u16),
}

impl EtherType {
    /// Convert EtherType to u16 value
    pub fn to_u16(self) -> u16 {
        match self {
            EtherType::IPv4 => 0x0800,
            EtherType::ARP => 0x0806,
            EtherType::VLAN => 0x8100,
            EtherType::IPv6 => 0x86DD,
            EtherType::Custom(val) => val,
        }
    }

    /// Create EtherType from u16 value
    pub fn from_u16(value: u16) -> Self {
        match value {
            0x0800 => EtherType::IPv4,
            0x0806 => EtherType::ARP,
            0x8100 => EtherType::VLAN,
            0x86DD => EtherType::IPv6,
            val => EtherType::Custom(val),
        }
    }
}

impl fmt::Display for EtherType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EtherType::IPv4 => write!(f, "IPv4"),
            EtherType::ARP => write!(f, "ARP"),
            EtherType::VLAN => write!(f, "VLAN"),
            EtherType::IPv6 => write!(f, "IPv6"),
            EtherType::Custom(val) => write!(f, "0x{:04X}", val),
        }
    }
}

/// MAC address (6 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacAddress(pub [u8; 6]);

impl MacAddress {
    /// Broadcast MAC address (FF:FF:FF:FF:FF:FF)
    pub const BROADCAST: MacAddress = MacAddress([0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);

    /// Zero MAC address (00:00:00:00:00:00)
    pub const ZERO: MacAddress = MacAddress([0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);

    pub fn new(bytes: [u8; 6]) -> Self {
        MacAddress(bytes)
    }

    /// Get the MAC address as a byte array
    pub fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

impl FromStr for MacAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 6 {
            return Err(Error::invalid_parameter(s, "expected six colon-separated octets"));
        }

        let mut bytes = [0u8; 6];
        for (i, part) in parts.iter().enumerate() {
            bytes[i] = u8::from_str_radix(part, 16)
                .map_err(|_| Error::invalid_parameter(s, "invalid hex octet"))?;
        }

        Ok(MacAddress(bytes))
    }
}

impl From<[u8; 6]> for MacAddress {
    fn from(bytes: [u8; 6]) -> Self {
        MacAddress(bytes)
    }
}

/// Ethernet II header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EthernetFrame {
    /// Destination MAC address
    pub destination: MacAddress,
    /// Source MAC address
    pub source: MacAddress,
    /// EtherType of the carried layer
    pub ethertype: EtherType,
}

impl EthernetFrame {
    /// Minimum Ethernet frame size (without FCS)
    pub const MIN_FRAME_SIZE: usize = 60;

    /// Ethernet header size (dst + src + type)
    pub const HEADER_SIZE: usize = 14;

    pub fn new(destination: MacAddress, source: MacAddress, ethertype: EtherType) -> Self {
        EthernetFrame {
            destination,
            source,
            ethertype,
        }
    }

    /// Append the 14-byte header to `buffer`
    pub fn write_to(&self, buffer: &mut BytesMut) {
        buffer.put_slice(self.destination.as_bytes());
        buffer.put_slice(self.source.as_bytes());
        buffer.put_u16(self.ethertype.to_u16());
    }

    /// Convert the header to bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buffer = BytesMut::with_capacity(Self::HEADER_SIZE);
        self.write_to(&mut buffer);
        buffer.to_vec()
    }

    /// Parse an Ethernet header, returning it with the bytes that follow
    pub fn parse(data: &[u8]) -> Result<(Self, &[u8])> {
        if data.len() < Self::HEADER_SIZE {
            return Err(Error::truncated("Ethernet", Self::HEADER_SIZE, data.len()));
        }

        let mut destination = [0u8; 6];
        destination.copy_from_slice(&data[0..6]);
        let mut source = [0u8; 6];
        source.copy_from_slice(&data[6..12]);
        let ethertype = EtherType::from_u16(u16::from_be_bytes([data[12], data[13]]));

        let frame = EthernetFrame {
            destination: MacAddress(destination),
            source: MacAddress(source),
            ethertype,
        };

        Ok((frame, &data[Self::HEADER_SIZE..]))
    }
}
