//! IPv4 header construction and parsing
//!
//! IPv6 is deliberately absent: the factory refuses to build it and the
//! parser reports it as an unsupported IP version.

use crate::checksum::{internet_checksum, PseudoHeader};
use bytes::{BufMut, BytesMut};
use natwire_core::{Error, Result};
use std::fmt;
use std::net::Ipv4Addr;

/// IP Protocol numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpProtocol {
    /// ICMP (1)
    ICMP,
    /// TCP (6)
    TCP,
    /// UDP (17)
    UDP,
    /// Custom protocol number
    Custom(u8),
}

impl IpProtocol {
    pub fn to_u8(self) -> u8 {
        match self {
            IpProtocol::ICMP => 1,
            IpProtocol::TCP => 6,
            IpProtocol::UDP => 17,
            IpProtocol::Custom(val) => val,
        }
    }

    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => IpProtocol::ICMP,
            6 => IpProtocol::TCP,
            17 => IpProtocol::UDP,
            val => IpProtocol::Custom(val),
        }
    }
}

impl fmt::Display for IpProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpProtocol::ICMP => write!(f, "ICMP"),
            IpProtocol::TCP => write!(f, "TCP"),
            IpProtocol::UDP => write!(f, "UDP"),
            IpProtocol::Custom(val) => write!(f, "protocol {}", val),
        }
    }
}

/// IP Flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpFlags {
    /// Reserved bit (must be 0)
    pub reserved: bool,
    /// Don't Fragment flag
    pub dont_fragment: bool,
    /// More Fragments flag
    pub more_fragments: bool,
}

impl IpFlags {
    /// No flags set
    pub const NONE: IpFlags = IpFlags {
        reserved: false,
        dont_fragment: false,
        more_fragments: false,
    };

    /// Don't Fragment flag set
    pub const DONT_FRAGMENT: IpFlags = IpFlags {
        reserved: false,
        dont_fragment: true,
        more_fragments: false,
    };

    /// Convert to 3-bit value
    pub fn to_u8(self) -> u8 {
        let mut flags = 0u8;
        if self.reserved {
            flags |= 0b100;
        }
        if self.dont_fragment {
            flags |= 0b010;
        }
        if self.more_fragments {
            flags |= 0b001;
        }
        flags
    }

    /// Parse from 3-bit value
    pub fn from_u8(value: u8) -> Self {
        IpFlags {
            reserved: (value & 0b100) != 0,
            dont_fragment: (value & 0b010) != 0,
            more_fragments: (value & 0b001) != 0,
        }
    }
}

impl Default for IpFlags {
    fn default() -> Self {
        IpFlags::NONE
    }
}

/// IPv4 header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ipv4Header {
    /// Version (always 4 for IPv4)
    pub version: u8,
    /// Internet Header Length in 32-bit words (minimum 5)
    pub ihl: u8,
    /// Type of Service / DSCP
    pub tos: u8,
    /// Total length (header + data) in bytes
    pub total_length: u16,
    /// Identification
    pub identification: u16,
    /// Flags
    pub flags: IpFlags,
    /// Fragment offset (in 8-byte blocks)
    pub fragment_offset: u16,
    /// Time to Live
    pub ttl: u8,
    /// Protocol of the carried layer
    pub protocol: IpProtocol,
    /// Header checksum
    pub checksum: u16,
    /// Source IP address
    pub source: Ipv4Addr,
    /// Destination IP address
    pub destination: Ipv4Addr,
    /// Options (if IHL > 5)
    pub options: Vec<u8>,
}

impl Ipv4Header {
    /// Minimum IPv4 header size (without options)
    pub const MIN_HEADER_SIZE: usize = 20;

    /// Maximum IPv4 packet size
    pub const MAX_PACKET_SIZE: usize = 65535;

    /// Create a header with no options, DF set and TTL 64.
    ///
    /// Total length and checksum stay zero until serialization.
    pub fn new(source: Ipv4Addr, destination: Ipv4Addr, protocol: IpProtocol) -> Self {
        Ipv4Header {
            version: 4,
            ihl: 5,
            tos: 0,
            total_length: 0,
            identification: 0,
            flags: IpFlags::DONT_FRAGMENT,
            fragment_offset: 0,
            ttl: 64,
            protocol,
            checksum: 0,
            source,
            destination,
            options: Vec::new(),
        }
    }

    /// Set the Time to Live
    pub fn with_ttl(mut self, ttl: u8) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the identification field
    pub fn with_identification(mut self, id: u16) -> Self {
        self.identification = id;
        self
    }

    /// Header size implied by the options, padded to a 4-byte boundary
    pub fn header_len(&self) -> usize {
        Self::MIN_HEADER_SIZE + ((self.options.len() + 3) & !3)
    }

    /// Whether this header belongs to a fragment: MF set or a non-zero
    /// fragment offset
    pub fn is_fragment(&self) -> bool {
        self.flags.more_fragments || self.fragment_offset != 0
    }

    /// Pseudo-header for a transport layer carried by this header
    pub fn pseudo_header(&self, protocol: IpProtocol) -> PseudoHeader {
        PseudoHeader::new(self.source, self.destination, protocol.to_u8())
    }

    /// Calculate and update the header checksum
    pub fn calculate_checksum(&mut self) {
        self.checksum = 0;
        self.checksum = internet_checksum(&self.to_bytes());
    }

    /// Append the header to `buffer`, exactly as populated
    pub fn write_to(&self, buffer: &mut BytesMut) {
        // Version (4 bits) + IHL (4 bits)
        buffer.put_u8((self.version << 4) | (self.ihl & 0x0F));
        buffer.put_u8(self.tos);
        buffer.put_u16(self.total_length);
        buffer.put_u16(self.identification);

        // Flags (3 bits) + Fragment Offset (13 bits)
        let flags_and_offset =
            ((self.flags.to_u8() as u16) << 13) | (self.fragment_offset & 0x1FFF);
        buffer.put_u16(flags_and_offset);

        buffer.put_u8(self.ttl);
        buffer.put_u8(self.protocol.to_u8());
        buffer.put_u16(self.checksum);
        buffer.put_slice(&self.source.octets());
        buffer.put_slice(&self.destination.octets());

        // Options, zero-padded to a 4-byte boundary
        buffer.put_slice(&self.options);
        let padding = self.header_len() - Self::MIN_HEADER_SIZE - self.options.len();
        buffer.put_bytes(0, padding);
    }

    /// Convert the header to bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buffer = BytesMut::with_capacity(self.header_len());
        self.write_to(&mut buffer);
        buffer.to_vec()
    }

    /// Parse an IPv4 header, returning it with the bytes it carries.
    ///
    /// The returned payload is cut at the total length when the buffer holds
    /// more (link-layer padding). When the buffer holds less, as in the quote
    /// inside an ICMPv4 error, everything after the header is returned.
    pub fn parse(data: &[u8]) -> Result<(Self, &[u8])> {
        let Some(&version_ihl) = data.first() else {
            return Err(Error::truncated("IPv4", Self::MIN_HEADER_SIZE, 0));
        };

        let version = version_ihl >> 4;
        if version != 4 {
            return Err(Error::UnsupportedIpVersion(version));
        }

        if data.len() < Self::MIN_HEADER_SIZE {
            return Err(Error::truncated("IPv4", Self::MIN_HEADER_SIZE, data.len()));
        }

        let ihl = version_ihl & 0x0F;
        let header_len = (ihl as usize) * 4;
        if header_len < Self::MIN_HEADER_SIZE {
            return Err(Error::malformed(
                "IPv4",
                format!("header length {} below minimum", header_len),
            ));
        }
        if data.len() < header_len {
            return Err(Error::truncated("IPv4", header_len, data.len()));
        }

        let total_length = u16::from_be_bytes([data[2], data[3]]);
        let flags_and_offset = u16::from_be_bytes([data[6], data[7]]);

        let header = Ipv4Header {
            version,
            ihl,
            tos: data[1],
            total_length,
            identification: u16::from_be_bytes([data[4], data[5]]),
            flags: IpFlags::from_u8((flags_and_offset >> 13) as u8),
            fragment_offset: flags_and_offset & 0x1FFF,
            ttl: data[8],
            protocol: IpProtocol::from_u8(data[9]),
            checksum: u16::from_be_bytes([data[10], data[11]]),
            source: Ipv4Addr::new(data[12], data[13], data[14], data[15]),
            destination: Ipv4Addr::new(data[16], data[17], data[18], data[19]),
            options: data[Self::MIN_HEADER_SIZE..header_len].to_vec(),
        };

        let end = total_length as usize;
        let payload = if end >= header_len && end <= data.len() {
            &data[header_len..end]
        } else {
            &data[header_len..]
        };

        Ok((header, payload))
    }
}
