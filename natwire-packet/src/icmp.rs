//! ICMPv4 message construction, parsing and classification
//!
//! Every ICMPv4 type this crate understands is either a *query* (a
//! request/reply pair that never quotes another packet) or an *error* (a
//! delivery failure report that quotes the offending packet's IPv4 header
//! and the first 8 bytes of its transport header, RFC 792). Types outside
//! both sets are rejected rather than defaulted.

use crate::checksum::internet_checksum;
use bytes::{BufMut, BytesMut};
use natwire_core::{Error, Result};
use std::fmt;

/// ICMPv4 message types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Icmpv4Type {
    /// Echo reply (0)
    EchoReply,
    /// Destination unreachable (3)
    DestinationUnreachable,
    /// Source quench (4)
    SourceQuench,
    /// Redirect (5)
    Redirect,
    /// Echo request (8)
    EchoRequest,
    /// Router advertisement (9)
    RouterAdvertisement,
    /// Router solicitation (10)
    RouterSolicitation,
    /// Time exceeded (11)
    TimeExceeded,
    /// Parameter problem (12)
    ParameterProblem,
    /// Timestamp request (13)
    TimestampRequest,
    /// Timestamp reply (14)
    TimestampReply,
    /// Information request (15)
    InfoRequest,
    /// Information reply (16)
    InfoReply,
    /// Address mask request (17)
    AddressMaskRequest,
    /// Address mask reply (18)
    AddressMaskReply,
    /// Any other type value
    Unknown(u8),
}

impl Icmpv4Type {
    pub fn to_u8(self) -> u8 {
        match self {
            Icmpv4Type::EchoReply => 0,
            Icmpv4Type::DestinationUnreachable => 3,
            Icmpv4Type::SourceQuench => 4,
            Icmpv4Type::Redirect => 5,
            Icmpv4Type::EchoRequest => 8,
            Icmpv4Type::RouterAdvertisement => 9,
            Icmpv4Type::RouterSolicitation => 10,
            Icmpv4Type::TimeExceeded => 11,
            Icmpv4Type::ParameterProblem => 12,
            Icmpv4Type::TimestampRequest => 13,
            Icmpv4Type::TimestampReply => 14,
            Icmpv4Type::InfoRequest => 15,
            Icmpv4Type::InfoReply => 16,
            Icmpv4Type::AddressMaskRequest => 17,
            Icmpv4Type::AddressMaskReply => 18,
            Icmpv4Type::Unknown(val) => val,
        }
    }

    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => Icmpv4Type::EchoReply,
            3 => Icmpv4Type::DestinationUnreachable,
            4 => Icmpv4Type::SourceQuench,
            5 => Icmpv4Type::Redirect,
            8 => Icmpv4Type::EchoRequest,
            9 => Icmpv4Type::RouterAdvertisement,
            10 => Icmpv4Type::RouterSolicitation,
            11 => Icmpv4Type::TimeExceeded,
            12 => Icmpv4Type::ParameterProblem,
            13 => Icmpv4Type::TimestampRequest,
            14 => Icmpv4Type::TimestampReply,
            15 => Icmpv4Type::InfoRequest,
            16 => Icmpv4Type::InfoReply,
            17 => Icmpv4Type::AddressMaskRequest,
            18 => Icmpv4Type::AddressMaskReply,
            val => Icmpv4Type::Unknown(val),
        }
    }
}

impl fmt::Display for Icmpv4Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Icmpv4Type::Unknown(val) => write!(f, "Unknown({})", val),
            known => write!(f, "{:?}", known),
        }
    }
}

/// Whether an ICMPv4 type is a query or an error report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Icmpv4Class {
    Query,
    Error,
}

/// Classify an ICMPv4 type.
///
/// Total over the known query and error types; every other value fails with
/// [`Error::UnsupportedIcmpType`].
pub fn classify(icmp_type: Icmpv4Type) -> Result<Icmpv4Class> {
    match icmp_type {
        Icmpv4Type::EchoReply
        | Icmpv4Type::EchoRequest
        | Icmpv4Type::RouterAdvertisement
        | Icmpv4Type::RouterSolicitation
        | Icmpv4Type::TimestampRequest
        | Icmpv4Type::TimestampReply
        | Icmpv4Type::InfoRequest
        | Icmpv4Type::InfoReply
        | Icmpv4Type::AddressMaskRequest
        | Icmpv4Type::AddressMaskReply => Ok(Icmpv4Class::Query),
        Icmpv4Type::DestinationUnreachable
        | Icmpv4Type::SourceQuench
        | Icmpv4Type::Redirect
        | Icmpv4Type::TimeExceeded
        | Icmpv4Type::ParameterProblem => Ok(Icmpv4Class::Error),
        Icmpv4Type::Unknown(val) => Err(Error::UnsupportedIcmpType(val)),
    }
}

/// ICMPv4 type and code pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Icmpv4TypeCode {
    pub icmp_type: Icmpv4Type,
    pub code: u8,
}

impl Icmpv4TypeCode {
    pub fn new(icmp_type: Icmpv4Type, code: u8) -> Self {
        Icmpv4TypeCode { icmp_type, code }
    }

    /// Classification of the type; the code plays no part in it
    pub fn class(&self) -> Result<Icmpv4Class> {
        classify(self.icmp_type)
    }
}

impl fmt::Display for Icmpv4TypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} code {}", self.icmp_type, self.code)
    }
}

/// ICMPv4 message: 8-byte header followed by its payload.
///
/// For query types the payload is opaque data; for error types it is the
/// quoted original packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Icmpv4Message {
    /// Type and code
    pub type_code: Icmpv4TypeCode,
    /// Checksum over the whole message
    pub checksum: u16,
    /// Identifier (query types)
    pub identifier: u16,
    /// Sequence number (query types)
    pub sequence: u16,
    /// Payload bytes
    pub payload: Vec<u8>,
}

impl Icmpv4Message {
    /// ICMPv4 header size in bytes
    pub const HEADER_SIZE: usize = 8;

    pub fn new(type_code: Icmpv4TypeCode, identifier: u16, sequence: u16, payload: Vec<u8>) -> Self {
        Icmpv4Message {
            type_code,
            checksum: 0,
            identifier,
            sequence,
            payload,
        }
    }

    /// Encoded size: header plus payload
    pub fn wire_len(&self) -> usize {
        Self::HEADER_SIZE + self.payload.len()
    }

    /// Calculate and set the checksum over the message and any `trailing`
    /// bytes serialized after it
    pub fn calculate_checksum(&mut self, trailing: &[u8]) {
        self.checksum = 0;

        let mut data = BytesMut::with_capacity(self.wire_len() + trailing.len());
        self.write_to(&mut data);
        data.put_slice(trailing);

        self.checksum = internet_checksum(&data);
    }

    /// Append the message to `buffer`, exactly as populated
    pub fn write_to(&self, buffer: &mut BytesMut) {
        buffer.put_u8(self.type_code.icmp_type.to_u8());
        buffer.put_u8(self.type_code.code);
        buffer.put_u16(self.checksum);
        buffer.put_u16(self.identifier);
        buffer.put_u16(self.sequence);
        buffer.put_slice(&self.payload);
    }

    /// Convert the message to bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buffer = BytesMut::with_capacity(self.wire_len());
        self.write_to(&mut buffer);
        buffer.to_vec()
    }

    /// Parse an ICMPv4 message; everything after the header is its payload
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < Self::HEADER_SIZE {
            return Err(Error::truncated("ICMPv4", Self::HEADER_SIZE, data.len()));
        }

        Ok(Icmpv4Message {
            type_code: Icmpv4TypeCode::new(Icmpv4Type::from_u8(data[0]), data[1]),
            checksum: u16::from_be_bytes([data[2], data[3]]),
            identifier: u16::from_be_bytes([data[4], data[5]]),
            sequence: u16::from_be_bytes([data[6], data[7]]),
            payload: data[Self::HEADER_SIZE..].to_vec(),
        })
    }
}
