//! UDP datagram construction and parsing
//!
//! This module provides the UDP header layer and its pseudo-header checksum.

use crate::checksum::{transport_checksum, PseudoHeader};
use bytes::{BufMut, BytesMut};
use natwire_core::{Error, Result};

/// UDP header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UdpDatagram {
    /// Source port
    pub source_port: u16,
    /// Destination port
    pub destination_port: u16,
    /// Length (header + data)
    pub length: u16,
    /// Checksum
    pub checksum: u16,
}

impl UdpDatagram {
    /// UDP header size in bytes
    pub const HEADER_SIZE: usize = 8;

    /// Create a new UDP header.
    ///
    /// Length and checksum are zero until serialization, which needs the
    /// payload and the enclosing IPv4 addresses to compute them.
    pub fn new(source_port: u16, destination_port: u16) -> Self {
        UdpDatagram {
            source_port,
            destination_port,
            length: 0,
            checksum: 0,
        }
    }

    /// Calculate and set the UDP checksum over this header and `payload`.
    ///
    /// A computed checksum of zero is transmitted as 0xFFFF, since zero on
    /// the wire means "no checksum".
    pub fn calculate_checksum(&mut self, pseudo: &PseudoHeader, payload: &[u8]) {
        self.checksum = 0;

        let mut data = BytesMut::with_capacity(Self::HEADER_SIZE + payload.len());
        self.write_to(&mut data);
        data.put_slice(payload);

        let checksum = transport_checksum(pseudo, &data);
        self.checksum = if checksum == 0 { 0xFFFF } else { checksum };
    }

    /// Append the header to `buffer`, exactly as populated
    pub fn write_to(&self, buffer: &mut BytesMut) {
        buffer.put_u16(self.source_port);
        buffer.put_u16(self.destination_port);
        buffer.put_u16(self.length);
        buffer.put_u16(self.checksum);
    }

    /// Convert the header to bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buffer = BytesMut::with_capacity(Self::HEADER_SIZE);
        self.write_to(&mut buffer);
        buffer.to_vec()
    }

    /// Parse a UDP header, returning it with the payload that follows.
    ///
    /// The payload is cut at the length field when the buffer holds more;
    /// when it holds less (an ICMPv4 quote), whatever is present is returned.
    pub fn parse(data: &[u8]) -> Result<(Self, &[u8])> {
        if data.len() < Self::HEADER_SIZE {
            return Err(Error::truncated("UDP", Self::HEADER_SIZE, data.len()));
        }

        let datagram = UdpDatagram {
            source_port: u16::from_be_bytes([data[0], data[1]]),
            destination_port: u16::from_be_bytes([data[2], data[3]]),
            length: u16::from_be_bytes([data[4], data[5]]),
            checksum: u16::from_be_bytes([data[6], data[7]]),
        };

        let end = datagram.length as usize;
        let payload = if end >= Self::HEADER_SIZE && end <= data.len() {
            &data[Self::HEADER_SIZE..end]
        } else {
            &data[Self::HEADER_SIZE..]
        };

        Ok((datagram, payload))
    }

    /// Validate the checksum against `pseudo` and `payload`
    pub fn validate_checksum(&self, pseudo: &PseudoHeader, payload: &[u8]) -> bool {
        let mut data = BytesMut::with_capacity(Self::HEADER_SIZE + payload.len());
        self.write_to(&mut data);
        data.put_slice(payload);

        let calculated = transport_checksum(pseudo, &data);
        calculated == 0 || calculated == 0xFFFF
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn pseudo() -> PseudoHeader {
        PseudoHeader::new(Ipv4Addr::new(192, 168, 1, 1), Ipv4Addr::new(192, 168, 1, 2), 17)
    }

    #[test]
    fn test_udp_datagram_new() {
        let datagram = UdpDatagram::new(12345, 53);

        assert_eq!(datagram.source_port, 12345);
        assert_eq!(datagram.destination_port, 53);
        assert_eq!(datagram.length, 0);
        assert_eq!(datagram.checksum, 0);
    }

    #[test]
    fn test_udp_datagram_to_bytes() {
        let mut datagram = UdpDatagram::new(12345, 53);
        datagram.length = 12;
        let bytes = datagram.to_bytes();

        assert_eq!(bytes, vec![0x30, 0x39, 0x00, 0x35, 0x00, 0x0C, 0x00, 0x00]);
    }

    #[test]
    fn test_udp_datagram_checksum() {
        let payload = [0x01, 0x02, 0x03, 0x04];
        let mut datagram = UdpDatagram::new(12345, 53);
        datagram.length = 12;
        datagram.calculate_checksum(&pseudo(), &payload);

        assert_ne!(datagram.checksum, 0);
        assert!(datagram.validate_checksum(&pseudo(), &payload));

        datagram.checksum ^= 0x0101;
        assert!(!datagram.validate_checksum(&pseudo(), &payload));
    }

    #[test]
    fn test_udp_datagram_parse() {
        let data = vec![
            0x30, 0x39, // Source port (12345)
            0x00, 0x35, // Dest port (53)
            0x00, 0x0C, // Length (12)
            0x00, 0x00, // Checksum (0)
            0x01, 0x02, 0x03, 0x04, // Payload
            0x00, 0x00, // Trailing padding
        ];

        let (datagram, payload) = UdpDatagram::parse(&data).unwrap();

        assert_eq!(datagram.source_port, 12345);
        assert_eq!(datagram.destination_port, 53);
        assert_eq!(datagram.length, 12);
        assert_eq!(payload, &[0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn test_udp_datagram_parse_quoted_header() {
        // ICMPv4 errors quote the header only; length still names the original
        let data = [0x13, 0x88, 0x00, 0x35, 0x00, 0x28, 0xAB, 0xCD];

        let (datagram, payload) = UdpDatagram::parse(&data).unwrap();
        assert_eq!(datagram.source_port, 5000);
        assert_eq!(datagram.length, 40);
        assert!(payload.is_empty());

        assert!(matches!(
            UdpDatagram::parse(&data[..7]).unwrap_err(),
            Error::Truncated { layer: "UDP", needed: 8, available: 7 }
        ));
    }
}
