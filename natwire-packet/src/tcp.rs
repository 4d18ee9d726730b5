//! TCP segment construction and parsing
//!
//! This module provides the TCP header layer, its flags, and checksum
//! calculation against an explicit IPv4 pseudo-header.

use crate::checksum::{transport_checksum, PseudoHeader};
use bytes::{BufMut, BytesMut};
use natwire_core::{Error, Result};
use std::fmt;

/// TCP flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TcpFlags {
    /// FIN - No more data from sender
    pub fin: bool,
    /// SYN - Synchronize sequence numbers
    pub syn: bool,
    /// RST - Reset the connection
    pub rst: bool,
    /// PSH - Push function
    pub psh: bool,
    /// ACK - Acknowledgment field is significant
    pub ack: bool,
    /// URG - Urgent pointer field is significant
    pub urg: bool,
    /// ECE - ECN-Echo
    pub ece: bool,
    /// CWR - Congestion Window Reduced
    pub cwr: bool,
}

impl TcpFlags {
    /// No flags set
    pub const NONE: TcpFlags = TcpFlags {
        fin: false,
        syn: false,
        rst: false,
        psh: false,
        ack: false,
        urg: false,
        ece: false,
        cwr: false,
    };

    /// SYN flag (connection initiation)
    pub const SYN: TcpFlags = TcpFlags {
        syn: true,
        ..TcpFlags::NONE
    };

    /// SYN+ACK flags (connection acknowledgment)
    pub const SYN_ACK: TcpFlags = TcpFlags {
        syn: true,
        ack: true,
        ..TcpFlags::NONE
    };

    /// ACK flag
    pub const ACK: TcpFlags = TcpFlags {
        ack: true,
        ..TcpFlags::NONE
    };

    /// PSH+ACK flags (push data)
    pub const PSH_ACK: TcpFlags = TcpFlags {
        psh: true,
        ack: true,
        ..TcpFlags::NONE
    };

    /// Convert flags to u8 value
    pub fn to_u8(self) -> u8 {
        let mut flags = 0u8;
        if self.fin {
            flags |= 0b00000001;
        }
        if self.syn {
            flags |= 0b00000010;
        }
        if self.rst {
            flags |= 0b00000100;
        }
        if self.psh {
            flags |= 0b00001000;
        }
        if self.ack {
            flags |= 0b00010000;
        }
        if self.urg {
            flags |= 0b00100000;
        }
        if self.ece {
            flags |= 0b01000000;
        }
        if self.cwr {
            flags |= 0b10000000;
        }
        flags
    }

    /// Parse flags from u8 value
    pub fn from_u8(value: u8) -> Self {
        TcpFlags {
            fin: (value & 0b00000001) != 0,
            syn: (value & 0b00000010) != 0,
            rst: (value & 0b00000100) != 0,
            psh: (value & 0b00001000) != 0,
            ack: (value & 0b00010000) != 0,
            urg: (value & 0b00100000) != 0,
            ece: (value & 0b01000000) != 0,
            cwr: (value & 0b10000000) != 0,
        }
    }
}

impl Default for TcpFlags {
    fn default() -> Self {
        TcpFlags::NONE
    }
}

impl fmt::Display for TcpFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (self.cwr, "CWR"),
            (self.ece, "ECE"),
            (self.urg, "URG"),
            (self.ack, "ACK"),
            (self.psh, "PSH"),
            (self.rst, "RST"),
            (self.syn, "SYN"),
            (self.fin, "FIN"),
        ];
        let set: Vec<&str> = names
            .iter()
            .filter(|(on, _)| *on)
            .map(|(_, name)| *name)
            .collect();

        if set.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", set.join("|"))
        }
    }
}

/// TCP header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TcpSegment {
    /// Source port
    pub source_port: u16,
    /// Destination port
    pub destination_port: u16,
    /// Sequence number
    pub sequence_number: u32,
    /// Acknowledgment number
    pub acknowledgment_number: u32,
    /// Data offset in 32-bit words (minimum 5)
    pub data_offset: u8,
    /// Reserved bits (should be 0)
    pub reserved: u8,
    /// TCP flags
    pub flags: TcpFlags,
    /// Window size
    pub window_size: u16,
    /// Checksum
    pub checksum: u16,
    /// Urgent pointer
    pub urgent_pointer: u16,
    /// Options (if data_offset > 5)
    pub options: Vec<u8>,
}

impl TcpSegment {
    /// Minimum TCP header size (without options)
    pub const MIN_HEADER_SIZE: usize = 20;

    /// Bytes of the header an ICMPv4 error is guaranteed to quote (RFC 792):
    /// ports and sequence number
    pub const QUOTED_SIZE: usize = 8;

    /// Create a header with no options; checksum is left for serialization
    pub fn new(
        source_port: u16,
        destination_port: u16,
        sequence_number: u32,
        acknowledgment_number: u32,
        flags: TcpFlags,
        window_size: u16,
    ) -> Self {
        TcpSegment {
            source_port,
            destination_port,
            sequence_number,
            acknowledgment_number,
            data_offset: 5, // 5 * 4 = 20 bytes (minimum header)
            reserved: 0,
            flags,
            window_size,
            checksum: 0,
            urgent_pointer: 0,
            options: Vec::new(),
        }
    }

    /// Header size implied by the options, padded to a 4-byte boundary
    pub fn header_len(&self) -> usize {
        Self::MIN_HEADER_SIZE + ((self.options.len() + 3) & !3)
    }

    /// Calculate and set the TCP checksum over this header and `payload`
    pub fn calculate_checksum(&mut self, pseudo: &PseudoHeader, payload: &[u8]) {
        self.checksum = 0;

        let mut data = BytesMut::with_capacity(self.header_len() + payload.len());
        self.write_to(&mut data);
        data.put_slice(payload);

        self.checksum = transport_checksum(pseudo, &data);
    }

    /// Append the header to `buffer`, exactly as populated
    pub fn write_to(&self, buffer: &mut BytesMut) {
        buffer.put_u16(self.source_port);
        buffer.put_u16(self.destination_port);
        buffer.put_u32(self.sequence_number);
        buffer.put_u32(self.acknowledgment_number);

        // Data offset (4 bits) + Reserved (4 bits)
        buffer.put_u8((self.data_offset << 4) | (self.reserved & 0x0F));
        buffer.put_u8(self.flags.to_u8());

        buffer.put_u16(self.window_size);
        buffer.put_u16(self.checksum);
        buffer.put_u16(self.urgent_pointer);

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

    /// Parse a TCP header, returning it with the payload that follows
    pub fn parse(data: &[u8]) -> Result<(Self, &[u8])> {
        if data.len() < Self::MIN_HEADER_SIZE {
            return Err(Error::truncated("TCP", Self::MIN_HEADER_SIZE, data.len()));
        }

        let data_offset = data[12] >> 4;
        let header_len = (data_offset as usize) * 4;
        if header_len < Self::MIN_HEADER_SIZE {
            return Err(Error::malformed(
                "TCP",
                format!("data offset {} below minimum", data_offset),
            ));
        }
        if data.len() < header_len {
            return Err(Error::truncated("TCP", header_len, data.len()));
        }

        let segment = TcpSegment {
            source_port: u16::from_be_bytes([data[0], data[1]]),
            destination_port: u16::from_be_bytes([data[2], data[3]]),
            sequence_number: u32::from_be_bytes([data[4], data[5], data[6], data[7]]),
            acknowledgment_number: u32::from_be_bytes([data[8], data[9], data[10], data[11]]),
            data_offset,
            reserved: data[12] & 0x0F,
            flags: TcpFlags::from_u8(data[13]),
            window_size: u16::from_be_bytes([data[14], data[15]]),
            checksum: u16::from_be_bytes([data[16], data[17]]),
            urgent_pointer: u16::from_be_bytes([data[18], data[19]]),
            options: data[Self::MIN_HEADER_SIZE..header_len].to_vec(),
        };

        Ok((segment, &data[header_len..]))
    }

    /// Parse the leading bytes of a TCP header quoted by an ICMPv4 error.
    ///
    /// At least [`Self::QUOTED_SIZE`] bytes are required. When the full
    /// 20-byte header is present it is decoded completely (options are not
    /// kept); otherwise only ports and sequence number are filled in and the
    /// remaining fields are zero.
    pub fn parse_quoted(data: &[u8]) -> Result<Self> {
        if data.len() < Self::QUOTED_SIZE {
            return Err(Error::truncated("TCP", Self::QUOTED_SIZE, data.len()));
        }

        let mut segment = TcpSegment::new(
            u16::from_be_bytes([data[0], data[1]]),
            u16::from_be_bytes([data[2], data[3]]),
            u32::from_be_bytes([data[4], data[5], data[6], data[7]]),
            0,
            TcpFlags::NONE,
            0,
        );

        if data.len() >= Self::MIN_HEADER_SIZE {
            segment.acknowledgment_number =
                u32::from_be_bytes([data[8], data[9], data[10], data[11]]);
            segment.data_offset = data[12] >> 4;
            segment.reserved = data[12] & 0x0F;
            segment.flags = TcpFlags::from_u8(data[13]);
            segment.window_size = u16::from_be_bytes([data[14], data[15]]);
            segment.checksum = u16::from_be_bytes([data[16], data[17]]);
            segment.urgent_pointer = u16::from_be_bytes([data[18], data[19]]);
        }

        Ok(segment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_tcp_flags() {
        let flags = TcpFlags::SYN;
        assert!(!flags.fin);
        assert!(flags.syn);
        assert!(!flags.ack);
        assert_eq!(flags.to_u8(), 0b00000010);
        assert_eq!(TcpFlags::from_u8(0b00000010), flags);
    }

    #[test]
    fn test_tcp_flag_combinations() {
        assert_eq!(TcpFlags::SYN_ACK.to_u8(), 0x12);
        assert_eq!(TcpFlags::ACK.to_u8(), 0x10);
        assert_eq!(TcpFlags::PSH_ACK.to_u8(), 0x18);
    }

    #[test]
    fn test_tcp_flags_display() {
        assert_eq!(TcpFlags::SYN_ACK.to_string(), "ACK|SYN");
        assert_eq!(TcpFlags::NONE.to_string(), "none");
    }

    #[test]
    fn test_tcp_segment_to_bytes() {
        let segment = TcpSegment::new(12345, 80, 1000, 2000, TcpFlags::SYN, 65535);
        let bytes = segment.to_bytes();

        assert_eq!(bytes.len(), 20);
        assert_eq!(u16::from_be_bytes([bytes[0], bytes[1]]), 12345);
        assert_eq!(u16::from_be_bytes([bytes[2], bytes[3]]), 80);
        assert_eq!(
            u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            1000
        );
        assert_eq!(
            u32::from_be_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
            2000
        );
        assert_eq!(bytes[12] >> 4, 5);
        assert_eq!(bytes[13], TcpFlags::SYN.to_u8());
        assert_eq!(u16::from_be_bytes([bytes[14], bytes[15]]), 65535);
    }

    #[test]
    fn test_tcp_segment_checksum_verifies() {
        let pseudo = PseudoHeader::new(Ipv4Addr::new(192, 168, 1, 1), Ipv4Addr::new(192, 168, 1, 2), 6);
        let payload = [0x01, 0x02, 0x03];

        let mut segment = TcpSegment::new(12345, 80, 1000, 2000, TcpFlags::PSH_ACK, 65535);
        segment.calculate_checksum(&pseudo, &payload);
        assert_ne!(segment.checksum, 0);

        let mut data = segment.to_bytes();
        data.extend_from_slice(&payload);
        let recomputed = transport_checksum(&pseudo, &data);
        assert_eq!(recomputed, 0);
    }

    #[test]
    fn test_tcp_segment_parse() {
        let data = vec![
            0x30, 0x39, // Source port (12345)
            0x00, 0x50, // Dest port (80)
            0x00, 0x00, 0x03, 0xE8, // Sequence (1000)
            0x00, 0x00, 0x07, 0xD0, // Ack (2000)
            0x50, // Data offset (5) + reserved
            0x02, // Flags (SYN)
            0xFF, 0xFF, // Window (65535)
            0x00, 0x00, // Checksum
            0x00, 0x00, // Urgent pointer
            0x01, 0x02, 0x03, 0x04, // Payload
        ];

        let (segment, payload) = TcpSegment::parse(&data).unwrap();

        assert_eq!(segment.source_port, 12345);
        assert_eq!(segment.destination_port, 80);
        assert_eq!(segment.sequence_number, 1000);
        assert_eq!(segment.acknowledgment_number, 2000);
        assert_eq!(segment.data_offset, 5);
        assert!(segment.flags.syn);
        assert_eq!(segment.window_size, 65535);
        assert_eq!(payload, &[0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn test_tcp_segment_parse_errors() {
        assert!(matches!(
            TcpSegment::parse(&[0u8; 19]).unwrap_err(),
            Error::Truncated { layer: "TCP", needed: 20, available: 19 }
        ));

        let mut bad_offset = vec![0u8; 20];
        bad_offset[12] = 0x40;
        assert!(matches!(
            TcpSegment::parse(&bad_offset).unwrap_err(),
            Error::Malformed { layer: "TCP", .. }
        ));

        let mut missing_options = vec![0u8; 20];
        missing_options[12] = 0x60;
        assert!(matches!(
            TcpSegment::parse(&missing_options).unwrap_err(),
            Error::Truncated { needed: 24, .. }
        ));
    }

    #[test]
    fn test_tcp_segment_parse_quoted_eight_bytes() {
        let data = [0x30, 0x39, 0x00, 0x50, 0x00, 0x00, 0x03, 0xE8];

        let segment = TcpSegment::parse_quoted(&data).unwrap();
        assert_eq!(segment.source_port, 12345);
        assert_eq!(segment.destination_port, 80);
        assert_eq!(segment.sequence_number, 1000);
        assert_eq!(segment.flags, TcpFlags::NONE);
        assert_eq!(segment.checksum, 0);

        assert!(matches!(
            TcpSegment::parse_quoted(&data[..7]).unwrap_err(),
            Error::Truncated { needed: 8, available: 7, .. }
        ));
    }

    #[test]
    fn test_tcp_segment_parse_quoted_full_header() {
        let original = TcpSegment::new(40000, 443, 7, 9, TcpFlags::SYN_ACK, 1024);
        let segment = TcpSegment::parse_quoted(&original.to_bytes()).unwrap();
        assert_eq!(segment, original);
    }
}
