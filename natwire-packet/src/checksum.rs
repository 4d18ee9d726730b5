//! Checksum calculations for network packets
//!
//! This module provides the Internet Checksum (RFC 1071) used by the IPv4,
//! TCP, UDP and ICMPv4 headers, and the TCP/UDP pseudo-header variant.

use std::net::Ipv4Addr;

/// Calculates the Internet Checksum as defined in RFC 1071.
///
/// The data is summed as big-endian 16-bit words (an odd trailing byte is
/// padded with zero), the carries are folded back in, and the one's
/// complement of the result is returned.
///
/// # Examples
///
/// ```
/// use natwire_packet::checksum::internet_checksum;
///
/// let header = [0x45, 0x00, 0x00, 0x73, 0x00, 0x00, 0x40, 0x00, 0x40, 0x11,
///               0x00, 0x00, 0xc0, 0xa8, 0x00, 0x01, 0xc0, 0xa8, 0x00, 0xc7];
/// assert_eq!(internet_checksum(&header), 0xb861);
/// ```
pub fn internet_checksum(data: &[u8]) -> u16 {
    let mut sum: u32 = 0;

    // Process 16-bit words
    let mut chunks = data.chunks_exact(2);
    for chunk in &mut chunks {
        let word = u16::from_be_bytes([chunk[0], chunk[1]]);
        sum += word as u32;
    }

    // Handle odd byte if present
    if let Some(&byte) = chunks.remainder().first() {
        sum += (byte as u32) << 8;
    }

    // Fold 32-bit sum to 16 bits
    while (sum >> 16) != 0 {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }

    // Return one's complement
    !sum as u16
}

/// The virtual header prepended to TCP and UDP data for checksum purposes.
///
/// It is never transmitted. The serializer builds one from the IPv4 layer
/// that encloses the transport layer and passes it in explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PseudoHeader {
    /// Source IPv4 address
    pub source: Ipv4Addr,
    /// Destination IPv4 address
    pub destination: Ipv4Addr,
    /// IP protocol number (6 for TCP, 17 for UDP)
    pub protocol: u8,
}

impl PseudoHeader {
    /// Pseudo-header size in bytes
    pub const SIZE: usize = 12;

    pub fn new(source: Ipv4Addr, destination: Ipv4Addr, protocol: u8) -> Self {
        PseudoHeader {
            source,
            destination,
            protocol,
        }
    }
}

/// Calculates the checksum for a TCP or UDP packet including the pseudo-header.
///
/// `data` is the transport header and payload with the checksum field zeroed.
/// Its length must fit the 16-bit pseudo-header length field.
///
/// # Examples
///
/// ```
/// use std::net::Ipv4Addr;
/// use natwire_packet::checksum::{transport_checksum, PseudoHeader};
///
/// let pseudo = PseudoHeader::new(Ipv4Addr::new(192, 168, 1, 1), Ipv4Addr::new(192, 168, 1, 2), 17);
/// let data = vec![0x00, 0x35, 0x00, 0x35, 0x00, 0x08, 0x00, 0x00];
/// let checksum = transport_checksum(&pseudo, &data);
/// ```
pub fn transport_checksum(pseudo: &PseudoHeader, data: &[u8]) -> u16 {
    let mut buffer = Vec::with_capacity(PseudoHeader::SIZE + data.len());

    buffer.extend_from_slice(&pseudo.source.octets());
    buffer.extend_from_slice(&pseudo.destination.octets());
    buffer.push(0);
    buffer.push(pseudo.protocol);
    buffer.extend_from_slice(&(data.len() as u16).to_be_bytes());
    buffer.extend_from_slice(data);

    internet_checksum(&buffer)
}

/// Validates an Internet checksum.
///
/// Summing data that includes a correct checksum field yields 0 (or 0xFFFF,
/// its one's complement twin).
pub fn validate_checksum(data: &[u8]) -> bool {
    let result = internet_checksum(data);
    result == 0 || result == 0xFFFF
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internet_checksum_empty() {
        assert_eq!(internet_checksum(&[]), 0xFFFF);
    }

    #[test]
    fn test_internet_checksum_rfc1071_example() {
        // RFC 1071 section 3 example: sum is 0xddf2, checksum its complement
        let data = [0x00, 0x01, 0xf2, 0x03, 0xf4, 0xf5, 0xf6, 0xf7];
        assert_eq!(internet_checksum(&data), !0xddf2u16);
    }

    #[test]
    fn test_internet_checksum_wikipedia_header() {
        let header = [
            0x45, 0x00, 0x00, 0x73, 0x00, 0x00, 0x40, 0x00, 0x40, 0x11, 0x00, 0x00, 0xc0, 0xa8,
            0x00, 0x01, 0xc0, 0xa8, 0x00, 0xc7,
        ];
        assert_eq!(internet_checksum(&header), 0xb861);
    }

    #[test]
    fn test_internet_checksum_odd_length() {
        // Trailing byte is treated as the high byte of a zero-padded word
        assert_eq!(internet_checksum(&[0x12]), !0x1200u16);
        assert_eq!(internet_checksum(&[0x12, 0x34, 0x56]), !(0x1234u16 + 0x5600));
    }

    #[test]
    fn test_checksum_complement_identity() {
        let data = vec![0x12, 0x34, 0x56, 0x78];
        let checksum = internet_checksum(&data);

        let mut data_with_checksum = data;
        data_with_checksum.extend_from_slice(&checksum.to_be_bytes());

        assert!(validate_checksum(&data_with_checksum));
    }

    #[test]
    fn test_transport_checksum_includes_pseudo_header() {
        let data = vec![0x00, 0x35, 0x00, 0x35, 0x00, 0x08, 0x00, 0x00];
        let a = PseudoHeader::new(Ipv4Addr::new(192, 168, 1, 1), Ipv4Addr::new(192, 168, 1, 2), 17);
        let b = PseudoHeader::new(Ipv4Addr::new(192, 168, 1, 1), Ipv4Addr::new(192, 168, 1, 3), 17);

        assert_ne!(transport_checksum(&a, &data), transport_checksum(&b, &data));

        let mut manual = Vec::new();
        manual.extend_from_slice(&[192, 168, 1, 1, 192, 168, 1, 2, 0, 17, 0, 8]);
        manual.extend_from_slice(&data);
        assert_eq!(transport_checksum(&a, &data), internet_checksum(&manual));
    }
}
