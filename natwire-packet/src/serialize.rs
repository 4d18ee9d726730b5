//! Layer stack serialization
//!
//! Layers are written innermost first so every header sees the exact bytes
//! it carries when its length and checksum fields are computed.

use crate::checksum::PseudoHeader;
use crate::ethernet::EthernetFrame;
use crate::ip::{IpProtocol, Ipv4Header};
use crate::layer::Layer;
use crate::udp::UdpDatagram;
use bytes::{BufMut, BytesMut};
use natwire_core::{Error, Result};
use tracing::trace;

/// Largest header a 4-bit length-in-words field can describe
const MAX_HEADER_SIZE: usize = 60;

/// Serializer configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerializeOptions {
    /// Recompute IPv4, TCP, UDP and ICMPv4 checksums
    pub compute_checksums: bool,
    /// Recompute IPv4 total length and IHL, TCP data offset and UDP length
    pub fix_lengths: bool,
}

impl SerializeOptions {
    /// Write every field exactly as populated
    pub const RAW: SerializeOptions = SerializeOptions {
        compute_checksums: false,
        fix_lengths: false,
    };
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            compute_checksums: true,
            fix_lengths: true,
        }
    }
}

/// Serialize `layers` (outermost first), computing lengths and checksums
pub fn serialize(layers: &[Layer]) -> Result<Vec<u8>> {
    serialize_with(SerializeOptions::default(), layers)
}

/// Serialize `layers` without touching any field
pub fn serialize_raw(layers: &[Layer]) -> Result<Vec<u8>> {
    serialize_with(SerializeOptions::RAW, layers)
}

/// Serialize `layers` (outermost first) under `options`.
///
/// A TCP or UDP checksum is computed over the pseudo-header of the IPv4
/// layer placed directly before it. Ethernet frames are zero-padded to
/// [`EthernetFrame::MIN_FRAME_SIZE`] in every mode.
pub fn serialize_with(options: SerializeOptions, layers: &[Layer]) -> Result<Vec<u8>> {
    let mut tail = BytesMut::new();

    for (index, layer) in layers.iter().enumerate().rev() {
        let mut buffer = BytesMut::with_capacity(MAX_HEADER_SIZE + tail.len());

        match layer {
            Layer::Ethernet(frame) => frame.write_to(&mut buffer),
            Layer::Loopback(header) => header.write_to(&mut buffer),
            Layer::Ipv4(header) => {
                let mut header = header.clone();
                if options.fix_lengths {
                    header.ihl = header_words("IPv4", header.header_len())?;
                    header.total_length = length_field("IPv4", header.header_len() + tail.len())?;
                }
                if options.compute_checksums {
                    header.calculate_checksum();
                }
                header.write_to(&mut buffer);
            }
            Layer::Tcp(segment) => {
                let mut segment = segment.clone();
                if options.fix_lengths {
                    segment.data_offset = header_words("TCP", segment.header_len())?;
                }
                if options.compute_checksums {
                    let pseudo = pseudo_header(layers, index, IpProtocol::TCP, "TCP")?;
                    segment.calculate_checksum(&pseudo, &tail);
                }
                segment.write_to(&mut buffer);
            }
            Layer::Udp(datagram) => {
                let mut datagram = datagram.clone();
                if options.fix_lengths {
                    datagram.length = length_field("UDP", UdpDatagram::HEADER_SIZE + tail.len())?;
                }
                if options.compute_checksums {
                    let pseudo = pseudo_header(layers, index, IpProtocol::UDP, "UDP")?;
                    datagram.calculate_checksum(&pseudo, &tail);
                }
                datagram.write_to(&mut buffer);
            }
            Layer::Icmpv4(message) => {
                let mut message = message.clone();
                if options.compute_checksums {
                    message.calculate_checksum(&tail);
                }
                message.write_to(&mut buffer);
            }
            Layer::Payload(data) => buffer.put_slice(data),
        }

        buffer.put_slice(&tail);

        if let Layer::Ethernet(_) = layer {
            let short = EthernetFrame::MIN_FRAME_SIZE.saturating_sub(buffer.len());
            buffer.put_bytes(0, short);
        }

        tail = buffer;
    }

    trace!("Serialized {} layers into {} bytes", layers.len(), tail.len());
    Ok(tail.to_vec())
}

/// Pseudo-header from the IPv4 layer directly before `index`, which must
/// name `protocol`
fn pseudo_header(
    layers: &[Layer],
    index: usize,
    protocol: IpProtocol,
    layer: &'static str,
) -> Result<PseudoHeader> {
    match index.checked_sub(1).and_then(|i| layers.get(i)) {
        Some(Layer::Ipv4(header)) if header.protocol == protocol => {
            Ok(header.pseudo_header(protocol))
        }
        Some(Layer::Ipv4(header)) => Err(Error::serialization(
            layer,
            format!("IPv4 header carries {} not {}", header.protocol, protocol),
        )),
        _ => Err(Error::serialization(
            layer,
            "missing network layer for checksum pseudo-header",
        )),
    }
}

fn header_words(layer: &'static str, header_len: usize) -> Result<u8> {
    if header_len > MAX_HEADER_SIZE {
        return Err(Error::serialization(
            layer,
            format!("header length {} exceeds {}", header_len, MAX_HEADER_SIZE),
        ));
    }
    Ok((header_len / 4) as u8)
}

fn length_field(layer: &'static str, length: usize) -> Result<u16> {
    u16::try_from(length).map_err(|_| {
        Error::serialization(
            layer,
            format!("length {} exceeds {}", length, Ipv4Header::MAX_PACKET_SIZE),
        )
    })
}
