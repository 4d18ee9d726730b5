//! Layer stack decoding
//!
//! Turns a captured buffer back into the [`Layer`] stack the serializer
//! accepts, so received frames and datagrams can be handed to the ICMPv4
//! indicator.

use crate::ethernet::{EtherType, EthernetFrame};
use crate::icmp::Icmpv4Message;
use crate::ip::{IpProtocol, Ipv4Header};
use crate::layer::{Layer, LayerType};
use crate::loopback::{LoopbackHeader, ProtocolFamily};
use crate::tcp::TcpSegment;
use crate::udp::UdpDatagram;
use natwire_core::{Error, Result};
use tracing::trace;

/// Decode `data` into layers, starting with a `first` layer.
///
/// Decoding follows the EtherType, loopback family and IPv4 protocol fields. Bytes no known
/// header claims become a trailing [`Layer::Payload`]; an ICMPv4 message
/// keeps its own payload. Ethernet padding beyond the IPv4 total length is
/// dropped.
pub fn decode(data: &[u8], first: LayerType) -> Result<Vec<Layer>> {
    let mut layers = Vec::new();
    let mut rest = data;
    let mut next = Some(first);

    while let Some(layer_type) = next.take() {
        match layer_type {
            LayerType::Ethernet => {
                let (frame, payload) = EthernetFrame::parse(rest)?;
                next = match frame.ethertype {
                    EtherType::IPv4 => Some(LayerType::Ipv4),
                    EtherType::IPv6 => Some(LayerType::Ipv6),
                    _ => Some(LayerType::Payload),
                };
                layers.push(Layer::Ethernet(frame));
                rest = payload;
            }
            LayerType::Loopback => {
                let (header, payload) = LoopbackHeader::parse(rest)?;
                next = match header.family {
                    ProtocolFamily::IPv4 => Some(LayerType::Ipv4),
                    family if family.is_ipv6() => Some(LayerType::Ipv6),
                    _ => Some(LayerType::Payload),
                };
                layers.push(Layer::Loopback(header));
                rest = payload;
            }
            LayerType::Ipv4 => {
                let (header, payload) = Ipv4Header::parse(rest)?;
                next = match header.protocol {
                    IpProtocol::TCP => Some(LayerType::Tcp),
                    IpProtocol::UDP => Some(LayerType::Udp),
                    IpProtocol::ICMP => Some(LayerType::Icmpv4),
                    IpProtocol::Custom(_) => Some(LayerType::Payload),
                };
                layers.push(Layer::Ipv4(header));
                rest = payload;
            }
            LayerType::Ipv6 => {
                return Err(Error::Unsupported("IPv6 decoding".into()));
            }
            LayerType::Tcp => {
                let (segment, payload) = TcpSegment::parse(rest)?;
                layers.push(Layer::Tcp(segment));
                next = Some(LayerType::Payload);
                rest = payload;
            }
            LayerType::Udp => {
                let (datagram, payload) = UdpDatagram::parse(rest)?;
                layers.push(Layer::Udp(datagram));
                next = Some(LayerType::Payload);
                rest = payload;
            }
            LayerType::Icmpv4 => {
                layers.push(Layer::Icmpv4(Icmpv4Message::parse(rest)?));
            }
            LayerType::Payload => {
                if !rest.is_empty() {
                    layers.push(Layer::Payload(rest.to_vec()));
                }
            }
        }
    }

    trace!("Decoded {} bytes into {} layers", data.len(), layers.len());
    Ok(layers)
}
