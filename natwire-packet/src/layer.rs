//! Layer descriptions and their discriminants
//!
//! A packet is described as an ordered stack of [`Layer`] values, outermost
//! first. [`LayerType`] names the kind of a layer without its contents; it
//! also names IPv6, which can be declared as an Ethernet or loopback payload
//! type but never constructed.

use crate::ethernet::EthernetFrame;
use crate::icmp::Icmpv4Message;
use crate::ip::Ipv4Header;
use crate::loopback::LoopbackHeader;
use crate::tcp::TcpSegment;
use crate::udp::UdpDatagram;
use std::fmt;

/// Kind of a layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerType {
    Ethernet,
    Loopback,
    Ipv4,
    Ipv6,
    Tcp,
    Udp,
    Icmpv4,
    Payload,
}

impl LayerType {
    /// Short protocol name used in logs and errors
    pub fn name(self) -> &'static str {
        match self {
            LayerType::Ethernet => "Ethernet",
            LayerType::Loopback => "Loopback",
            LayerType::Ipv4 => "IPv4",
            LayerType::Ipv6 => "IPv6",
            LayerType::Tcp => "TCP",
            LayerType::Udp => "UDP",
            LayerType::Icmpv4 => "ICMPv4",
            LayerType::Payload => "Payload",
        }
    }
}

impl fmt::Display for LayerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Anything that can report which kind of layer it is
pub trait HasLayerType {
    fn layer_type(&self) -> LayerType;
}

impl HasLayerType for LayerType {
    fn layer_type(&self) -> LayerType {
        *self
    }
}

impl HasLayerType for EthernetFrame {
    fn layer_type(&self) -> LayerType {
        LayerType::Ethernet
    }
}

impl HasLayerType for LoopbackHeader {
    fn layer_type(&self) -> LayerType {
        LayerType::Loopback
    }
}

impl HasLayerType for Ipv4Header {
    fn layer_type(&self) -> LayerType {
        LayerType::Ipv4
    }
}

impl HasLayerType for TcpSegment {
    fn layer_type(&self) -> LayerType {
        LayerType::Tcp
    }
}

impl HasLayerType for UdpDatagram {
    fn layer_type(&self) -> LayerType {
        LayerType::Udp
    }
}

impl HasLayerType for Icmpv4Message {
    fn layer_type(&self) -> LayerType {
        LayerType::Icmpv4
    }
}

/// One layer of a packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Layer {
    Ethernet(EthernetFrame),
    Loopback(LoopbackHeader),
    Ipv4(Ipv4Header),
    Tcp(TcpSegment),
    Udp(UdpDatagram),
    Icmpv4(Icmpv4Message),
    /// Application bytes carried by the innermost header
    Payload(Vec<u8>),
}

impl HasLayerType for Layer {
    fn layer_type(&self) -> LayerType {
        match self {
            Layer::Ethernet(_) => LayerType::Ethernet,
            Layer::Loopback(_) => LayerType::Loopback,
            Layer::Ipv4(_) => LayerType::Ipv4,
            Layer::Tcp(_) => LayerType::Tcp,
            Layer::Udp(_) => LayerType::Udp,
            Layer::Icmpv4(_) => LayerType::Icmpv4,
            Layer::Payload(_) => LayerType::Payload,
        }
    }
}

impl From<EthernetFrame> for Layer {
    fn from(frame: EthernetFrame) -> Self {
        Layer::Ethernet(frame)
    }
}

impl From<LoopbackHeader> for Layer {
    fn from(header: LoopbackHeader) -> Self {
        Layer::Loopback(header)
    }
}

impl From<Ipv4Header> for Layer {
    fn from(header: Ipv4Header) -> Self {
        Layer::Ipv4(header)
    }
}

impl From<TcpSegment> for Layer {
    fn from(segment: TcpSegment) -> Self {
        Layer::Tcp(segment)
    }
}

impl From<UdpDatagram> for Layer {
    fn from(datagram: UdpDatagram) -> Self {
        Layer::Udp(datagram)
    }
}

impl From<Icmpv4Message> for Layer {
    fn from(message: Icmpv4Message) -> Self {
        Layer::Icmpv4(message)
    }
}
