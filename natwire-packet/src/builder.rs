//! Layer factory
//!
//! Pure constructors for the layers the NAT pipeline originates: Ethernet
//! or loopback framing, IPv4 headers, the four TCP segments of the handshake/relay logic,
//! and UDP headers. Lengths and checksums are never supplied here; the
//! [`serialize`](crate::serialize) step computes them from the final bytes.
//!
//! A transport layer is tied to its IPv4 header by position: the serializer
//! takes the pseudo-header for a TCP or UDP layer from the IPv4 layer placed
//! directly before it.

use crate::ethernet::{EtherType, EthernetFrame, MacAddress};
use crate::ip::{IpProtocol, Ipv4Header};
use crate::layer::{HasLayerType, LayerType};
use crate::loopback::{LoopbackHeader, ProtocolFamily};
use crate::tcp::{TcpFlags, TcpSegment};
use crate::udp::UdpDatagram;
use natwire_core::{Error, Result};
use std::convert::Infallible;
use std::net::{IpAddr, Ipv4Addr};
use tracing::{debug, trace};

/// Window advertised by every factory-built TCP segment
pub const TCP_WINDOW: u16 = 65535;

/// 4-byte form of an address: plain IPv4 or IPv4-mapped IPv6
fn ipv4_form(address: IpAddr) -> Option<Ipv4Addr> {
    match address {
        IpAddr::V4(v4) => Some(v4),
        IpAddr::V6(v6) => v6.to_ipv4_mapped(),
    }
}

fn require_ipv4(address: IpAddr) -> Result<Ipv4Addr> {
    ipv4_form(address).ok_or_else(|| {
        debug!("Rejecting IPv4 header with address {}", address);
        Error::InvalidAddress {
            layer: "IPv4",
            address,
        }
    })
}

/// Build an Ethernet header whose EtherType is derived from `next`.
///
/// Only IPv4 and IPv6 may be carried. IPv6 is accepted here even though
/// IPv6 headers cannot be built, so a frame may still declare it.
pub fn build_ethernet<L: HasLayerType + ?Sized>(
    src_mac: MacAddress,
    dst_mac: MacAddress,
    next: &L,
) -> Result<EthernetFrame> {
    let ethertype = match next.layer_type() {
        LayerType::Ipv4 => EtherType::IPv4,
        LayerType::Ipv6 => EtherType::IPv6,
        other => {
            debug!("Rejecting Ethernet frame carrying {}", other);
            return Err(Error::UnsupportedLayer {
                layer: "Ethernet",
                carried: other.to_string(),
            });
        }
    };

    trace!("Built Ethernet {} -> {} ({})", src_mac, dst_mac, ethertype);
    Ok(EthernetFrame::new(dst_mac, src_mac, ethertype))
}

/// Build a BSD loopback header whose family is derived from `next`.
///
/// As with Ethernet, IPv4 and IPv6 are the only carried types; IPv6 is
/// written with the BSD family value.
pub fn build_loopback<L: HasLayerType + ?Sized>(next: &L) -> Result<LoopbackHeader> {
    let family = match next.layer_type() {
        LayerType::Ipv4 => ProtocolFamily::IPv4,
        LayerType::Ipv6 => ProtocolFamily::IPv6Bsd,
        other => {
            debug!("Rejecting loopback header carrying {}", other);
            return Err(Error::UnsupportedLayer {
                layer: "Loopback",
                carried: other.to_string(),
            });
        }
    };

    trace!("Built loopback header ({})", family);
    Ok(LoopbackHeader::new(family))
}

/// Build an IPv4 header (IHL 5, DF set) for a TCP or UDP `transport`.
///
/// Both addresses must have a 4-byte form, otherwise
/// [`Error::InvalidAddress`]. Any transport other than TCP or UDP fails with
/// [`Error::UnsupportedLayer`].
pub fn build_ipv4<T: HasLayerType + ?Sized>(
    src_ip: IpAddr,
    dst_ip: IpAddr,
    id: u16,
    ttl: u8,
    transport: &T,
) -> Result<Ipv4Header> {
    let source = require_ipv4(src_ip)?;
    let destination = require_ipv4(dst_ip)?;

    let protocol = match transport.layer_type() {
        LayerType::Tcp => IpProtocol::TCP,
        LayerType::Udp => IpProtocol::UDP,
        other => {
            debug!("Rejecting IPv4 header carrying {}", other);
            return Err(Error::UnsupportedLayer {
                layer: "IPv4",
                carried: other.to_string(),
            });
        }
    };

    trace!(
        "Built IPv4 {} -> {} id={} ttl={} ({})",
        source,
        destination,
        id,
        ttl,
        protocol
    );
    Ok(Ipv4Header::new(source, destination, protocol)
        .with_identification(id)
        .with_ttl(ttl))
}

/// IPv6 headers are never built.
///
/// Fails with [`Error::InvalidAddress`] when either address is really an
/// IPv4 (or IPv4-mapped) address, and with [`Error::Unsupported`] otherwise.
pub fn build_ipv6<T: HasLayerType + ?Sized>(
    src_ip: IpAddr,
    dst_ip: IpAddr,
    _transport: &T,
) -> Result<Infallible> {
    if let Some(address) = [src_ip, dst_ip]
        .into_iter()
        .find(|address| ipv4_form(*address).is_some())
    {
        debug!("Rejecting IPv6 header with address {}", address);
        return Err(Error::InvalidAddress {
            layer: "IPv6",
            address,
        });
    }

    debug!("Rejecting IPv6 header {} -> {}", src_ip, dst_ip);
    Err(Error::Unsupported("IPv6 header construction".into()))
}

fn build_tcp(src_port: u16, dst_port: u16, seq: u32, ack: u32, flags: TcpFlags) -> TcpSegment {
    trace!(
        "Built TCP {} -> {} seq={} ack={} [{}]",
        src_port,
        dst_port,
        seq,
        ack,
        flags
    );
    TcpSegment::new(src_port, dst_port, seq, ack, flags, TCP_WINDOW)
}

/// SYN segment opening a connection
pub fn build_tcp_syn(src_port: u16, dst_port: u16, seq: u32) -> TcpSegment {
    build_tcp(src_port, dst_port, seq, 0, TcpFlags::SYN)
}

/// SYN+ACK segment answering a SYN
pub fn build_tcp_syn_ack(src_port: u16, dst_port: u16, seq: u32, ack: u32) -> TcpSegment {
    build_tcp(src_port, dst_port, seq, ack, TcpFlags::SYN_ACK)
}

/// Bare ACK segment
pub fn build_tcp_ack(src_port: u16, dst_port: u16, seq: u32, ack: u32) -> TcpSegment {
    build_tcp(src_port, dst_port, seq, ack, TcpFlags::ACK)
}

/// PSH+ACK segment carrying relayed data
pub fn build_tcp_push(src_port: u16, dst_port: u16, seq: u32, ack: u32) -> TcpSegment {
    build_tcp(src_port, dst_port, seq, ack, TcpFlags::PSH_ACK)
}

/// UDP header; length and checksum are left for serialization
pub fn build_udp(src_port: u16, dst_port: u16) -> UdpDatagram {
    trace!("Built UDP {} -> {}", src_port, dst_port);
    UdpDatagram::new(src_port, dst_port)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::icmp::{Icmpv4Message, Icmpv4Type, Icmpv4TypeCode};
    use std::net::Ipv6Addr;

    fn v4(a: u8, b: u8, c: u8, d: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(a, b, c, d))
    }

    #[test]
    fn test_build_ethernet_ethertype_from_next_layer() {
        let src = MacAddress([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
        let dst = MacAddress::BROADCAST;
        let udp = build_udp(1, 2);
        let ip = build_ipv4(v4(10, 0, 0, 1), v4(10, 0, 0, 2), 1, 64, &udp).unwrap();

        let frame = build_ethernet(src, dst, &ip).unwrap();
        assert_eq!(frame.ethertype, EtherType::IPv4);
        assert_eq!(frame.source, src);
        assert_eq!(frame.destination, dst);

        let frame = build_ethernet(src, dst, &LayerType::Ipv6).unwrap();
        assert_eq!(frame.ethertype, EtherType::IPv6);
    }

    #[test]
    fn test_build_ethernet_rejects_non_network_layer() {
        let udp = build_udp(1, 2);
        let err = build_ethernet(MacAddress::ZERO, MacAddress::ZERO, &udp).unwrap_err();
        assert!(matches!(err, Error::UnsupportedLayer { layer: "Ethernet", ref carried } if carried == "UDP"));
    }

    #[test]
    fn test_build_loopback_family_from_next_layer() {
        let udp = build_udp(1, 2);
        let ip = build_ipv4(v4(127, 0, 0, 1), v4(127, 0, 0, 1), 1, 64, &udp).unwrap();

        assert_eq!(build_loopback(&ip).unwrap().family, ProtocolFamily::IPv4);
        assert_eq!(
            build_loopback(&LayerType::Ipv6).unwrap().family,
            ProtocolFamily::IPv6Bsd
        );

        let err = build_loopback(&udp).unwrap_err();
        assert!(matches!(err, Error::UnsupportedLayer { layer: "Loopback", ref carried } if carried == "UDP"));
    }

    #[test]
    fn test_build_ipv4_fields() {
        let syn = build_tcp_syn(1234, 80, 1000);
        let ip = build_ipv4(v4(10, 0, 0, 1), v4(93, 184, 216, 34), 1, 64, &syn).unwrap();

        assert_eq!(ip.version, 4);
        assert_eq!(ip.ihl, 5);
        assert!(ip.flags.dont_fragment);
        assert_eq!(ip.identification, 1);
        assert_eq!(ip.ttl, 64);
        assert_eq!(ip.protocol, IpProtocol::TCP);
        assert_eq!(ip.source, Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(ip.destination, Ipv4Addr::new(93, 184, 216, 34));
        assert_eq!(ip.total_length, 0);
        assert_eq!(ip.checksum, 0);
    }

    #[test]
    fn test_build_ipv4_accepts_mapped_addresses() {
        let mapped = IpAddr::V6(Ipv4Addr::new(192, 0, 2, 7).to_ipv6_mapped());
        let ip = build_ipv4(mapped, v4(10, 0, 0, 2), 0, 64, &build_udp(1, 2)).unwrap();
        assert_eq!(ip.source, Ipv4Addr::new(192, 0, 2, 7));
        assert_eq!(ip.protocol, IpProtocol::UDP);
    }

    #[test]
    fn test_build_ipv4_rejects_ipv6_addresses() {
        let v6 = IpAddr::V6(Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 1));
        let udp = build_udp(1, 2);

        let err = build_ipv4(v6, v4(10, 0, 0, 2), 0, 64, &udp).unwrap_err();
        assert!(matches!(err, Error::InvalidAddress { layer: "IPv4", address } if address == v6));

        let err = build_ipv4(v4(10, 0, 0, 1), v6, 0, 64, &udp).unwrap_err();
        assert!(matches!(err, Error::InvalidAddress { address, .. } if address == v6));
    }

    #[test]
    fn test_build_ipv4_rejects_other_transports() {
        let icmp = Icmpv4Message::new(
            Icmpv4TypeCode::new(Icmpv4Type::EchoRequest, 0),
            1,
            1,
            Vec::new(),
        );
        let err = build_ipv4(v4(10, 0, 0, 1), v4(10, 0, 0, 2), 0, 64, &icmp).unwrap_err();
        assert!(matches!(err, Error::UnsupportedLayer { layer: "IPv4", .. }));

        let err = build_ipv4(v4(10, 0, 0, 1), v4(10, 0, 0, 2), 0, 64, &LayerType::Payload)
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedLayer { .. }));
    }

    #[test]
    fn test_build_ipv6_always_fails() {
        let udp = build_udp(1, 2);
        let a = IpAddr::V6(Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 1));
        let b = IpAddr::V6(Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 2));
        let mapped = IpAddr::V6(Ipv4Addr::new(10, 0, 0, 1).to_ipv6_mapped());

        assert!(matches!(
            build_ipv6(a, b, &udp).unwrap_err(),
            Error::Unsupported(_)
        ));
        assert!(matches!(
            build_ipv6(v4(10, 0, 0, 1), b, &udp).unwrap_err(),
            Error::InvalidAddress { layer: "IPv6", .. }
        ));
        assert!(matches!(
            build_ipv6(a, mapped, &udp).unwrap_err(),
            Error::InvalidAddress { address, .. } if address == mapped
        ));
    }

    #[test]
    fn test_build_tcp_variants() {
        let syn = build_tcp_syn(1234, 80, 1000);
        assert_eq!(syn.flags, TcpFlags::SYN);
        assert_eq!(syn.acknowledgment_number, 0);

        let syn_ack = build_tcp_syn_ack(80, 1234, 5000, 1001);
        assert_eq!(syn_ack.flags, TcpFlags::SYN_ACK);
        assert_eq!(syn_ack.acknowledgment_number, 1001);

        let ack = build_tcp_ack(1234, 80, 1001, 5001);
        assert_eq!(ack.flags, TcpFlags::ACK);

        let push = build_tcp_push(1234, 80, 1001, 5001);
        assert_eq!(push.flags, TcpFlags::PSH_ACK);

        for segment in [syn, syn_ack, ack, push] {
            assert_eq!(segment.data_offset, 5);
            assert_eq!(segment.window_size, TCP_WINDOW);
            assert_eq!(segment.checksum, 0);
        }
    }

    #[test]
    fn test_build_udp() {
        let udp = build_udp(5000, 53);
        assert_eq!(udp.source_port, 5000);
        assert_eq!(udp.destination_port, 53);
        assert_eq!(udp.length, 0);
    }
}
