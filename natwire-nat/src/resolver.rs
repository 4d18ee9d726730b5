//! NAT endpoint resolution for ICMPv4 errors
//!
//! An ICMPv4 error travels in the opposite direction of the packet it
//! quotes. The session it belongs to is therefore found by flipping the
//! quoted flow: the error's NAT source is the quoted destination and its NAT
//! destination is the quoted source.

use crate::indicator::{EmbeddedTransport, Icmpv4Indicator};
use natwire_core::{Error, NatEndpoint, Result};
use natwire_packet::icmp::Icmpv4Class;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Source,
    Destination,
}

/// NAT source endpoint of an ICMPv4 error: the quoted destination
pub fn nat_source(indicator: &Icmpv4Indicator) -> Result<NatEndpoint> {
    resolve(indicator, Side::Source)
}

/// NAT destination endpoint of an ICMPv4 error: the quoted source
pub fn nat_destination(indicator: &Icmpv4Indicator) -> Result<NatEndpoint> {
    resolve(indicator, Side::Destination)
}

/// Both NAT endpoints as `(source, destination)`
pub fn nat_endpoints(indicator: &Icmpv4Indicator) -> Result<(NatEndpoint, NatEndpoint)> {
    Ok((nat_source(indicator)?, nat_destination(indicator)?))
}

fn resolve(indicator: &Icmpv4Indicator, side: Side) -> Result<NatEndpoint> {
    let embedded = match indicator.embedded_packet() {
        Some(embedded) if !indicator.is_query() => embedded,
        _ => {
            let icmp_type = indicator.type_code().icmp_type.to_u8();
            debug!("Cannot resolve NAT endpoints of ICMPv4 query type {}", icmp_type);
            return Err(Error::QueryNotSupported(icmp_type));
        }
    };

    let address = match side {
        Side::Source => embedded.network.destination,
        Side::Destination => embedded.network.source,
    };

    let endpoint = match &embedded.transport {
        EmbeddedTransport::Tcp(segment) => NatEndpoint::AddressPort {
            address,
            port: match side {
                Side::Source => segment.destination_port,
                Side::Destination => segment.source_port,
            },
        },
        EmbeddedTransport::Udp(datagram) => NatEndpoint::AddressPort {
            address,
            port: match side {
                Side::Source => datagram.destination_port,
                Side::Destination => datagram.source_port,
            },
        },
        // The identifier names the query on both sides
        EmbeddedTransport::Icmpv4(message) => match message.type_code.class()? {
            Icmpv4Class::Query => NatEndpoint::AddressId {
                address,
                id: message.identifier,
            },
            Icmpv4Class::Error => NatEndpoint::AddressOnly { address },
        },
        other => {
            debug!("No NAT rule for embedded {}", other.name());
            return Err(Error::UnsupportedEmbeddedType(other.name()));
        }
    };

    trace!("Resolved NAT {:?} endpoint {}", side, endpoint);
    Ok(endpoint)
}
