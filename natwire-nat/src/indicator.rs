//! ICMPv4 indicator
//!
//! An [`Icmpv4Indicator`] is an ICMPv4 message that has been classified and,
//! for error messages, had its quoted packet decoded. Error messages quote
//! the IPv4 header of the packet that failed plus the first 8 bytes of its
//! transport header (RFC 792); that is all the indicator relies on.

use natwire_core::{Error, Result};
use natwire_packet::icmp::{classify, Icmpv4Class, Icmpv4Message, Icmpv4TypeCode};
use natwire_packet::ip::{IpProtocol, Ipv4Header};
use natwire_packet::tcp::TcpSegment;
use natwire_packet::udp::UdpDatagram;
use std::net::Ipv4Addr;
use tracing::{debug, trace};

/// Transport bytes an ICMPv4 error is required to quote
pub const QUOTED_TRANSPORT_SIZE: usize = 8;

/// Transport header found inside an ICMPv4 error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbeddedTransport {
    /// TCP header; with an 8-byte quote only ports and sequence are set
    Tcp(TcpSegment),
    Udp(UdpDatagram),
    /// Nested ICMPv4 header
    Icmpv4(Icmpv4Message),
    /// Quote of an IPv4 fragment; the bytes are not a transport header
    Fragment { data: Vec<u8> },
    /// Any other IP protocol, kept as the quoted bytes
    Other { protocol: IpProtocol, data: Vec<u8> },
}

impl EmbeddedTransport {
    /// Name used in errors and logs
    pub fn name(&self) -> String {
        match self {
            EmbeddedTransport::Tcp(_) => "TCP".to_string(),
            EmbeddedTransport::Udp(_) => "UDP".to_string(),
            EmbeddedTransport::Icmpv4(_) => "ICMPv4".to_string(),
            EmbeddedTransport::Fragment { .. } => "IPv4 fragment".to_string(),
            EmbeddedTransport::Other { protocol, .. } => protocol.to_string(),
        }
    }
}

/// Packet quoted by an ICMPv4 error message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedPacket {
    /// Quoted IPv4 header
    pub network: Ipv4Header,
    /// Quoted transport header
    pub transport: EmbeddedTransport,
    /// Number of transport bytes present in the quote
    pub quoted_len: usize,
}

impl EmbeddedPacket {
    /// Decode the payload of an ICMPv4 error message
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let (network, quoted) = Ipv4Header::parse(payload).map_err(|err| match err {
            Error::Truncated {
                needed, available, ..
            } => Error::MissingNetworkLayer { needed, available },
            // IHL below 5 leaves no room for a header
            Error::Malformed { .. } => Error::MissingNetworkLayer {
                needed: Ipv4Header::MIN_HEADER_SIZE,
                available: payload.len(),
            },
            other => other,
        })?;

        if quoted.len() < QUOTED_TRANSPORT_SIZE {
            return Err(Error::MissingTransportLayer {
                needed: QUOTED_TRANSPORT_SIZE,
                available: quoted.len(),
            });
        }

        let transport = if network.is_fragment() {
            EmbeddedTransport::Fragment {
                data: quoted.to_vec(),
            }
        } else {
            match network.protocol {
                IpProtocol::TCP => EmbeddedTransport::Tcp(TcpSegment::parse_quoted(quoted)?),
                IpProtocol::UDP => EmbeddedTransport::Udp(UdpDatagram::parse(quoted)?.0),
                IpProtocol::ICMP => EmbeddedTransport::Icmpv4(Icmpv4Message::parse(quoted)?),
                protocol => EmbeddedTransport::Other {
                    protocol,
                    data: quoted.to_vec(),
                },
            }
        };

        Ok(EmbeddedPacket {
            network,
            transport,
            quoted_len: quoted.len(),
        })
    }
}

/// Classified ICMPv4 message with its decoded quote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Icmpv4Indicator {
    message: Icmpv4Message,
    class: Icmpv4Class,
    embedded: Option<EmbeddedPacket>,
}

impl Icmpv4Indicator {
    /// Classify `message` and, for error types, decode the packet it quotes.
    ///
    /// Query messages carry no embedded packet. Error messages fail with
    /// [`Error::MissingNetworkLayer`] when the quote cannot hold an IPv4
    /// header, [`Error::UnsupportedIpVersion`] when it is not IPv4, and
    /// [`Error::MissingTransportLayer`] when fewer than 8 transport bytes
    /// follow the header. A quoted fragment is kept as
    /// [`EmbeddedTransport::Fragment`] and never decoded as a transport
    /// header.
    pub fn parse(message: Icmpv4Message) -> Result<Self> {
        let class = message.type_code.class().map_err(|err| {
            debug!("Rejecting ICMPv4 message: {}", err);
            err
        })?;

        let embedded = match class {
            Icmpv4Class::Query => None,
            Icmpv4Class::Error => {
                let embedded = EmbeddedPacket::parse(&message.payload).map_err(|err| {
                    debug!("Rejecting ICMPv4 {}: {}", message.type_code, err);
                    err
                })?;
                Some(embedded)
            }
        };

        trace!(
            "Parsed ICMPv4 {} ({:?}), embedded {}",
            message.type_code,
            class,
            embedded
                .as_ref()
                .map_or_else(|| "none".to_string(), |e| e.transport.name())
        );

        Ok(Icmpv4Indicator {
            message,
            class,
            embedded,
        })
    }

    /// Decode an ICMPv4 message from `data`, then [`parse`](Self::parse) it
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::parse(Icmpv4Message::parse(data)?)
    }

    /// The message this indicator was built from
    pub fn message(&self) -> &Icmpv4Message {
        &self.message
    }

    pub fn type_code(&self) -> Icmpv4TypeCode {
        self.message.type_code
    }

    pub fn class(&self) -> Icmpv4Class {
        self.class
    }

    pub fn is_query(&self) -> bool {
        self.class == Icmpv4Class::Query
    }

    /// Identifier of the outer message
    pub fn identifier(&self) -> u16 {
        self.message.identifier
    }

    /// Quoted packet; `None` for query messages
    pub fn embedded_packet(&self) -> Option<&EmbeddedPacket> {
        self.embedded.as_ref()
    }

    fn embedded(&self, accessor: &'static str) -> Result<&EmbeddedPacket> {
        self.embedded
            .as_ref()
            .ok_or(Error::NoEmbeddedPacket { accessor })
    }

    pub fn embedded_source_address(&self) -> Result<Ipv4Addr> {
        Ok(self.embedded("embedded_source_address")?.network.source)
    }

    pub fn embedded_destination_address(&self) -> Result<Ipv4Addr> {
        Ok(self.embedded("embedded_destination_address")?.network.destination)
    }

    /// Source port of an embedded TCP or UDP header
    pub fn embedded_source_port(&self) -> Result<u16> {
        const ACCESSOR: &str = "embedded_source_port";
        match &self.embedded(ACCESSOR)?.transport {
            EmbeddedTransport::Tcp(segment) => Ok(segment.source_port),
            EmbeddedTransport::Udp(datagram) => Ok(datagram.source_port),
            other => Err(wrong_type(ACCESSOR, "TCP or UDP", other)),
        }
    }

    /// Destination port of an embedded TCP or UDP header
    pub fn embedded_destination_port(&self) -> Result<u16> {
        const ACCESSOR: &str = "embedded_destination_port";
        match &self.embedded(ACCESSOR)?.transport {
            EmbeddedTransport::Tcp(segment) => Ok(segment.destination_port),
            EmbeddedTransport::Udp(datagram) => Ok(datagram.destination_port),
            other => Err(wrong_type(ACCESSOR, "TCP or UDP", other)),
        }
    }

    /// Identifier of an embedded ICMPv4 header
    pub fn embedded_identifier(&self) -> Result<u16> {
        const ACCESSOR: &str = "embedded_identifier";
        match &self.embedded(ACCESSOR)?.transport {
            EmbeddedTransport::Icmpv4(message) => Ok(message.identifier),
            other => Err(wrong_type(ACCESSOR, "ICMPv4", other)),
        }
    }

    /// Whether the embedded ICMPv4 header is a query.
    ///
    /// An embedded type outside both classes fails with
    /// [`Error::UnsupportedIcmpType`].
    pub fn is_embedded_query(&self) -> Result<bool> {
        const ACCESSOR: &str = "is_embedded_query";
        match &self.embedded(ACCESSOR)?.transport {
            EmbeddedTransport::Icmpv4(message) => {
                Ok(message.type_code.class()? == Icmpv4Class::Query)
            }
            other => Err(wrong_type(ACCESSOR, "ICMPv4", other)),
        }
    }

    /// Copy of the outer message reduced to type, code, identifier and
    /// sequence, for re-serialization after translation
    pub fn to_pure_message(&self) -> Icmpv4Message {
        Icmpv4Message::new(
            self.message.type_code,
            self.message.identifier,
            self.message.sequence,
            Vec::new(),
        )
    }
}

fn wrong_type(accessor: &'static str, expected: &'static str, found: &EmbeddedTransport) -> Error {
    Error::WrongEmbeddedType {
        accessor,
        expected,
        found: found.name(),
    }
}
