//! Packet construction and parsing for the natwire NAT gateway
//!
//! This crate builds and parses the headers a NAT gateway originates and
//! inspects, from layer 2 (Ethernet) to layer 4 (TCP/UDP/ICMPv4):
//!
//! - **Ethernet II** headers for IPv4 (and declared IPv6) payloads
//! - **BSD loopback** headers for packets on `DLT_NULL` interfaces
//! - **IPv4** headers with header checksum
//! - **TCP** and **UDP** headers with pseudo-header checksums
//! - **ICMPv4** messages and their query/error classification
//!
//! # Architecture
//!
//! - [`builder`] - Layer factory: pure per-layer constructors
//! - [`serialize`] - Inside-out serialization with computed or raw fields
//! - [`decode`] - Captured bytes back into a layer stack
//! - [`layer`] - The [`Layer`] stack element and its [`LayerType`]
//! - [`ethernet`], [`loopback`], [`ip`], [`tcp`], [`udp`], [`icmp`] - Wire codecs
//! - [`checksum`] - Internet checksum and TCP/UDP pseudo-header
//!
//! # Quick Start
//!
//! ```rust
//! use std::net::{IpAddr, Ipv4Addr};
//! use natwire_packet::builder::{build_ipv4, build_tcp_syn};
//! use natwire_packet::serialize;
//!
//! let tcp = build_tcp_syn(1234, 80, 1000);
//! let ip = build_ipv4(
//!     IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)),
//!     IpAddr::V4(Ipv4Addr::new(93, 184, 216, 34)),
//!     1,
//!     64,
//!     &tcp,
//! )
//! .unwrap();
//!
//! let bytes = serialize(&[ip.into(), tcp.into()]).unwrap();
//! assert_eq!(bytes.len(), 40);
//! ```
//!
//! A transport layer takes its checksum pseudo-header from the IPv4 layer
//! directly before it in the stack.

pub mod builder;
pub mod checksum;
pub mod decode;
pub mod ethernet;
pub mod icmp;
pub mod ip;
pub mod layer;
pub mod loopback;
pub mod serialize;
pub mod tcp;
pub mod udp;

// Re-export commonly used types
pub use checksum::{internet_checksum, transport_checksum, PseudoHeader};
pub use decode::decode;
pub use ethernet::{EtherType, EthernetFrame, MacAddress};
pub use icmp::{classify, Icmpv4Class, Icmpv4Message, Icmpv4Type, Icmpv4TypeCode};
pub use ip::{IpFlags, IpProtocol, Ipv4Header};
pub use layer::{HasLayerType, Layer, LayerType};
pub use loopback::{LoopbackHeader, ProtocolFamily};
pub use serialize::{serialize, serialize_raw, serialize_with, SerializeOptions};
pub use tcp::{TcpFlags, TcpSegment};
pub use udp::UdpDatagram;
