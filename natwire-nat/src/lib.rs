//! ICMPv4 error handling for the natwire NAT gateway
//!
//! A NAT gateway receiving an ICMPv4 error must find the translation session
//! the error belongs to. This crate provides:
//!
//! - [`indicator`] - Classification of ICMPv4 messages and decoding of the
//!   packet an error message quotes
//! - [`resolver`] - Mapping of the quoted flow to the [`NatEndpoint`] pair
//!   used as session table keys
//!
//! # Example
//!
//! ```rust
//! use natwire_nat::{nat_endpoints, Icmpv4Indicator};
//!
//! // Time exceeded quoting UDP 10.0.0.5:5000 -> 8.8.8.8:53
//! let message = [
//!     0x0B, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
//!     0x45, 0x00, 0x00, 0x1C, 0x00, 0x00, 0x40, 0x00, 0x01, 0x11, 0x00, 0x00,
//!     10, 0, 0, 5, 8, 8, 8, 8,
//!     0x13, 0x88, 0x00, 0x35, 0x00, 0x08, 0x00, 0x00,
//! ];
//!
//! let indicator = Icmpv4Indicator::from_bytes(&message).unwrap();
//! let (source, destination) = nat_endpoints(&indicator).unwrap();
//! assert_eq!(source.to_string(), "8.8.8.8:53");
//! assert_eq!(destination.to_string(), "10.0.0.5:5000");
//! ```

pub mod indicator;
pub mod resolver;


pub use indicator::{EmbeddedPacket, EmbeddedTransport, Icmpv4Indicator};
pub use natwire_core::NatEndpoint;
pub use resolver::{nat_destination, nat_endpoints, nat_source};
