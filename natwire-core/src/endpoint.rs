//! NAT session table keys

use std::fmt;
use std::net::Ipv4Addr;

/// Lookup key into a NAT session table.
///
/// The shape depends on the protocol of the flow being translated: TCP and
/// UDP flows are demultiplexed by port, ICMPv4 query flows by identifier, and
/// ICMPv4 error flows by address alone. Equality and hashing are structural,
/// so two endpoints only match when shape, address and port/id all match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NatEndpoint {
    /// Address with no finer demultiplexing key
    AddressOnly { address: Ipv4Addr },
    /// Address and TCP/UDP port
    AddressPort { address: Ipv4Addr, port: u16 },
    /// Address and ICMPv4 query identifier
    AddressId { address: Ipv4Addr, id: u16 },
}

impl NatEndpoint {
    /// Address component, present in every shape
    pub fn address(&self) -> Ipv4Addr {
        match *self {
            NatEndpoint::AddressOnly { address }
            | NatEndpoint::AddressPort { address, .. }
            | NatEndpoint::AddressId { address, .. } => address,
        }
    }
}

impl fmt::Display for NatEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NatEndpoint::AddressOnly { address } => write!(f, "{}", address),
            NatEndpoint::AddressPort { address, port } => write!(f, "{}:{}", address, port),
            NatEndpoint::AddressId { address, id } => write!(f, "{}#{}", address, id),
        }
    }
}
