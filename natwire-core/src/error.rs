//! Error types for natwire

use std::net::IpAddr;
use thiserror::Error;

/// Result type alias for natwire operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for natwire
///
/// Every variant carries enough context (layer, field, offending value) for
/// the owning pipeline to log or reject the packet that triggered it. None of
/// them is fatal to the process.
#[derive(Error, Debug)]
pub enum Error {
    /// Address cannot be used by the requested network layer
    #[error("Invalid {layer} address: {address}")]
    InvalidAddress { layer: &'static str, address: IpAddr },

    /// A layer was asked to carry a layer type it has no encoding for
    #[error("{layer} layer cannot carry a {carried} layer")]
    UnsupportedLayer { layer: &'static str, carried: String },

    /// Protocol version or feature outside the supported set
    #[error("Not supported: {0}")]
    Unsupported(String),

    /// Layer could not be encoded
    #[error("Failed to serialize {layer} layer: {reason}")]
    Serialization { layer: &'static str, reason: String },

    /// Wire bytes shorter than the header being decoded
    #[error("Truncated {layer} header: need {needed} bytes, got {available}")]
    Truncated {
        layer: &'static str,
        needed: usize,
        available: usize,
    },

    /// Header field holds a value the layer cannot be decoded with
    #[error("Malformed {layer} header: {reason}")]
    Malformed { layer: &'static str, reason: String },

    /// ICMPv4 error payload does not hold a complete IPv4 header
    #[error("Missing network layer in embedded packet: need {needed} bytes, got {available}")]
    MissingNetworkLayer { needed: usize, available: usize },

    /// Embedded IPv4 header is not followed by enough transport bytes
    #[error("Missing transport layer in embedded packet: need {needed} bytes, got {available}")]
    MissingTransportLayer { needed: usize, available: usize },

    /// Embedded packet is not IPv4
    #[error("IP version {0} not supported")]
    UnsupportedIpVersion(u8),

    /// ICMPv4 type is neither a known query nor a known error type
    #[error("ICMPv4 type {0} not supported")]
    UnsupportedIcmpType(u8),

    /// Accessor called on an indicator whose embedded transport does not match
    #[error("{accessor} requires an embedded {expected} layer, found {found}")]
    WrongEmbeddedType {
        accessor: &'static str,
        expected: &'static str,
        found: String,
    },

    /// NAT resolution attempted on an ICMPv4 query message
    #[error("ICMPv4 query type {0} carries no embedded flow")]
    QueryNotSupported(u8),

    /// Embedded transport has no NAT demultiplexing rule
    #[error("Embedded {0} layer not supported")]
    UnsupportedEmbeddedType(String),

    /// Embedded accessor called on an indicator built from a query message
    #[error("{accessor}: ICMPv4 query message has no embedded packet")]
    NoEmbeddedPacket { accessor: &'static str },

    /// Invalid parameter error
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a serialization error for the named layer
    pub fn serialization<S: Into<String>>(layer: &'static str, reason: S) -> Self {
        Error::Serialization {
            layer,
            reason: reason.into(),
        }
    }

    /// Create a truncation error for the named layer
    pub fn truncated(layer: &'static str, needed: usize, available: usize) -> Self {
        Error::Truncated {
            layer,
            needed,
            available,
        }
    }

    /// Create a malformed header error for the named layer
    pub fn malformed<S: Into<String>>(layer: &'static str, reason: S) -> Self {
        Error::Malformed {
            layer,
            reason: reason.into(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter<S: Into<String>>(name: S, reason: S) -> Self {
        Error::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_error_messages_carry_context() {
        let err = Error::InvalidAddress {
            layer: "IPv6",
            address: IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)),
        };
        assert_eq!(err.to_string(), "Invalid IPv6 address: 10.0.0.1");

        let err = Error::truncated("TCP", 20, 8);
        assert_eq!(err.to_string(), "Truncated TCP header: need 20 bytes, got 8");

        let err = Error::WrongEmbeddedType {
            accessor: "embedded_identifier",
            expected: "ICMPv4",
            found: "UDP".into(),
        };
        assert!(err.to_string().contains("found UDP"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
