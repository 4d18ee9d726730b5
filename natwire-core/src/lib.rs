//! natwire Core Library
//!
//! This crate provides the error taxonomy and the NAT endpoint key type
//! shared by the natwire packet, NAT and CLI crates.

pub mod endpoint;
pub mod error;

// Re-export commonly used types
pub use endpoint::NatEndpoint;
pub use error::{Error, Result};
