//! CLI argument parsing

use clap::{Parser, Subcommand, ValueEnum};
use natwire_packet::ethernet::MacAddress;
use std::net::IpAddr;

#[derive(Parser, Debug)]
#[command(name = "natwire")]
#[command(version, about = "Build NAT gateway packets and resolve ICMPv4 error endpoints", long_about = None)]
pub struct Cli {
    /// Verbose output (-v, -vv, -vvv for increasing verbosity)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Classify an ICMPv4 message and resolve its NAT endpoints
    Resolve {
        /// Message bytes as hex
        #[arg(value_name = "HEX")]
        hex: String,

        /// Input is an IPv4 datagram carrying the ICMPv4 message
        #[arg(long)]
        ipv4: bool,
    },

    /// Build a packet and print it as hex
    Build {
        /// Kind of packet to build
        #[arg(value_enum)]
        kind: PacketKind,

        /// Source IP address
        #[arg(long)]
        src_ip: IpAddr,

        /// Destination IP address
        #[arg(long)]
        dst_ip: IpAddr,

        /// Source port
        #[arg(long)]
        src_port: u16,

        /// Destination port
        #[arg(long)]
        dst_port: u16,

        /// TCP sequence number
        #[arg(long, default_value = "0")]
        seq: u32,

        /// TCP acknowledgment number
        #[arg(long, default_value = "0")]
        ack: u32,

        /// IPv4 identification
        #[arg(long, default_value = "0")]
        id: u16,

        /// IPv4 time to live
        #[arg(long, default_value = "64")]
        ttl: u8,

        /// Source MAC address; adds an Ethernet header
        #[arg(long, requires = "dst_mac")]
        src_mac: Option<MacAddress>,

        /// Destination MAC address; adds an Ethernet header
        #[arg(long, requires = "src_mac")]
        dst_mac: Option<MacAddress>,

        /// Add a BSD loopback header instead of an Ethernet header
        #[arg(long, conflicts_with_all = ["src_mac", "dst_mac"])]
        loopback: bool,

        /// Application payload as hex
        #[arg(long, value_name = "HEX")]
        payload: Option<String>,
    },
}

/// Packets the `build` command can produce
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketKind {
    /// TCP SYN
    Syn,
    /// TCP SYN+ACK
    SynAck,
    /// TCP ACK
    Ack,
    /// TCP PSH+ACK
    Push,
    /// UDP
    Udp,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
