//! Example: Building a TCP SYN packet
//!
//! Builds the SYN a NAT gateway sends when it opens an outbound connection on
//! behalf of a client, framed for Ethernet.

use std::net::{IpAddr, Ipv4Addr};
use natwire_packet::builder::{build_ethernet, build_ipv4, build_tcp_syn};
use natwire_packet::ethernet::MacAddress;
use natwire_packet::serialize;

fn main() {
    // Network addresses
    let src_mac = MacAddress([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
    let dst_mac = MacAddress([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);
    let src_ip = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
    let dst_ip = IpAddr::V4(Ipv4Addr::new(93, 184, 216, 34));

    let tcp = build_tcp_syn(54321, 80, 1000);
    let ip = build_ipv4(src_ip, dst_ip, 1, 64, &tcp).expect("Failed to build IPv4 header");
    let eth = build_ethernet(src_mac, dst_mac, &ip).expect("Failed to build Ethernet header");

    let packet = serialize(&[eth.into(), ip.into(), tcp.into()])
        .expect("Failed to serialize TCP SYN packet");

    println!("TCP SYN packet built successfully!");
    println!("Total size: {} bytes (padded to the Ethernet minimum)", packet.len());
    println!("Sequence number: 1000");
    println!("Window size: 65535");

    // Parse the flags byte to verify
    let tcp_flags_byte = packet[47]; // Offset to TCP flags
    println!("TCP flags byte: 0x{:02X}", tcp_flags_byte);
    println!("  SYN flag set: {}", (tcp_flags_byte & 0x02) != 0);
}
