//! Example: Building a UDP packet
//!
//! Builds a translated DNS query as a NAT gateway would forward it, then
//! decodes the bytes back into layers.

use std::net::{IpAddr, Ipv4Addr};
use natwire_packet::builder::{build_ethernet, build_ipv4, build_udp};
use natwire_packet::ethernet::MacAddress;
use natwire_packet::{decode, serialize, Layer, LayerType};

fn main() {
    // Network addresses
    let src_mac = MacAddress([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
    let dst_mac = MacAddress([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);
    let src_ip = IpAddr::V4(Ipv4Addr::new(203, 0, 113, 10));
    let dst_ip = IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8));

    // DNS query payload (simplified)
    let dns_query = vec![
        0x12, 0x34, // Transaction ID
        0x01, 0x00, // Flags: standard query
        0x00, 0x01, // Questions: 1
        0x00, 0x00, // Answer RRs: 0
        0x00, 0x00, // Authority RRs: 0
        0x00, 0x00, // Additional RRs: 0
    ];

    let udp = build_udp(54321, 53);
    let ip = build_ipv4(src_ip, dst_ip, 0x1c46, 64, &udp).expect("Failed to build IPv4 header");
    let eth = build_ethernet(src_mac, dst_mac, &ip).expect("Failed to build Ethernet header");

    let packet = serialize(&[eth.into(), ip.into(), udp.into(), Layer::Payload(dns_query)])
        .expect("Failed to serialize UDP packet");

    println!("UDP packet built successfully!");
    println!("Total size: {} bytes", packet.len());
    println!("Ethernet header: {:02X?}", &packet[..14]);
    println!("IP version and header length: 0x{:02X}", packet[14]);
    println!("IP protocol: {} (UDP)", packet[23]);

    let layers = decode(&packet, LayerType::Ethernet).expect("Failed to decode UDP packet");
    for layer in &layers {
        match layer {
            Layer::Udp(udp) => println!(
                "UDP {} -> {} length {} checksum 0x{:04X}",
                udp.source_port, udp.destination_port, udp.length, udp.checksum
            ),
            Layer::Payload(data) => println!("Payload: {} bytes", data.len()),
            _ => {}
        }
    }
}
