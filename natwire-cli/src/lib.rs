//! CLI interface for natwire
//!
//! This crate provides the `natwire` diagnostic command: argument parsing,
//! logging setup, and the `resolve` and `build` commands on top of the
//! packet and NAT crates.

pub mod args;

pub use args::{Cli, Commands, PacketKind};

use natwire_core::{Error, Result};
use natwire_nat::{nat_endpoints, EmbeddedPacket, EmbeddedTransport, Icmpv4Indicator};
use natwire_packet::builder::{
    build_ethernet, build_ipv4, build_loopback, build_tcp_ack, build_tcp_push, build_tcp_syn,
    build_tcp_syn_ack, build_udp,
};
use natwire_packet::{decode, serialize, Layer, LayerType};
use tracing::{info, Level};

/// Install the fmt subscriber on stderr at a level chosen by `-v` count
pub fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

/// Run the parsed command, returning the text to print
pub fn run(cli: &Cli) -> Result<String> {
    match &cli.command {
        Commands::Resolve { hex, ipv4 } => resolve(hex, *ipv4),
        Commands::Build {
            kind,
            src_ip,
            dst_ip,
            src_port,
            dst_port,
            seq,
            ack,
            id,
            ttl,
            src_mac,
            dst_mac,
            loopback,
            payload,
        } => {
            let transport: Layer = match kind {
                PacketKind::Syn => build_tcp_syn(*src_port, *dst_port, *seq).into(),
                PacketKind::SynAck => build_tcp_syn_ack(*src_port, *dst_port, *seq, *ack).into(),
                PacketKind::Ack => build_tcp_ack(*src_port, *dst_port, *seq, *ack).into(),
                PacketKind::Push => build_tcp_push(*src_port, *dst_port, *seq, *ack).into(),
                PacketKind::Udp => build_udp(*src_port, *dst_port).into(),
            };
            let ip = build_ipv4(*src_ip, *dst_ip, *id, *ttl, &transport)?;

            let mut layers: Vec<Layer> = Vec::with_capacity(4);
            if let (Some(src_mac), Some(dst_mac)) = (src_mac, dst_mac) {
                layers.push(build_ethernet(*src_mac, *dst_mac, &ip)?.into());
            }
            if *loopback {
                layers.push(build_loopback(&ip)?.into());
            }
            layers.push(ip.into());
            layers.push(transport);
            if let Some(payload) = payload {
                layers.push(Layer::Payload(decode_hex("payload", payload)?));
            }

            info!("Building {:?} packet {} -> {}", kind, src_ip, dst_ip);
            Ok(hex::encode(serialize(&layers)?))
        }
    }
}

fn decode_hex(name: &str, input: &str) -> Result<Vec<u8>> {
    let cleaned: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    hex::decode(&cleaned).map_err(|err| Error::invalid_parameter(name.to_string(), err.to_string()))
}

fn resolve(input: &str, ipv4: bool) -> Result<String> {
    let data = decode_hex("hex", input)?;

    let indicator = if ipv4 {
        let message = decode(&data, LayerType::Ipv4)?
            .into_iter()
            .find_map(|layer| match layer {
                Layer::Icmpv4(message) => Some(message),
                _ => None,
            })
            .ok_or_else(|| {
                Error::invalid_parameter("hex", "IPv4 datagram does not carry an ICMPv4 message")
            })?;
        Icmpv4Indicator::parse(message)?
    } else {
        Icmpv4Indicator::from_bytes(&data)?
    };

    info!("Resolving ICMPv4 {}", indicator.type_code());

    let header = format!("icmpv4: {} ({:?})", indicator.type_code(), indicator.class());

    let Some(embedded) = indicator.embedded_packet() else {
        return Ok(format!("{}\nidentifier: {}", header, indicator.identifier()));
    };

    let (source, destination) = nat_endpoints(&indicator)?;
    Ok([
        header,
        format!("embedded: {}", describe_flow(embedded)),
        format!("nat source: {}", source),
        format!("nat destination: {}", destination),
    ]
    .join("\n"))
}

fn describe_flow(embedded: &EmbeddedPacket) -> String {
    let network = &embedded.network;
    match &embedded.transport {
        EmbeddedTransport::Tcp(segment) => format!(
            "TCP {}:{} -> {}:{} seq {}",
            network.source,
            segment.source_port,
            network.destination,
            segment.destination_port,
            segment.sequence_number
        ),
        EmbeddedTransport::Udp(datagram) => format!(
            "UDP {}:{} -> {}:{}",
            network.source, datagram.source_port, network.destination, datagram.destination_port
        ),
        EmbeddedTransport::Icmpv4(message) => format!(
            "ICMPv4 {} -> {} {} id {}",
            network.source, network.destination, message.type_code, message.identifier
        ),
        other => format!(
            "{} {} -> {}",
            other.name(),
            network.source,
            network.destination
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    // Time exceeded quoting UDP 10.0.0.5:5000 -> 8.8.8.8:53
    const TIME_EXCEEDED: &str = "0b00000000000000\
        4500001c00004000011100000a00000508080808\
        1388003500080000";

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_parse_build_command() {
        let cli = parse(&[
            "natwire", "-vv", "build", "syn-ack", "--src-ip", "10.0.0.1", "--dst-ip",
            "10.0.0.2", "--src-port", "80", "--dst-port", "1234", "--seq", "5",
        ]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Build { kind, seq, ttl, src_mac, .. } => {
                assert_eq!(kind, PacketKind::SynAck);
                assert_eq!(seq, 5);
                assert_eq!(ttl, 64);
                assert!(src_mac.is_none());
            }
            other => panic!("expected build, got {:?}", other),
        }
    }

    #[test]
    fn test_mac_addresses_come_in_pairs() {
        let result = Cli::try_parse_from([
            "natwire", "build", "udp", "--src-ip", "10.0.0.1", "--dst-ip", "10.0.0.2",
            "--src-port", "1", "--dst-port", "2", "--src-mac", "02:00:00:00:00:01",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_build_syn_hex() {
        let cli = parse(&[
            "natwire", "build", "syn", "--src-ip", "10.0.0.1", "--dst-ip", "93.184.216.34",
            "--src-port", "1234", "--dst-port", "80", "--seq", "1000", "--id", "1",
        ]);
        let output = run(&cli).unwrap();
        let bytes = hex::decode(&output).unwrap();

        assert_eq!(bytes.len(), 40);
        assert_eq!(bytes[0], 0x45);
        assert_eq!(bytes[9], 6);
        assert_eq!(&bytes[20..22], &1234u16.to_be_bytes());
        assert_eq!(bytes[33], 0x02);
    }

    #[test]
    fn test_build_udp_frame_with_payload() {
        let cli = parse(&[
            "natwire", "build", "udp", "--src-ip", "10.0.0.1", "--dst-ip", "10.0.0.2",
            "--src-port", "5000", "--dst-port", "53", "--src-mac", "02:00:00:00:00:01",
            "--dst-mac", "02:00:00:00:00:02", "--payload", "deadbeef",
        ]);
        let bytes = hex::decode(run(&cli).unwrap()).unwrap();

        assert_eq!(bytes.len(), 60);
        assert_eq!(&bytes[12..14], &[0x08, 0x00]);
        assert_eq!(&bytes[42..46], &[0xDE, 0xAD, 0xBE, 0xEF]);
    }

    #[test]
    fn test_build_loopback_packet() {
        let cli = parse(&[
            "natwire", "build", "udp", "--src-ip", "127.0.0.1", "--dst-ip", "127.0.0.1",
            "--src-port", "5000", "--dst-port", "53", "--loopback",
        ]);
        let bytes = hex::decode(run(&cli).unwrap()).unwrap();

        assert_eq!(bytes.len(), 32);
        assert_eq!(&bytes[..4], &[0x02, 0x00, 0x00, 0x00]);
        assert_eq!(bytes[4], 0x45);

        let conflict = Cli::try_parse_from([
            "natwire", "build", "udp", "--src-ip", "127.0.0.1", "--dst-ip", "127.0.0.1",
            "--src-port", "1", "--dst-port", "2", "--loopback", "--src-mac",
            "02:00:00:00:00:01", "--dst-mac", "02:00:00:00:00:02",
        ]);
        assert!(conflict.is_err());
    }

    #[test]
    fn test_build_rejects_ipv6_addresses() {
        let cli = parse(&[
            "natwire", "build", "ack", "--src-ip", "2001:db8::1", "--dst-ip", "10.0.0.2",
            "--src-port", "1", "--dst-port", "2",
        ]);
        assert!(matches!(run(&cli).unwrap_err(), Error::InvalidAddress { .. }));
    }

    #[test]
    fn test_resolve_time_exceeded() {
        let cli = parse(&["natwire", "resolve", TIME_EXCEEDED]);
        let output = run(&cli).unwrap();

        assert!(output.contains("TimeExceeded code 0 (Error)"));
        assert!(output.contains("embedded: UDP 10.0.0.5:5000 -> 8.8.8.8:53"));
        assert!(output.contains("nat source: 8.8.8.8:53"));
        assert!(output.contains("nat destination: 10.0.0.5:5000"));
        assert_eq!(output.lines().count(), 4);
    }

    #[test]
    fn test_resolve_fragment_quote_fails() {
        // Same quote with MF set on the embedded header
        let fragment = TIME_EXCEEDED.replacen("4500001c00004000", "4500001c00002000", 1);
        let cli = parse(&["natwire", "resolve", &fragment]);
        assert!(matches!(
            run(&cli).unwrap_err(),
            Error::UnsupportedEmbeddedType(ref name) if name == "IPv4 fragment"
        ));
    }

    #[test]
    fn test_resolve_ipv4_datagram() {
        let datagram = format!(
            "4500003800000000400100000a0000010a000005{}",
            TIME_EXCEEDED
        );
        let cli = parse(&["natwire", "resolve", "--ipv4", &datagram]);
        let output = run(&cli).unwrap();
        assert!(output.contains("nat source: 8.8.8.8:53"));

        // UDP datagram has no ICMPv4 message to resolve
        let udp = "4500001c00000000401100000a0000010a0000051388003500080000";
        let cli = parse(&["natwire", "resolve", "--ipv4", udp]);
        assert!(matches!(run(&cli).unwrap_err(), Error::InvalidParameter { .. }));
    }

    #[test]
    fn test_resolve_query_reports_identifier() {
        let cli = parse(&["natwire", "resolve", "0800000042420001"]);
        let output = run(&cli).unwrap();
        assert!(output.contains("EchoRequest code 0 (Query)"));
        assert!(output.contains("identifier: 16962"));
        assert_eq!(output.lines().count(), 2);
    }

    #[test]
    fn test_resolve_rejects_bad_hex() {
        let cli = parse(&["natwire", "resolve", "0b0"]);
        assert!(matches!(run(&cli).unwrap_err(), Error::InvalidParameter { .. }));
    }
}
