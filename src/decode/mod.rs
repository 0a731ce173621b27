// Packet layer classification
//
// Turns a raw captured frame into the immutable `Packet` the store keeps:
// an ordered list of layer tags, the flow descriptor, a one-line summary,
// the multi-line decoded representation shown in the detail pane, and a
// hex/ASCII dump for the dump pane. Classification stops at the transport
// layer; anything deeper is counted as payload.

use std::fmt;

use chrono::{DateTime, Local};

use crate::capture::RawFrame;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Tag for one protocol layer of a decoded packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerType {
    Ethernet,
    Arp,
    Ipv4,
    Ipv6,
    Tcp,
    Udp,
    Icmp,
    Icmpv6,
    Payload,
    /// IP protocol this viewer does not classify further.
    Other(u8),
}

/// Which table column a layer belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerClass {
    Link,
    Network,
    Transport,
    Payload,
}

impl LayerType {
    pub fn class(self) -> LayerClass {
        match self {
            LayerType::Ethernet => LayerClass::Link,
            LayerType::Arp | LayerType::Ipv4 | LayerType::Ipv6 => LayerClass::Network,
            LayerType::Tcp
            | LayerType::Udp
            | LayerType::Icmp
            | LayerType::Icmpv6
            | LayerType::Other(_) => LayerClass::Transport,
            LayerType::Payload => LayerClass::Payload,
        }
    }
}

impl fmt::Display for LayerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerType::Ethernet => write!(f, "Ethernet"),
            LayerType::Arp => write!(f, "ARP"),
            LayerType::Ipv4 => write!(f, "IPv4"),
            LayerType::Ipv6 => write!(f, "IPv6"),
            LayerType::Tcp => write!(f, "TCP"),
            LayerType::Udp => write!(f, "UDP"),
            LayerType::Icmp => write!(f, "ICMP"),
            LayerType::Icmpv6 => write!(f, "ICMPv6"),
            LayerType::Payload => write!(f, "Payload"),
            LayerType::Other(proto) => write!(f, "Proto({proto})"),
        }
    }
}

/// A decoded packet. Immutable once built; the store hands out shared
/// references only.
#[derive(Debug, Clone, PartialEq)]
pub struct Packet {
    pub timestamp: DateTime<Local>,
    /// Length on the wire, which may exceed the captured bytes.
    pub length: u32,
    pub layers: Vec<LayerType>,
    /// `src -> dst` of the network-layer address pair; `None` when the
    /// packet carries no addressed network layer.
    pub flow: Option<String>,
    pub summary: String,
    pub detail: String,
    pub dump: String,
}

impl Packet {
    fn layer_of(&self, class: LayerClass) -> Option<LayerType> {
        self.layers.iter().copied().find(|l| l.class() == class)
    }

    pub fn link_type(&self) -> Option<LayerType> {
        self.layer_of(LayerClass::Link)
    }

    pub fn network_type(&self) -> Option<LayerType> {
        self.layer_of(LayerClass::Network)
    }

    pub fn transport_type(&self) -> Option<LayerType> {
        self.layer_of(LayerClass::Transport)
    }

    /// Flow column text; `-` is the placeholder for packets without a
    /// network-layer address pair.
    pub fn flow_descriptor(&self) -> &str {
        self.flow.as_deref().unwrap_or("-")
    }

    pub fn timestamp_display(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }
}

/// Decode a captured frame into a `Packet`.
pub fn decode(frame: &RawFrame) -> Packet {
    let data = frame.data.as_slice();
    let mut layers = Vec::new();
    let mut detail = vec![format!(
        "Frame: {} bytes on wire ({} captured)",
        frame.orig_len,
        data.len()
    )];
    let mut flow = None;
    let mut summary = String::new();

    decode_ethernet(data, &mut layers, &mut detail, &mut flow, &mut summary);

    if summary.is_empty() {
        summary = format!("{} bytes", frame.orig_len);
    }

    Packet {
        timestamp: frame.timestamp,
        length: frame.orig_len,
        layers,
        flow,
        summary,
        detail: detail.join("\n"),
        dump: hex_dump(data),
    }
}

fn decode_ethernet(
    data: &[u8],
    layers: &mut Vec<LayerType>,
    detail: &mut Vec<String>,
    flow: &mut Option<String>,
    summary: &mut String,
) {
    if data.len() < 14 {
        return;
    }

    layers.push(LayerType::Ethernet);
    let dst_mac = format_mac(&data[0..6]);
    let src_mac = format_mac(&data[6..12]);
    let ethertype = u16::from_be_bytes([data[12], data[13]]);
    let ether_name = match ethertype {
        0x0800 => "IPv4",
        0x0806 => "ARP",
        0x86DD => "IPv6",
        _ => "Unknown",
    };
    detail.push(format!(
        "Ethernet: {src_mac} -> {dst_mac}, Type: {ether_name} (0x{ethertype:04x})"
    ));

    let payload = &data[14..];
    match ethertype {
        0x0800 => decode_ipv4(payload, layers, detail, flow, summary),
        0x0806 => decode_arp(payload, layers, detail, summary),
        0x86DD => decode_ipv6(payload, layers, detail, flow, summary),
        _ => {
            if !payload.is_empty() {
                layers.push(LayerType::Payload);
                detail.push(format!("Payload: {} bytes", payload.len()));
            }
        }
    }
}

fn decode_ipv4(
    data: &[u8],
    layers: &mut Vec<LayerType>,
    detail: &mut Vec<String>,
    flow: &mut Option<String>,
    summary: &mut String,
) {
    if data.len() < 20 {
        return;
    }

    layers.push(LayerType::Ipv4);
    let ihl = ((data[0] & 0x0F) as usize) * 4;
    let total_len = u16::from_be_bytes([data[2], data[3]]);
    let ttl = data[8];
    let proto = data[9];
    let src = format!("{}.{}.{}.{}", data[12], data[13], data[14], data[15]);
    let dst = format!("{}.{}.{}.{}", data[16], data[17], data[18], data[19]);

    *flow = Some(format!("{src} -> {dst}"));
    detail.push(format!(
        "IPv4: {src} -> {dst}, TTL: {ttl}, Proto: {}, Len: {total_len}",
        ip_protocol(proto)
    ));

    let transport = if data.len() > ihl { &data[ihl..] } else { &[] };
    decode_transport(proto, transport, &src, &dst, layers, detail, summary);
}

fn decode_ipv6(
    data: &[u8],
    layers: &mut Vec<LayerType>,
    detail: &mut Vec<String>,
    flow: &mut Option<String>,
    summary: &mut String,
) {
    if data.len() < 40 {
        return;
    }

    layers.push(LayerType::Ipv6);
    let payload_len = u16::from_be_bytes([data[4], data[5]]);
    let next_header = data[6];
    let hop_limit = data[7];
    let src = format_ipv6(&data[8..24]);
    let dst = format_ipv6(&data[24..40]);

    *flow = Some(format!("{src} -> {dst}"));
    detail.push(format!(
        "IPv6: {src} -> {dst}, Hop Limit: {hop_limit}, Next: {}, Payload: {payload_len}",
        ip_protocol(next_header)
    ));

    let transport = if data.len() > 40 { &data[40..] } else { &[] };
    decode_transport(next_header, transport, &src, &dst, layers, detail, summary);
}

fn decode_arp(
    data: &[u8],
    layers: &mut Vec<LayerType>,
    detail: &mut Vec<String>,
    summary: &mut String,
) {
    if data.len() < 28 {
        return;
    }

    // ARP carries no addressed network layer, so the flow stays `-`.
    layers.push(LayerType::Arp);
    let op = u16::from_be_bytes([data[6], data[7]]);
    let sender_ip = format!("{}.{}.{}.{}", data[14], data[15], data[16], data[17]);
    let target_ip = format!("{}.{}.{}.{}", data[24], data[25], data[26], data[27]);

    let line = match op {
        1 => format!("Who has {target_ip}? Tell {sender_ip}"),
        2 => format!("{sender_ip} is at {}", format_mac(&data[8..14])),
        _ => format!("op={op}, {sender_ip} -> {target_ip}"),
    };
    detail.push(format!("ARP: {line}"));
    *summary = format!("ARP {line}");
}

fn decode_transport(
    proto: u8,
    data: &[u8],
    src: &str,
    dst: &str,
    layers: &mut Vec<LayerType>,
    detail: &mut Vec<String>,
    summary: &mut String,
) {
    match proto {
        6 if data.len() >= 20 => {
            layers.push(LayerType::Tcp);
            let src_port = u16::from_be_bytes([data[0], data[1]]);
            let dst_port = u16::from_be_bytes([data[2], data[3]]);
            let seq = u32::from_be_bytes([data[4], data[5], data[6], data[7]]);
            let data_offset = ((data[12] >> 4) as usize) * 4;
            let flags = tcp_flags(data[13]);
            let window = u16::from_be_bytes([data[14], data[15]]);

            detail.push(format!(
                "TCP: {src_port} -> {dst_port}, Seq: {seq}, Flags: [{flags}], Win: {window}"
            ));
            *summary = format!("{src}:{src_port} -> {dst}:{dst_port} TCP [{flags}]");

            push_payload(data, data_offset, layers, detail);
        }
        17 if data.len() >= 8 => {
            layers.push(LayerType::Udp);
            let src_port = u16::from_be_bytes([data[0], data[1]]);
            let dst_port = u16::from_be_bytes([data[2], data[3]]);
            let udp_len = u16::from_be_bytes([data[4], data[5]]);

            detail.push(format!("UDP: {src_port} -> {dst_port}, Len: {udp_len}"));
            *summary = format!("{src}:{src_port} -> {dst}:{dst_port} UDP");

            push_payload(data, 8, layers, detail);
        }
        1 if data.len() >= 4 => {
            layers.push(LayerType::Icmp);
            let line = format!("Type {} Code {}", data[0], data[1]);
            detail.push(format!("ICMP: {line}"));
            *summary = format!("{src} -> {dst} ICMP {line}");
        }
        58 if data.len() >= 4 => {
            layers.push(LayerType::Icmpv6);
            let line = format!("Type {} Code {}", data[0], data[1]);
            detail.push(format!("ICMPv6: {line}"));
            *summary = format!("{src} -> {dst} ICMPv6 {line}");
        }
        _ => {
            layers.push(LayerType::Other(proto));
            detail.push(format!("{}: {} bytes", ip_protocol(proto), data.len()));
            *summary = format!("{src} -> {dst} {}", ip_protocol(proto));
        }
    }
}

fn push_payload(data: &[u8], offset: usize, layers: &mut Vec<LayerType>, detail: &mut Vec<String>) {
    if data.len() > offset {
        layers.push(LayerType::Payload);
        detail.push(format!("Payload: {} bytes", data.len() - offset));
    }
}

/// `hexdump -C` style rendering of the captured bytes.
fn hex_dump(data: &[u8]) -> String {
    let mut out = String::new();
    for (i, chunk) in data.chunks(16).enumerate() {
        let mut hex = String::new();
        for (j, byte) in chunk.iter().enumerate() {
            if j == 8 {
                hex.push(' ');
            }
            hex.push_str(&format!("{byte:02x} "));
        }
        let ascii: String = chunk
            .iter()
            .map(|&b| {
                if b.is_ascii_graphic() || b == b' ' {
                    b as char
                } else {
                    '.'
                }
            })
            .collect();
        out.push_str(&format!("{:04x}   {hex:<49}  |{ascii}|\n", i * 16));
    }
    out
}

fn tcp_flags(flags: u8) -> String {
    let mut set = Vec::new();
    if flags & 0x01 != 0 {
        set.push("FIN");
    }
    if flags & 0x02 != 0 {
        set.push("SYN");
    }
    if flags & 0x04 != 0 {
        set.push("RST");
    }
    if flags & 0x08 != 0 {
        set.push("PSH");
    }
    if flags & 0x10 != 0 {
        set.push("ACK");
    }
    if flags & 0x20 != 0 {
        set.push("URG");
    }
    if set.is_empty() {
        "NONE".into()
    } else {
        set.join(",")
    }
}

fn ip_protocol(proto: u8) -> String {
    match proto {
        1 => "ICMP".into(),
        2 => "IGMP".into(),
        6 => "TCP".into(),
        17 => "UDP".into(),
        47 => "GRE".into(),
        58 => "ICMPv6".into(),
        89 => "OSPF".into(),
        132 => "SCTP".into(),
        _ => format!("Proto({proto})"),
    }
}

fn format_mac(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(":")
}

fn format_ipv6(bytes: &[u8]) -> String {
    bytes
        .chunks(2)
        .map(|c| format!("{:x}", u16::from_be_bytes([c[0], c[1]])))
        .collect::<Vec<_>>()
        .join(":")
}
