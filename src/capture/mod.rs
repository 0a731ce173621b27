// Capture source boundary
//
// Wraps the pcap handle behind one interface for both live devices and
// offline files. The underlying handle is closed by Drop, which covers
// every exit path including errors. All blocking reads happen through
// `pull`, which surfaces the live read timeout as `Pull::Idle` so the
// ingestion loop can observe shutdown between packets.

use std::path::PathBuf;

use chrono::{DateTime, Local, TimeZone};
use pcap::{Active, Capture, Device, Offline};
use thiserror::Error;

use crate::app::config::CaptureConfig;

/// Errors from opening or reading the capture source. All of them are
/// fatal for the capture; none are retried.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("no capture devices found")]
    NoDevice,
    #[error(transparent)]
    Pcap(#[from] pcap::Error),
}

/// Where packets come from.
#[derive(Debug, Clone)]
pub enum CaptureMode {
    /// Live capture; `None` selects the first enumerated device.
    Live { device: Option<String> },
    /// Replay of a recorded capture file.
    Offline { path: PathBuf },
}

/// One captured frame, still undecoded.
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub timestamp: DateTime<Local>,
    pub data: Vec<u8>,
    /// Length on the wire; larger than `data.len()` when the snapshot
    /// length truncated the capture.
    pub orig_len: u32,
}

/// Result of one read attempt against the source.
pub enum Pull {
    Frame(RawFrame),
    /// Live read timeout elapsed without a packet.
    Idle,
    /// Offline source exhausted. Never produced by a live device.
    EndOfStream,
}

enum Handle {
    Live(Capture<Active>),
    Offline(Capture<Offline>),
}

/// Lazy sequence of captured packets from a device or a file.
pub struct PacketSource {
    handle: Handle,
    origin: String,
}

impl PacketSource {
    /// Open the configured source. Device or file acquisition failures
    /// propagate to the caller; the process reports them and exits.
    pub fn open(config: &CaptureConfig) -> Result<Self, SourceError> {
        match &config.mode {
            CaptureMode::Offline { path } => {
                let capture = Capture::from_file(path)?;
                tracing::info!(path = %path.display(), "opened offline capture");
                Ok(Self {
                    handle: Handle::Offline(capture),
                    origin: path.display().to_string(),
                })
            }
            CaptureMode::Live { device } => {
                let name = match device {
                    Some(name) => name.clone(),
                    None => first_device()?,
                };
                let capture = Capture::from_device(name.as_str())?
                    .promisc(config.promiscuous)
                    .snaplen(config.snaplen)
                    .timeout(config.read_timeout_ms)
                    .open()?;
                tracing::info!(device = %name, "opened live capture");
                Ok(Self {
                    handle: Handle::Live(capture),
                    origin: name,
                })
            }
        }
    }

    /// Pull the next frame. Blocks at most for the configured read
    /// timeout on a live device; reads straight through an offline file.
    pub fn pull(&mut self) -> Result<Pull, SourceError> {
        let next = match &mut self.handle {
            Handle::Live(capture) => capture.next_packet(),
            Handle::Offline(capture) => capture.next_packet(),
        };
        match next {
            Ok(packet) => Ok(Pull::Frame(RawFrame {
                timestamp: timeval_to_local(packet.header.ts.tv_sec as i64, packet.header.ts.tv_usec as i64),
                data: packet.data.to_vec(),
                orig_len: packet.header.len,
            })),
            Err(pcap::Error::TimeoutExpired) => Ok(Pull::Idle),
            Err(pcap::Error::NoMorePackets) => Ok(Pull::EndOfStream),
            Err(err) => Err(err.into()),
        }
    }

    /// Human-readable source descriptor: origin plus datalink name.
    pub fn describe(&self) -> String {
        let link = match &self.handle {
            Handle::Live(capture) => capture.get_datalink(),
            Handle::Offline(capture) => capture.get_datalink(),
        };
        let link_name = link
            .get_name()
            .unwrap_or_else(|_| format!("DLT{}", link.0));
        format!("{} ({link_name})", self.origin)
    }
}

fn first_device() -> Result<String, SourceError> {
    let device = Device::list()?
        .into_iter()
        .next()
        .ok_or(SourceError::NoDevice)?;
    Ok(device.name)
}

fn timeval_to_local(sec: i64, usec: i64) -> DateTime<Local> {
    Local
        .timestamp_opt(sec, (usec as u32).saturating_mul(1000))
        .single()
        .unwrap_or_else(Local::now)
}
