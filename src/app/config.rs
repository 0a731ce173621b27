// Application configuration
//
// Built once at startup from the command line and passed into the
// components that need it. Capture parameters mirror the classic
// single-device tcpdump workflow: small snapshot, no promiscuous mode,
// short read timeout so shutdown is observed quickly.

use crate::capture::CaptureMode;

/// Redraw tick interval. Redraw cost is bounded by this, not by the
/// packet arrival rate.
pub const TICK_INTERVAL_MS: u64 = 100;

/// Bytes captured per packet.
pub const DEFAULT_SNAPLEN: i32 = 1024;

/// Live read timeout; doubles as the shutdown poll interval of the
/// ingestion loop.
pub const DEFAULT_READ_TIMEOUT_MS: i32 = 100;

/// Parameters for opening the capture source.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    pub mode: CaptureMode,
    pub snaplen: i32,
    pub promiscuous: bool,
    pub read_timeout_ms: i32,
}

impl CaptureConfig {
    pub fn new(mode: CaptureMode) -> Self {
        Self {
            mode,
            snaplen: DEFAULT_SNAPLEN,
            promiscuous: false,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
        }
    }
}

/// Top-level configuration assembled from the command line.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub capture: CaptureConfig,
    /// Route diagnostics to stderr instead of discarding them.
    pub debug: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_defaults() {
        let config = CaptureConfig::new(CaptureMode::Live { device: None });
        assert_eq!(config.snaplen, DEFAULT_SNAPLEN);
        assert_eq!(config.read_timeout_ms, DEFAULT_READ_TIMEOUT_MS);
        assert!(!config.promiscuous);
    }
}
