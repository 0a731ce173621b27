// Ingestion loop
//
// Dedicated OS thread that drains the capture source and feeds the packet
// store. This is the only place that blocks on the capture handle; the
// render loop and key handling never wait on it. Every append goes through
// the store mutex, and the shutdown flag is checked before each write so
// the loop stops touching shared state once teardown begins.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crate::capture::{PacketSource, Pull, SourceError};
use crate::decode;
use crate::store::PacketStore;

/// Spawn the ingestion thread.
///
/// End-of-stream exits the loop quietly: the rest of the application keeps
/// running so already-ingested packets stay browsable. A read failure is
/// deposited in `failure` and raises `shutdown`, which the render loop
/// turns into a nonzero process exit. The thread is not joined on exit;
/// abandoning it is fine because the shutdown gate keeps it from writing.
pub fn spawn(
    mut source: PacketSource,
    store: Arc<Mutex<PacketStore>>,
    dirty: Arc<AtomicBool>,
    shutdown: Arc<AtomicBool>,
    failure: Arc<Mutex<Option<SourceError>>>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        loop {
            if shutdown.load(Ordering::Acquire) {
                return;
            }

            match source.pull() {
                Ok(Pull::Frame(frame)) => {
                    let packet = decode::decode(&frame);
                    if shutdown.load(Ordering::Acquire) {
                        return;
                    }
                    let seq = store.lock().unwrap().append(packet);
                    dirty.store(true, Ordering::Release);
                    tracing::trace!(seq, "packet ingested");
                }
                Ok(Pull::Idle) => continue,
                Ok(Pull::EndOfStream) => {
                    let count = store.lock().unwrap().count();
                    tracing::info!(count, "capture source exhausted");
                    return;
                }
                Err(err) => {
                    tracing::error!(error = %err, "capture read failed");
                    *failure.lock().unwrap() = Some(err);
                    shutdown.store(true, Ordering::Release);
                    return;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::tests::{
        offline_config, pcap_global_header, pcap_record, write_temp_pcap,
    };
    use crate::decode::tests::ipv4_tcp_frame;
    use std::fs;
    use std::path::PathBuf;

    struct Shared {
        store: Arc<Mutex<PacketStore>>,
        dirty: Arc<AtomicBool>,
        shutdown: Arc<AtomicBool>,
        failure: Arc<Mutex<Option<SourceError>>>,
    }

    impl Shared {
        fn new() -> Self {
            Self {
                store: Arc::new(Mutex::new(PacketStore::new())),
                dirty: Arc::new(AtomicBool::new(false)),
                shutdown: Arc::new(AtomicBool::new(false)),
                failure: Arc::new(Mutex::new(None)),
            }
        }

        fn run(&self, source: PacketSource) {
            spawn(
                source,
                self.store.clone(),
                self.dirty.clone(),
                self.shutdown.clone(),
                self.failure.clone(),
            )
            .join()
            .unwrap();
        }
    }

    fn open_offline(path: PathBuf) -> PacketSource {
        PacketSource::open(&offline_config(path)).unwrap()
    }

    #[test]
    fn test_exhausted_source_exits_quietly() {
        let path = write_temp_pcap("ingest-empty", &pcap_global_header());
        let shared = Shared::new();
        shared.run(open_offline(path.clone()));

        assert_eq!(shared.store.lock().unwrap().count(), 0);
        assert!(!shared.dirty.load(Ordering::Acquire));
        assert!(
            !shared.shutdown.load(Ordering::Acquire),
            "end of stream must leave the viewer running"
        );
        assert!(shared.failure.lock().unwrap().is_none());
        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_ingests_every_frame_and_marks_dirty() {
        let frame = ipv4_tcp_frame();
        let mut bytes = pcap_global_header();
        bytes.extend_from_slice(&pcap_record(&frame.data));
        bytes.extend_from_slice(&pcap_record(&frame.data));
        let path = write_temp_pcap("ingest-two", &bytes);

        let shared = Shared::new();
        shared.run(open_offline(path.clone()));

        let store = shared.store.lock().unwrap();
        assert_eq!(store.count(), 2);
        assert_ne!(store.get(1).unwrap().flow_descriptor(), "-");
        drop(store);
        assert!(shared.dirty.load(Ordering::Acquire));
        assert!(!shared.shutdown.load(Ordering::Acquire));
        assert!(shared.failure.lock().unwrap().is_none());
        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_read_failure_deposits_error_and_raises_shutdown() {
        let frame = ipv4_tcp_frame();
        let mut bytes = pcap_global_header();
        let record = pcap_record(&frame.data);
        bytes.extend_from_slice(&record[..20]);
        let path = write_temp_pcap("ingest-truncated", &bytes);

        let shared = Shared::new();
        shared.run(open_offline(path.clone()));

        assert!(shared.failure.lock().unwrap().is_some());
        assert!(shared.shutdown.load(Ordering::Acquire));
        assert_eq!(shared.store.lock().unwrap().count(), 0);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_raised_shutdown_blocks_further_appends() {
        let frame = ipv4_tcp_frame();
        let mut bytes = pcap_global_header();
        bytes.extend_from_slice(&pcap_record(&frame.data));
        let path = write_temp_pcap("ingest-shutdown", &bytes);

        let shared = Shared::new();
        shared.shutdown.store(true, Ordering::Release);
        shared.run(open_offline(path.clone()));

        assert_eq!(shared.store.lock().unwrap().count(), 0);
        assert!(!shared.dirty.load(Ordering::Acquire));
        let _ = fs::remove_file(path);
    }
}
