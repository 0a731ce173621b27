// Append-only packet store
//
// Packets are addressed by a 1-based row index that matches the row
// numbering of the packet table (row 0 there is the header). Indices are
// assigned at append time and never change: there is no deletion and no
// mutation of a packet once it is in.

use thiserror::Error;

use crate::decode::Packet;

/// Row lookup outside `1..=count`.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("row {row} out of range (store holds {count} packets)")]
pub struct RowOutOfRange {
    pub row: usize,
    pub count: usize,
}

/// Ordered, append-only sequence of ingested packets.
#[derive(Default)]
pub struct PacketStore {
    packets: Vec<Packet>,
}

impl PacketStore {
    pub fn new() -> Self {
        Self {
            packets: Vec::new(),
        }
    }

    /// Append a packet and return its permanent 1-based index.
    pub fn append(&mut self, packet: Packet) -> usize {
        self.packets.push(packet);
        self.packets.len()
    }

    /// Look up a packet by 1-based row index.
    pub fn get(&self, row: usize) -> Result<&Packet, RowOutOfRange> {
        if row < 1 || row > self.packets.len() {
            return Err(RowOutOfRange {
                row,
                count: self.packets.len(),
            });
        }
        Ok(&self.packets[row - 1])
    }

    pub fn count(&self) -> usize {
        self.packets.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    /// All packets in arrival order, for table rendering.
    pub fn packets(&self) -> &[Packet] {
        &self.packets
    }
}
