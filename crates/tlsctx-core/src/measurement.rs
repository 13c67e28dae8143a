//! Traffic counters for one connection.
//!
//! Each counter is its own atomic. Updates to one counter are race-free, but
//! nothing orders a counter update against another counter, a status flag,
//! or a state transaction.

use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters owned by a [`crate::Context`].
#[derive(Debug, Default)]
pub struct Measurement {
    bytes_sent: AtomicU64,
    bytes_received: AtomicU64,
    handshakes: AtomicU64,
}

/// Point-in-time copy of a [`Measurement`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MeasurementSnapshot {
    /// Bytes handed to the transport for sending
    pub bytes_sent: u64,
    /// Bytes requested from the transport
    pub bytes_received: u64,
    /// Handshakes started on this connection
    pub handshakes: u64,
}

impl Measurement {
    /// All counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count `len` outgoing bytes.
    pub fn add_sent(&self, len: usize) {
        self.bytes_sent.fetch_add(len as u64, Ordering::Relaxed);
    }

    /// Count `len` incoming bytes.
    pub fn add_received(&self, len: usize) {
        self.bytes_received.fetch_add(len as u64, Ordering::Relaxed);
    }

    /// Count one started handshake.
    pub fn add_handshake(&self) {
        self.handshakes.fetch_add(1, Ordering::Relaxed);
    }

    /// Bytes sent so far.
    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent.load(Ordering::Relaxed)
    }

    /// Bytes received so far.
    pub fn bytes_received(&self) -> u64 {
        self.bytes_received.load(Ordering::Relaxed)
    }

    /// Handshakes started so far.
    pub fn handshakes(&self) -> u64 {
        self.handshakes.load(Ordering::Relaxed)
    }

    /// Copy the current counter values.
    ///
    /// The three loads are independent; a snapshot taken during concurrent
    /// traffic may mix values from before and after a given update.
    pub fn snapshot(&self) -> MeasurementSnapshot {
        MeasurementSnapshot {
            bytes_sent: self.bytes_sent(),
            bytes_received: self.bytes_received(),
            handshakes: self.handshakes(),
        }
    }
}
