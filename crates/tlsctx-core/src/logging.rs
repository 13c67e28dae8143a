//! Wire-level logging hooks.
//!
//! The record layer reports every packet it sends or receives, both as a
//! rendered description and as raw bytes. Each sink is independent and
//! defaults to a no-op.

use std::{fmt, sync::Arc};

use tracing::trace;

/// Sink for a rendered packet description.
pub type PacketSink = Arc<dyn Fn(&str) + Send + Sync>;

/// Sink for raw outgoing bytes.
pub type BytesSentSink = Arc<dyn Fn(&[u8]) + Send + Sync>;

/// Sink for raw incoming bytes, split into record header and body.
pub type BytesRecvSink = Arc<dyn Fn(&[u8], &[u8]) + Send + Sync>;

/// The four logging sinks.
#[derive(Clone)]
pub struct Logging {
    /// Called with a description of each packet sent
    pub packet_sent: PacketSink,
    /// Called with a description of each packet received
    pub packet_recv: PacketSink,
    /// Called with the raw bytes of each record sent
    pub io_sent: BytesSentSink,
    /// Called with the raw header and body of each record received
    pub io_recv: BytesRecvSink,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            packet_sent: Arc::new(|_: &str| {}),
            packet_recv: Arc::new(|_: &str| {}),
            io_sent: Arc::new(|_: &[u8]| {}),
            io_recv: Arc::new(|_: &[u8], _: &[u8]| {}),
        }
    }
}

impl Logging {
    /// Sinks that emit `tracing` events at TRACE level under `tlsctx::wire`.
    pub fn tracing() -> Self {
        Self {
            packet_sent: Arc::new(|packet: &str| {
                trace!(target: "tlsctx::wire", %packet, "packet sent");
            }),
            packet_recv: Arc::new(|packet: &str| {
                trace!(target: "tlsctx::wire", %packet, "packet received");
            }),
            io_sent: Arc::new(|bytes: &[u8]| {
                trace!(
                    target: "tlsctx::wire",
                    len = bytes.len(),
                    bytes = %hex::encode(bytes),
                    "io sent"
                );
            }),
            io_recv: Arc::new(|header: &[u8], body: &[u8]| {
                trace!(
                    target: "tlsctx::wire",
                    header = %hex::encode(header),
                    len = body.len(),
                    body = %hex::encode(body),
                    "io received"
                );
            }),
        }
    }

    /// Report a packet sent.
    pub fn log_packet_sent(&self, packet: &str) {
        (self.packet_sent)(packet);
    }

    /// Report a packet received.
    pub fn log_packet_recv(&self, packet: &str) {
        (self.packet_recv)(packet);
    }

    /// Report raw bytes sent.
    pub fn log_io_sent(&self, bytes: &[u8]) {
        (self.io_sent)(bytes);
    }

    /// Report raw bytes received.
    pub fn log_io_recv(&self, header: &[u8], body: &[u8]) {
        (self.io_recv)(header, body);
    }
}

impl fmt::Debug for Logging {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logging").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[test]
    fn defaults_do_nothing() {
        let logging = Logging::default();
        logging.log_packet_sent("ClientHello");
        logging.log_packet_recv("ServerHello");
        logging.log_io_sent(&[0x16, 0x03, 0x01]);
        logging.log_io_recv(&[0x16, 0x03, 0x01, 0x00, 0x01], &[0x01]);
    }

    #[test]
    fn tracing_sinks_accept_every_call() {
        let logging = Logging::tracing();
        logging.log_packet_sent("ClientHello");
        logging.log_io_recv(&[0x17], &[]);
    }

    #[test]
    fn sinks_are_independent() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let logging = Logging {
            io_recv: Arc::new(move |header: &[u8], body: &[u8]| {
                sink.lock().unwrap().push((header.to_vec(), body.to_vec()));
            }),
            ..Logging::default()
        };

        logging.log_io_sent(&[1, 2, 3]);
        logging.log_io_recv(&[0x15], &[2, 40]);

        assert_eq!(*seen.lock().unwrap(), vec![(vec![0x15], vec![2, 40])]);
    }
}
