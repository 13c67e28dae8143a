//! Turmoil-backed TCP transport.
//!
//! Runs contexts over Turmoil's simulated network so tests control latency,
//! packet loss and partitions deterministically. Must be used inside a
//! Turmoil host or client.

use std::io;

use tlsctx_core::StreamTransport;
use tracing::debug;
use turmoil::net::{TcpListener, TcpStream};

/// A transport over a simulated TCP connection.
pub type SimTransport = StreamTransport<TcpStream>;

/// Listening socket producing [`SimTransport`]s.
pub struct SimListener {
    listener: TcpListener,
}

impl SimListener {
    /// Bind to `addr` on the current simulated host, e.g. `"0.0.0.0:443"`.
    pub async fn bind(addr: &str) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener })
    }

    /// Wait for the next incoming connection.
    pub async fn accept(&self) -> io::Result<SimTransport> {
        let (stream, peer) = self.listener.accept().await?;
        debug!(%peer, "accepted simulated connection");
        Ok(StreamTransport::new(stream))
    }
}

/// Connect to a simulated host, e.g. `"server:443"`.
pub async fn connect(addr: &str) -> io::Result<SimTransport> {
    let stream = TcpStream::connect(addr).await?;
    Ok(StreamTransport::new(stream))
}
