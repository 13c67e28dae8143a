//! Transport abstraction for the connection context.
//!
//! Decouples the context from any concrete network, file or pipe. Production
//! wraps a socket, tests use in-memory duplex pipes or Turmoil (simulated
//! TCP).

use async_trait::async_trait;
use bytes::Bytes;
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf},
    sync::Mutex,
};

use crate::error::TransportError;

/// Abstract byte-stream endpoint.
///
/// Methods take `&self` so one task can receive while another sends over
/// the same context. The context does not serialize calls; an
/// implementation decides how it handles two concurrent senders or two
/// concurrent receivers.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Push any bytes written so far onto the wire.
    async fn flush(&self) -> Result<(), TransportError>;

    /// Write all of `data`.
    ///
    /// Callers must not assume buffering; bytes that need to reach the peer
    /// promptly are followed by [`Transport::flush`].
    async fn send(&self, data: &[u8]) -> Result<(), TransportError>;

    /// Receive exactly `len` bytes.
    ///
    /// Waits until all `len` bytes arrive or the transport fails. Never
    /// returns fewer bytes without failing.
    async fn recv(&self, len: usize) -> Result<Bytes, TransportError>;
}

/// [`Transport`] over any duplex byte stream.
///
/// The stream is split into independently locked halves, so one reader and
/// one writer proceed in parallel. Writes go straight to the stream with no
/// intermediate buffer; a buffered writer would let a length-prefixed
/// record sit half-written until some later flush.
pub struct StreamTransport<IO> {
    reader: Mutex<ReadHalf<IO>>,
    writer: Mutex<WriteHalf<IO>>,
}

impl<IO> StreamTransport<IO>
where
    IO: AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    /// Wrap a duplex stream.
    pub fn new(stream: IO) -> Self {
        let (reader, writer) = tokio::io::split(stream);
        Self { reader: Mutex::new(reader), writer: Mutex::new(writer) }
    }

    /// Recover the underlying stream.
    pub fn into_inner(self) -> IO {
        self.reader.into_inner().unsplit(self.writer.into_inner())
    }
}

#[async_trait]
impl<IO> Transport for StreamTransport<IO>
where
    IO: AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    async fn flush(&self) -> Result<(), TransportError> {
        self.writer.lock().await.flush().await?;
        Ok(())
    }

    async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        self.writer.lock().await.write_all(data).await?;
        Ok(())
    }

    async fn recv(&self, len: usize) -> Result<Bytes, TransportError> {
        // The buffer grows with the bytes that actually arrive, so a huge
        // `len` costs nothing until the peer sends that much.
        let mut buf = Vec::new();
        let mut reader = self.reader.lock().await;
        (&mut *reader).take(len as u64).read_to_end(&mut buf).await?;
        if buf.len() < len {
            return Err(TransportError::Closed);
        }
        Ok(Bytes::from(buf))
    }
}

impl<IO> std::fmt::Debug for StreamTransport<IO> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamTransport").finish_non_exhaustive()
    }
}
