//! Error types for the connection context.
//!
//! Two failure families surface through a [`crate::Context`]: transport
//! failures raised by the byte stream, and protocol-state failures returned
//! by transaction functions. The context never catches, retries or rewrites
//! either; it only carries them back to the caller.

use std::io;

use thiserror::Error;

/// Boxed protocol-state failure.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failures raised by a [`crate::Transport`].
#[derive(Debug, Error)]
pub enum TransportError {
    /// The peer closed the stream before the operation completed.
    #[error("connection closed by peer")]
    Closed,

    /// A receive produced a different number of bytes than requested.
    ///
    /// A conforming transport never returns a short buffer; the context
    /// raises this when one does instead of handing partial data upward.
    #[error("short read: expected {expected} bytes, received {received}")]
    ShortRead {
        /// Bytes requested
        expected: usize,
        /// Bytes actually returned
        received: usize,
    },

    /// Underlying I/O failure.
    #[error("transport I/O failure: {0}")]
    Io(#[source] io::Error),
}

impl From<io::Error> for TransportError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe => Self::Closed,
            _ => Self::Io(err),
        }
    }
}

/// Errors surfaced by [`crate::Context`] operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Sending, receiving or flushing failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A transaction function returned a failure.
    ///
    /// The state the function left behind has already been committed when
    /// this error is observed.
    #[error("protocol state: {0}")]
    State(#[source] BoxError),
}

impl Error {
    /// Wrap a protocol-state failure.
    pub fn state<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::State(Box::new(err))
    }

    /// Whether this error came from the transport.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// Failures encoding or decoding cached session material.
#[derive(Debug, Error)]
pub enum SessionError {
    /// CBOR encoding failed.
    #[error("failed to encode session data: {0}")]
    Encode(String),

    /// CBOR decoding failed.
    #[error("failed to decode session data: {0}")]
    Decode(String),
}
