//! Fault-injecting transport wrapper.
//!
//! Wraps any [`Transport`] and breaks it in one chosen way, for checking that
//! the context propagates transport failures unchanged and refuses short
//! reads.

use std::{
    io,
    sync::atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use bytes::Bytes;
use tlsctx_core::{Transport, TransportError};

/// How a [`FaultyTransport`] misbehaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Every receive returns one byte fewer than asked for
    TruncateReads,
    /// Sends succeed until this many bytes have gone through, then fail
    BreakSendsAfter(usize),
    /// Every flush fails
    FailFlush,
}

/// Transport that injects a [`Fault`] into an inner transport.
#[derive(Debug)]
pub struct FaultyTransport<T> {
    inner: T,
    fault: Fault,
    sent: AtomicUsize,
}

impl<T: Transport> FaultyTransport<T> {
    /// Wrap `inner`.
    pub fn new(inner: T, fault: Fault) -> Self {
        Self { inner, fault, sent: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl<T: Transport> Transport for FaultyTransport<T> {
    async fn flush(&self) -> Result<(), TransportError> {
        if self.fault == Fault::FailFlush {
            return Err(TransportError::Io(io::Error::other("injected flush failure")));
        }
        self.inner.flush().await
    }

    async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        if let Fault::BreakSendsAfter(limit) = self.fault {
            let before = self.sent.fetch_add(data.len(), Ordering::SeqCst);
            if before + data.len() > limit {
                return Err(io::Error::from(io::ErrorKind::BrokenPipe).into());
            }
        }
        self.inner.send(data).await
    }

    async fn recv(&self, len: usize) -> Result<Bytes, TransportError> {
        let bytes = self.inner.recv(len).await?;
        if self.fault == Fault::TruncateReads && !bytes.is_empty() {
            return Ok(bytes.slice(..bytes.len() - 1));
        }
        Ok(bytes)
    }
}
