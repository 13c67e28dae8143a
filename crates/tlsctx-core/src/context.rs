//! The per-connection context.
//!
//! A [`Context`] is the only object the handshake and record layers touch.
//! It owns the transport, the traffic counters, two status flags and the
//! protocol state cell, and holds a shared reference to the configuration.
//!
//! # Protocol state
//!
//! The state value is opaque here: its type is chosen by the handshake
//! layer. It is reachable only through [`Context::transaction`], which runs
//! a function against it under an exclusive lock. Whatever the function
//! leaves in the state is committed, even when it returns an error, so a
//! sequence number or transcript that advanced before a step was rejected
//! stays advanced for the alert that follows.
//!
//! # Ordering
//!
//! The counters and the two flags are independent atomics outside the state
//! lock. A reader may observe `established` before the state mutation that
//! preceded the matching [`Context::set_established`] call is visible to it,
//! or the reverse. Callers that need the two to agree must order them
//! themselves.

use std::{
    convert::Infallible,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
};

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, trace};

use crate::{
    config::Params,
    error::{Error, TransportError},
    measurement::{Measurement, MeasurementSnapshot},
    transport::{StreamTransport, Transport},
};

/// Protocol state that can hand out random bytes.
///
/// Drawing advances the generator, so it happens inside a transaction.
pub trait RandomState {
    /// Produce `len` random bytes, advancing the generator.
    fn random_bytes(&mut self, len: usize) -> Vec<u8>;
}

/// Connection context over transport `T` with protocol state `S`.
pub struct Context<T, S> {
    transport: T,
    params: Arc<Params>,
    state: Mutex<S>,
    measurement: Measurement,
    eof: AtomicBool,
    established: AtomicBool,
}

impl<T, S> Context<T, S>
where
    T: Transport,
{
    /// Build a context from a transport, a shared configuration and the
    /// initial protocol state.
    pub fn new(transport: T, params: Arc<Params>, state: S) -> Self {
        Self {
            transport,
            params,
            state: Mutex::new(state),
            measurement: Measurement::new(),
            eof: AtomicBool::new(false),
            established: AtomicBool::new(false),
        }
    }

    /// Shared configuration.
    pub fn params(&self) -> &Arc<Params> {
        &self.params
    }

    /// Underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Current traffic counters.
    pub fn measurement(&self) -> MeasurementSnapshot {
        self.measurement.snapshot()
    }

    /// Run `f` against the protocol state as one atomic step.
    ///
    /// Concurrent transactions serialize. The state `f` leaves behind is
    /// committed before its result is returned, whether that result is `Ok`
    /// or `Err`. A transaction that panicked does not roll back either: the
    /// next transaction sees the state as the panicking one left it.
    pub fn transaction<A, E, F>(&self, f: F) -> Result<A, E>
    where
        F: FnOnce(&mut S) -> Result<A, E>,
    {
        let mut state = self.state.lock().unwrap_or_else(|poisoned| {
            debug!("recovering protocol state after a panicked transaction");
            PoisonError::into_inner(poisoned)
        });
        f(&mut *state)
    }

    /// Like [`Context::transaction`], with the state error lifted into
    /// [`Error::State`] so it composes with transport errors.
    pub fn using_state<A, E, F>(&self, f: F) -> Result<A, Error>
    where
        F: FnOnce(&mut S) -> Result<A, E>,
        E: std::error::Error + Send + Sync + 'static,
    {
        self.transaction(f).map_err(|err| {
            debug!(%err, "protocol state transaction failed");
            Error::state(err)
        })
    }

    /// Draw `len` random bytes from the state's generator.
    pub fn random_bytes(&self, len: usize) -> Vec<u8>
    where
        S: RandomState,
    {
        match self.transaction(|state| Ok::<_, Infallible>(state.random_bytes(len))) {
            Ok(bytes) => bytes,
            Err(never) => match never {},
        }
    }

    /// Count and send `data`.
    ///
    /// Transport errors are returned as-is; the eof flag is left alone.
    pub async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        self.measurement.add_sent(data.len());
        trace!(len = data.len(), "send");
        self.transport.send(data).await
    }

    /// Count and receive exactly `len` bytes.
    pub async fn recv(&self, len: usize) -> Result<Bytes, TransportError> {
        self.measurement.add_received(len);
        trace!(len, "recv");
        let bytes = self.transport.recv(len).await?;
        if bytes.len() != len {
            return Err(TransportError::ShortRead { expected: len, received: bytes.len() });
        }
        Ok(bytes)
    }

    /// Flush the transport.
    pub async fn flush(&self) -> Result<(), TransportError> {
        self.transport.flush().await
    }

    /// Consult the handshake-start policy and count the handshake if it
    /// may proceed.
    ///
    /// Returns `false` when the policy asks for the handshake to be
    /// abandoned; aborting is up to the caller.
    pub fn begin_handshake(&self) -> bool {
        let allowed = self.params.handshake_allowed(&self.measurement.snapshot());
        if allowed {
            self.measurement.add_handshake();
        } else {
            debug!("handshake refused by policy");
        }
        allowed
    }

    /// Whether the peer's end of stream has been recorded.
    pub fn eof(&self) -> bool {
        self.eof.load(Ordering::Acquire)
    }

    /// Record (or clear) end of stream.
    pub fn set_eof(&self, eof: bool) {
        self.eof.store(eof, Ordering::Release);
    }

    /// Whether the handshake has been recorded as established.
    pub fn established(&self) -> bool {
        self.established.load(Ordering::Acquire)
    }

    /// Record (or clear) the established flag.
    pub fn set_established(&self, established: bool) {
        self.established.store(established, Ordering::Release);
    }
}

impl<IO, S> Context<StreamTransport<IO>, S>
where
    IO: AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    /// Build a context directly over a duplex byte stream.
    ///
    /// The stream is used unbuffered; see [`StreamTransport`].
    pub fn from_stream(stream: IO, params: Arc<Params>, state: S) -> Self {
        Self::new(StreamTransport::new(stream), params, state)
    }
}

impl<T, S> std::fmt::Debug for Context<T, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("measurement", &self.measurement.snapshot())
            .field("eof", &self.eof.load(Ordering::Relaxed))
            .field("established", &self.established.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::{fmt, thread};

    use async_trait::async_trait;
    use tokio::io::DuplexStream;

    use super::*;

    #[derive(Debug, Default)]
    struct Counter {
        value: u64,
        seed: u8,
    }

    impl RandomState for Counter {
        fn random_bytes(&mut self, len: usize) -> Vec<u8> {
            (0..len)
                .map(|_| {
                    self.seed = self.seed.wrapping_mul(31).wrapping_add(7);
                    self.seed
                })
                .collect()
        }
    }

    #[derive(Debug)]
    struct Rejected;

    impl fmt::Display for Rejected {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("rejected")
        }
    }

    impl std::error::Error for Rejected {}

    fn pipe() -> (Context<StreamTransport<DuplexStream>, Counter>, StreamTransport<DuplexStream>)
    {
        let (a, b) = tokio::io::duplex(1024);
        let ctx = Context::from_stream(a, Arc::new(Params::default()), Counter::default());
        (ctx, StreamTransport::new(b))
    }

    #[tokio::test]
    async fn send_counts_and_delivers() {
        let (ctx, peer) = pipe();

        ctx.send(&[1, 2, 3, 4, 5]).await.unwrap();
        ctx.flush().await.unwrap();

        assert_eq!(&peer.recv(5).await.unwrap()[..], &[1, 2, 3, 4, 5]);
        assert_eq!(ctx.measurement().bytes_sent, 5);
        assert_eq!(ctx.measurement().bytes_received, 0);
    }

    #[tokio::test]
    async fn recv_counts_requested_bytes() {
        let (ctx, peer) = pipe();

        peer.send(b"abcdef").await.unwrap();
        assert_eq!(&ctx.recv(4).await.unwrap()[..], b"abcd");
        assert_eq!(&ctx.recv(2).await.unwrap()[..], b"ef");
        assert_eq!(ctx.measurement().bytes_received, 6);
    }

    #[tokio::test]
    async fn transport_errors_do_not_set_eof() {
        let (ctx, peer) = pipe();
        drop(peer);

        assert!(matches!(ctx.recv(1).await, Err(TransportError::Closed)));
        assert!(!ctx.eof());
    }

    struct Truncating;

    #[async_trait]
    impl Transport for Truncating {
        async fn flush(&self) -> Result<(), TransportError> {
            Ok(())
        }

        async fn send(&self, _data: &[u8]) -> Result<(), TransportError> {
            Ok(())
        }

        async fn recv(&self, len: usize) -> Result<Bytes, TransportError> {
            Ok(Bytes::from(vec![0; len.saturating_sub(1)]))
        }
    }

    #[tokio::test]
    async fn short_transport_reads_are_rejected() {
        let ctx = Context::new(Truncating, Arc::new(Params::default()), ());

        let result = ctx.recv(4).await;
        assert!(matches!(result, Err(TransportError::ShortRead { expected: 4, received: 3 })));
    }

    #[test]
    fn failed_transaction_still_commits() {
        let (ctx, _peer) = pipe();

        let result = ctx.transaction(|s| {
            s.value += 10;
            Err::<(), _>(Rejected)
        });
        assert!(result.is_err());

        let seen = ctx.transaction(|s| Ok::<_, Infallible>(s.value)).unwrap();
        assert_eq!(seen, 10);
    }

    #[test]
    fn using_state_lifts_errors() {
        let (ctx, _peer) = pipe();

        let err = ctx
            .using_state(|s| {
                s.value += 1;
                Err::<(), _>(Rejected)
            })
            .unwrap_err();

        assert!(matches!(err, Error::State(_)));
        assert_eq!(ctx.using_state(|s| Ok::<_, Rejected>(s.value)).unwrap(), 1);
    }

    #[test]
    fn panicked_transaction_keeps_its_writes() {
        let (ctx, _peer) = pipe();

        thread::scope(|scope| {
            let handle = scope.spawn(|| {
                ctx.transaction(|s| -> Result<(), Infallible> {
                    s.value = 42;
                    panic!("handshake step blew up");
                })
            });
            assert!(handle.join().is_err());
        });

        assert_eq!(ctx.transaction(|s| Ok::<_, Infallible>(s.value)).unwrap(), 42);
    }

    #[test]
    fn concurrent_transactions_serialize() {
        let (ctx, _peer) = pipe();

        thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..500 {
                        ctx.transaction(|s| {
                            s.value += 1;
                            Ok::<_, Infallible>(())
                        })
                        .unwrap();
                    }
                });
            }
        });

        assert_eq!(ctx.transaction(|s| Ok::<_, Infallible>(s.value)).unwrap(), 2000);
    }

    #[test]
    fn flags_are_independent() {
        let (ctx, _peer) = pipe();
        assert!(!ctx.eof());
        assert!(!ctx.established());

        ctx.set_established(true);
        assert!(ctx.established());
        assert!(!ctx.eof());

        ctx.set_eof(true);
        ctx.set_established(false);
        assert!(ctx.eof());
        assert!(!ctx.established());
    }

    #[test]
    fn random_draws_advance_the_generator() {
        let (ctx, _peer) = pipe();

        let first = ctx.random_bytes(4);
        let second = ctx.random_bytes(4);

        assert_eq!(first, vec![7, 224, 39, 192]);
        assert_ne!(first, second);
        assert!(ctx.random_bytes(0).is_empty());
    }

    #[test]
    fn begin_handshake_counts_only_allowed() {
        let params = Params::default().with_on_handshake(|m| m.handshakes == 0);
        let ctx = Context::new(Truncating, Arc::new(params), ());

        assert!(ctx.begin_handshake());
        assert!(!ctx.begin_handshake());
        assert_eq!(ctx.measurement().handshakes, 1);
    }
}
