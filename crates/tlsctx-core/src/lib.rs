//! Connection context for a TLS engine.
//!
//! Owns the mutable per-connection protocol state, serializes access to it,
//! abstracts the byte-stream transport, and exposes the policy hooks the
//! handshake and record layers consult during a connection's lifetime.
//!
//! # Architecture
//!
//! Handshake message handling, record framing and cryptography live outside
//! this crate. They reach the connection only through a [`Context`], which
//! lets them:
//!
//! - run atomic transactions against the protocol state,
//! - send and receive counted bytes through the transport,
//! - read and set the end-of-stream and established flags,
//! - consult the configured trust, resumption and logging callbacks.
//!
//! The state type is chosen by the caller and stays opaque here. Failures
//! are ordinary `Result` values; nothing in this crate retries, swallows or
//! rewrites an error.
//!
//! # Components
//!
//! - [`context`]: The context and its state transactions
//! - [`config`]: Immutable configuration and callbacks
//! - [`transport`]: Transport abstraction (streams)
//! - [`measurement`]: Traffic counters
//! - [`session`]: Resumption material and caching
//! - [`cert`]: Certificate material and trust decisions
//! - [`logging`]: Wire-level logging hooks
//! - [`error`]: Error types

pub mod cert;
pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod measurement;
pub mod session;
pub mod transport;

pub use cert::{Certificate, CertificateUsage, CertifiedKey, PrivateKey, RejectReason};
pub use config::{CipherId, CompressionId, Params, Version};
pub use context::{Context, RandomState};
pub use error::{Error, SessionError, TransportError};
pub use logging::Logging;
pub use measurement::{Measurement, MeasurementSnapshot};
pub use session::{MemorySessionCache, SessionCache, SessionData, SessionId};
pub use transport::{StreamTransport, Transport};
