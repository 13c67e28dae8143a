//! In-memory duplex pipes.
//!
//! Both ends are [`StreamTransport`]s over a `tokio::io::duplex` pair, so
//! bytes written on one end are read on the other with no network involved.

use std::sync::Arc;

use tlsctx_core::{Context, Params, StreamTransport};
use tokio::io::DuplexStream;

/// One end of an in-memory pipe.
pub type PipeTransport = StreamTransport<DuplexStream>;

/// A context running over an in-memory pipe.
pub type PipeContext<S> = Context<PipeTransport, S>;

/// Default pipe buffer size, large enough for one maximum-size TLS record
/// plus header.
pub const PIPE_CAPACITY: usize = 18 * 1024;

/// Two connected pipe ends.
///
/// A writer blocks once `capacity` bytes are in flight and unread.
pub fn memory_pair(capacity: usize) -> (PipeTransport, PipeTransport) {
    let (a, b) = tokio::io::duplex(capacity);
    (StreamTransport::new(a), StreamTransport::new(b))
}

/// Two contexts talking to each other over an in-memory pipe.
///
/// Both share `params`; each gets its own initial state.
pub fn context_pair<S>(
    params: Arc<Params>,
    client_state: S,
    server_state: S,
) -> (PipeContext<S>, PipeContext<S>) {
    let (a, b) = tokio::io::duplex(PIPE_CAPACITY);
    let client = Context::from_stream(a, Arc::clone(&params), client_state);
    let server = Context::from_stream(b, params, server_state);
    (client, server)
}
