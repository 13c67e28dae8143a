//! Session resumption material and caching.
//!
//! The context never drives resumption itself. The handshake layer looks
//! sessions up, stores new ones and invalidates stale ones through the
//! callbacks in [`crate::Params`]; [`MemorySessionCache`] is a ready-made
//! backing store for those callbacks.
//!
//! # Security
//!
//! Cached entries hold the master secret. The in-memory cache is cleared
//! when dropped and never persists anything.

use std::{
    collections::{HashMap, VecDeque},
    fmt,
    sync::{Mutex, PoisonError},
};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    config::{CipherId, Version},
    error::SessionError,
};

/// Lookup key for a resumable session.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Vec<u8>);

impl SessionId {
    /// Wrap raw session identifier bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Raw identifier bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({})", hex::encode(&self.0))
    }
}

/// Cacheable resumption material.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    /// Protocol version the session was negotiated at
    pub version: Version,
    /// Cipher suite the session was negotiated with
    pub cipher: CipherId,
    /// Master secret
    pub secret: Vec<u8>,
}

impl SessionData {
    /// Encode as CBOR.
    pub fn to_cbor(&self) -> Result<Vec<u8>, SessionError> {
        let mut out = Vec::new();
        ciborium::ser::into_writer(self, &mut out)
            .map_err(|e| SessionError::Encode(e.to_string()))?;
        Ok(out)
    }

    /// Decode from CBOR.
    pub fn from_cbor(bytes: &[u8]) -> Result<Self, SessionError> {
        ciborium::de::from_reader(bytes).map_err(|e| SessionError::Decode(e.to_string()))
    }
}

impl fmt::Debug for SessionData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionData")
            .field("version", &self.version)
            .field("cipher", &self.cipher)
            .field("secret", &format_args!("<{} bytes>", self.secret.len()))
            .finish()
    }
}

/// Storage behind the session callbacks.
///
/// Wire one into a configuration with [`crate::Params::with_session_cache`].
pub trait SessionCache: Send + Sync + 'static {
    /// Find a stored session.
    fn lookup(&self, id: &SessionId) -> Option<SessionData>;

    /// Store a newly established session.
    fn store(&self, id: &SessionId, data: &SessionData);

    /// Forget a session.
    fn invalidate(&self, id: &SessionId);
}

/// Bounded in-memory session cache.
///
/// Entries are kept CBOR-encoded. When the cache is full the oldest entry
/// is evicted to make room.
pub struct MemorySessionCache {
    capacity: usize,
    inner: Mutex<CacheInner>,
}

#[derive(Default)]
struct CacheInner {
    entries: HashMap<SessionId, Vec<u8>>,
    order: VecDeque<SessionId>,
}

impl MemorySessionCache {
    /// Cache holding at most `capacity` sessions.
    pub fn new(capacity: usize) -> Self {
        Self { capacity, inner: Mutex::new(CacheInner::default()) }
    }

    /// Maximum number of sessions held.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of sessions currently held.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Whether the cache holds no sessions.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CacheInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SessionCache for MemorySessionCache {
    fn lookup(&self, id: &SessionId) -> Option<SessionData> {
        let mut inner = self.lock();
        let encoded = inner.entries.get(id)?;
        match SessionData::from_cbor(encoded) {
            Ok(data) => Some(data),
            Err(err) => {
                debug!(?id, %err, "dropping undecodable cache entry");
                inner.entries.remove(id);
                inner.order.retain(|stored| stored != id);
                None
            },
        }
    }

    fn store(&self, id: &SessionId, data: &SessionData) {
        if self.capacity == 0 {
            return;
        }

        let encoded = match data.to_cbor() {
            Ok(encoded) => encoded,
            Err(err) => {
                debug!(?id, %err, "not caching session");
                return;
            },
        };

        let mut inner = self.lock();
        if inner.entries.insert(id.clone(), encoded).is_none() {
            inner.order.push_back(id.clone());
        }

        while inner.entries.len() > self.capacity {
            let Some(oldest) = inner.order.pop_front() else { break };
            inner.entries.remove(&oldest);
            debug!(id = ?oldest, "evicted session");
        }
    }

    fn invalidate(&self, id: &SessionId) {
        let mut inner = self.lock();
        if inner.entries.remove(id).is_some() {
            inner.order.retain(|stored| stored != id);
        }
    }
}

impl fmt::Debug for MemorySessionCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemorySessionCache")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .finish()
    }
}
