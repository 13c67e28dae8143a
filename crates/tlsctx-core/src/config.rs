//! Connection configuration.
//!
//! [`Params`] bundles negotiation preferences, certificate material, logging
//! sinks and the callbacks the handshake layer consults for policy
//! decisions. It is built once, wrapped in an `Arc`, and shared read-only by
//! every context created from it. Nothing in this crate mutates a `Params`
//! after construction.
//!
//! Every field has a default, so a configuration is usually written as a
//! handful of overrides:
//!
//! ```
//! use tlsctx_core::{Params, Version};
//!
//! let params = Params {
//!     connect_version: Version::Tls11,
//!     want_client_cert: true,
//!     ..Params::default()
//! };
//! assert!(params.supports_version(Version::Tls11));
//! ```

use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{
    cert::{Certificate, CertificateUsage, CertifiedKey},
    logging::Logging,
    measurement::MeasurementSnapshot,
    session::{SessionCache, SessionData, SessionId},
};

/// Protocol versions understood by the negotiator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Version {
    /// SSL 2.0
    Ssl2,
    /// SSL 3.0
    Ssl3,
    /// TLS 1.0
    Tls10,
    /// TLS 1.1
    Tls11,
    /// TLS 1.2
    Tls12,
}

impl Version {
    /// `(major, minor)` as carried in record and hello headers.
    pub const fn wire(self) -> (u8, u8) {
        match self {
            Self::Ssl2 => (2, 0),
            Self::Ssl3 => (3, 0),
            Self::Tls10 => (3, 1),
            Self::Tls11 => (3, 2),
            Self::Tls12 => (3, 3),
        }
    }

    /// Inverse of [`Version::wire`].
    pub const fn from_wire(major: u8, minor: u8) -> Option<Self> {
        match (major, minor) {
            (2, 0) => Some(Self::Ssl2),
            (3, 0) => Some(Self::Ssl3),
            (3, 1) => Some(Self::Tls10),
            (3, 2) => Some(Self::Tls11),
            (3, 3) => Some(Self::Tls12),
            _ => None,
        }
    }
}

/// Cipher suite identifier, as assigned by IANA.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CipherId(pub u16);

impl fmt::Debug for CipherId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CipherId({:#06x})", self.0)
    }
}

/// Compression method identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompressionId(pub u8);

impl CompressionId {
    /// The null compression method every peer supports.
    pub const NULL: Self = Self(0);
}

/// Consulted when a handshake starts; `false` asks the caller to abort.
pub type OnHandshake = Arc<dyn Fn(&MeasurementSnapshot) -> bool + Send + Sync>;

/// Trust decision over a peer's certificate chain.
pub type OnCertificatesRecv = Arc<dyn Fn(&[Certificate]) -> CertificateUsage + Send + Sync>;

/// Resumption lookup.
pub type OnSessionResumption = Arc<dyn Fn(&SessionId) -> Option<SessionData> + Send + Sync>;

/// Cache-store hook for a newly established session.
pub type OnSessionEstablished = Arc<dyn Fn(&SessionId, &SessionData) + Send + Sync>;

/// Cache-evict hook for an invalidated session.
pub type OnSessionInvalidated = Arc<dyn Fn(&SessionId) + Send + Sync>;

/// Immutable per-connection policy.
#[derive(Clone)]
pub struct Params {
    /// Version a client proposes first
    pub connect_version: Version,
    /// Versions the negotiator may settle on
    pub allowed_versions: Vec<Version>,
    /// Cipher suites in preference order
    pub ciphers: Vec<CipherId>,
    /// Compression methods in preference order
    pub compressions: Vec<CompressionId>,
    /// Server role: ask the client for a certificate
    pub want_client_cert: bool,
    /// Send and honor the renegotiation-indication extension
    pub use_secure_renegotiation: bool,
    /// Consult the session callbacks for resumption
    pub use_session: bool,
    /// Certificates available for presentation, leaf first
    pub certificates: Vec<CertifiedKey>,
    /// Wire-level logging sinks
    pub logging: Logging,
    /// See [`OnHandshake`]
    pub on_handshake: OnHandshake,
    /// See [`OnCertificatesRecv`]
    pub on_certificates_recv: OnCertificatesRecv,
    /// See [`OnSessionResumption`]
    pub on_session_resumption: OnSessionResumption,
    /// See [`OnSessionEstablished`]
    pub on_session_established: OnSessionEstablished,
    /// See [`OnSessionInvalidated`]
    pub on_session_invalidated: OnSessionInvalidated,
    /// Client role: session to offer for resumption
    pub session_resume_with: Option<(SessionId, SessionData)>,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            connect_version: Version::Tls12,
            allowed_versions: vec![Version::Tls10, Version::Tls11, Version::Tls12],
            ciphers: Vec::new(),
            compressions: vec![CompressionId::NULL],
            want_client_cert: false,
            use_secure_renegotiation: true,
            use_session: true,
            certificates: Vec::new(),
            logging: Logging::default(),
            on_handshake: Arc::new(|_: &MeasurementSnapshot| true),
            on_certificates_recv: Arc::new(|_: &[Certificate]| CertificateUsage::Accept),
            on_session_resumption: Arc::new(|_: &SessionId| None),
            on_session_established: Arc::new(|_: &SessionId, _: &SessionData| {}),
            on_session_invalidated: Arc::new(|_: &SessionId| {}),
            session_resume_with: None,
        }
    }
}

impl Params {
    /// Whether the negotiator may pick `version`.
    pub fn supports_version(&self, version: Version) -> bool {
        self.allowed_versions.contains(&version)
    }

    /// Replace the handshake-start policy.
    #[must_use]
    pub fn with_on_handshake<F>(mut self, f: F) -> Self
    where
        F: Fn(&MeasurementSnapshot) -> bool + Send + Sync + 'static,
    {
        self.on_handshake = Arc::new(f);
        self
    }

    /// Replace the certificate trust policy.
    #[must_use]
    pub fn with_on_certificates_recv<F>(mut self, f: F) -> Self
    where
        F: Fn(&[Certificate]) -> CertificateUsage + Send + Sync + 'static,
    {
        self.on_certificates_recv = Arc::new(f);
        self
    }

    /// Replace the resumption lookup.
    #[must_use]
    pub fn with_on_session_resumption<F>(mut self, f: F) -> Self
    where
        F: Fn(&SessionId) -> Option<SessionData> + Send + Sync + 'static,
    {
        self.on_session_resumption = Arc::new(f);
        self
    }

    /// Replace the session-established hook.
    #[must_use]
    pub fn with_on_session_established<F>(mut self, f: F) -> Self
    where
        F: Fn(&SessionId, &SessionData) + Send + Sync + 'static,
    {
        self.on_session_established = Arc::new(f);
        self
    }

    /// Replace the session-invalidated hook.
    #[must_use]
    pub fn with_on_session_invalidated<F>(mut self, f: F) -> Self
    where
        F: Fn(&SessionId) + Send + Sync + 'static,
    {
        self.on_session_invalidated = Arc::new(f);
        self
    }

    /// Route all three session callbacks to `cache`.
    #[must_use]
    pub fn with_session_cache<C: SessionCache>(mut self, cache: Arc<C>) -> Self {
        let lookup = Arc::clone(&cache);
        let store = Arc::clone(&cache);
        self.on_session_resumption = Arc::new(move |id: &SessionId| lookup.lookup(id));
        self.on_session_established =
            Arc::new(move |id: &SessionId, data: &SessionData| store.store(id, data));
        self.on_session_invalidated = Arc::new(move |id: &SessionId| cache.invalidate(id));
        self
    }

    /// Ask the handshake-start policy whether to proceed.
    pub fn handshake_allowed(&self, measurement: &MeasurementSnapshot) -> bool {
        (self.on_handshake)(measurement)
    }

    /// Run the trust decision over `chain`.
    pub fn certificate_usage(&self, chain: &[Certificate]) -> CertificateUsage {
        (self.on_certificates_recv)(chain)
    }

    /// Look up a session for resumption.
    pub fn resume_session(&self, id: &SessionId) -> Option<SessionData> {
        (self.on_session_resumption)(id)
    }

    /// Report a newly established session.
    pub fn session_established(&self, id: &SessionId, data: &SessionData) {
        (self.on_session_established)(id, data);
    }

    /// Report an invalidated session.
    pub fn session_invalidated(&self, id: &SessionId) {
        (self.on_session_invalidated)(id);
    }
}

impl fmt::Debug for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Params")
            .field("connect_version", &self.connect_version)
            .field("allowed_versions", &self.allowed_versions)
            .field("ciphers", &self.ciphers)
            .field("compressions", &self.compressions)
            .field("want_client_cert", &self.want_client_cert)
            .field("use_secure_renegotiation", &self.use_secure_renegotiation)
            .field("use_session", &self.use_session)
            .field("certificates", &self.certificates)
            .field("session_resume_with", &self.session_resume_with)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::{cert::RejectReason, session::MemorySessionCache};

    fn session() -> (SessionId, SessionData) {
        (
            SessionId::new([0xaa; 32]),
            SessionData { version: Version::Tls12, cipher: CipherId(0x003c), secret: vec![1; 48] },
        )
    }

    #[test]
    fn default_policy_accepts_and_never_resumes() {
        let params = Params::default();
        let chain = [Certificate(vec![0x30, 0x82])];

        assert_eq!(params.certificate_usage(&chain), CertificateUsage::Accept);
        assert_eq!(params.certificate_usage(&[]), CertificateUsage::Accept);
        assert_eq!(params.resume_session(&SessionId::new([1, 2, 3])), None);
        assert!(params.handshake_allowed(&MeasurementSnapshot::default()));
        assert!(params.session_resume_with.is_none());
    }

    #[test]
    fn default_session_hooks_are_no_ops() {
        let params = Params::default();
        let (id, data) = session();
        params.session_established(&id, &data);
        params.session_invalidated(&id);
    }

    #[test]
    fn version_wire_values() {
        let all = [Version::Ssl2, Version::Ssl3, Version::Tls10, Version::Tls11, Version::Tls12];
        for version in all {
            let (major, minor) = version.wire();
            assert_eq!(Version::from_wire(major, minor), Some(version));
        }
        assert_eq!(Version::from_wire(3, 4), None);
        assert!(Version::Tls12 > Version::Ssl3);
    }

    #[test]
    fn default_versions() {
        let params = Params::default();
        assert!(params.supports_version(params.connect_version));
        assert!(!params.supports_version(Version::Ssl2));
    }

    #[test]
    fn overridden_trust_policy_is_used() {
        let params = Params::default()
            .with_on_certificates_recv(|_| CertificateUsage::Reject(RejectReason::Revoked));
        assert_eq!(
            params.certificate_usage(&[]),
            CertificateUsage::Reject(RejectReason::Revoked)
        );
    }

    #[test]
    fn handshake_policy_sees_measurement() {
        let params = Params::default().with_on_handshake(|m| m.handshakes < 3);
        let mut m = MeasurementSnapshot::default();
        assert!(params.handshake_allowed(&m));
        m.handshakes = 3;
        assert!(!params.handshake_allowed(&m));
    }

    #[test]
    fn session_cache_wiring() {
        let cache = Arc::new(MemorySessionCache::new(8));
        let params = Params::default().with_session_cache(Arc::clone(&cache));
        let (id, data) = session();

        assert_eq!(params.resume_session(&id), None);
        params.session_established(&id, &data);
        assert_eq!(params.resume_session(&id), Some(data));
        params.session_invalidated(&id);
        assert_eq!(params.resume_session(&id), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn cloned_params_share_callbacks() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let params = Params::default().with_on_session_invalidated(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let copy = params.clone();

        params.session_invalidated(&SessionId::new([1]));
        copy.session_invalidated(&SessionId::new([2]));

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn debug_elides_callbacks() {
        let rendered = format!("{:?}", Params::default());
        assert!(rendered.contains("connect_version: Tls12"));
        assert!(rendered.ends_with(".. }"));
    }
}
