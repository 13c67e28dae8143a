//! Certificate material and trust decisions.
//!
//! Certificates are carried as opaque DER bytes. Decoding and signature
//! verification belong to the handshake layer; this module only names the
//! values that cross the trust callback.

use std::fmt;

/// DER-encoded X.509 certificate.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Certificate(pub Vec<u8>);

impl fmt::Debug for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Certificate(<{} bytes>)", self.0.len())
    }
}

/// Encoded private key matching a [`Certificate`].
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateKey(pub Vec<u8>);

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(<redacted>)")
    }
}

/// A certificate available for presentation, with its key when we hold it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertifiedKey {
    /// Certificate presented to the peer
    pub certificate: Certificate,
    /// Signing key, absent for intermediate certificates
    pub key: Option<PrivateKey>,
}

impl CertifiedKey {
    /// Certificate with its private key.
    pub fn new(certificate: Certificate, key: PrivateKey) -> Self {
        Self { certificate, key: Some(key) }
    }

    /// Certificate without a key (chain intermediate).
    pub fn intermediate(certificate: Certificate) -> Self {
        Self { certificate, key: None }
    }
}

/// Why a certificate chain was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// A certificate is outside its validity period
    Expired,
    /// A certificate has been revoked
    Revoked,
    /// The chain does not lead to a trusted authority
    UnknownCa,
    /// Any other reason
    Other(String),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expired => f.write_str("certificate expired"),
            Self::Revoked => f.write_str("certificate revoked"),
            Self::UnknownCa => f.write_str("unknown certificate authority"),
            Self::Other(reason) => f.write_str(reason),
        }
    }
}

/// Outcome of a trust decision over a peer's certificate chain.
///
/// The context never acts on a rejection; the handshake layer decides
/// whether to alert and abort.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CertificateUsage {
    /// Chain is acceptable
    Accept,
    /// Chain is refused
    Reject(RejectReason),
}

impl CertificateUsage {
    /// Whether the chain was accepted.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accept)
    }
}
