//! Recording wrapper for configuration callbacks.
//!
//! Wraps the trust and session callbacks of a [`Params`] so tests can assert
//! which hooks fired, in what order, and how often, while the wrapped
//! callbacks still make the actual decisions.

use std::sync::{Arc, Mutex, PoisonError};

use tlsctx_core::{Certificate, CertificateUsage, Params, SessionData, SessionId};

/// One observed callback invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookEvent {
    /// Trust callback ran over a chain of this many certificates
    CertificatesRecv {
        /// Chain length
        chain_len: usize,
        /// Decision returned
        usage: CertificateUsage,
    },
    /// Resumption lookup ran
    Resumption {
        /// Session looked up
        id: SessionId,
        /// Whether a session came back
        hit: bool,
    },
    /// Session-established hook ran
    Established(SessionId),
    /// Session-invalidated hook ran
    Invalidated(SessionId),
}

/// Shared log of callback invocations.
#[derive(Debug, Clone, Default)]
pub struct HookRecorder {
    events: Arc<Mutex<Vec<HookEvent>>>,
}

impl HookRecorder {
    /// Empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap the trust and session callbacks of `params`.
    ///
    /// The returned configuration behaves exactly like `params` and logs
    /// every invocation to this recorder.
    pub fn wrap(&self, params: Params) -> Params {
        let trust = Arc::clone(&params.on_certificates_recv);
        let resume = Arc::clone(&params.on_session_resumption);
        let established = Arc::clone(&params.on_session_established);
        let invalidated = Arc::clone(&params.on_session_invalidated);

        let log = self.clone();
        let params = params.with_on_certificates_recv(move |chain| {
            let usage = trust(chain);
            log.push(HookEvent::CertificatesRecv { chain_len: chain.len(), usage: usage.clone() });
            usage
        });

        let log = self.clone();
        let params = params.with_on_session_resumption(move |id| {
            let found = resume(id);
            log.push(HookEvent::Resumption { id: id.clone(), hit: found.is_some() });
            found
        });

        let log = self.clone();
        let params = params.with_on_session_established(move |id, data: &SessionData| {
            log.push(HookEvent::Established(id.clone()));
            established(id, data);
        });

        let log = self.clone();
        params.with_on_session_invalidated(move |id| {
            log.push(HookEvent::Invalidated(id.clone()));
            invalidated(id);
        })
    }

    /// Everything recorded so far.
    pub fn events(&self) -> Vec<HookEvent> {
        self.lock().clone()
    }

    /// Number of established-hook invocations.
    pub fn established_count(&self) -> usize {
        self.lock().iter().filter(|e| matches!(e, HookEvent::Established(_))).count()
    }

    /// Number of invalidated-hook invocations.
    pub fn invalidated_count(&self) -> usize {
        self.lock().iter().filter(|e| matches!(e, HookEvent::Invalidated(_))).count()
    }

    fn push(&self, event: HookEvent) {
        self.lock().push(event);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<HookEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Certificate chain of `len` dummy certificates.
pub fn dummy_chain(len: usize) -> Vec<Certificate> {
    (0..len).map(|i| Certificate(vec![0x30, 0x82, i as u8])).collect()
}

#[cfg(test)]
mod tests {
    use tlsctx_core::{CipherId, Version};

    use super::*;

    #[test]
    fn records_and_delegates() {
        let recorder = HookRecorder::new();
        let params = recorder.wrap(Params::default());
        let id = SessionId::new([4, 2]);
        let data =
            SessionData { version: Version::Tls12, cipher: CipherId(0x009c), secret: vec![0; 48] };

        assert_eq!(params.certificate_usage(&dummy_chain(2)), CertificateUsage::Accept);
        assert_eq!(params.resume_session(&id), None);
        params.session_established(&id, &data);
        params.session_invalidated(&id);

        assert_eq!(
            recorder.events(),
            vec![
                HookEvent::CertificatesRecv { chain_len: 2, usage: CertificateUsage::Accept },
                HookEvent::Resumption { id: id.clone(), hit: false },
                HookEvent::Established(id.clone()),
                HookEvent::Invalidated(id),
            ]
        );
        assert_eq!(recorder.established_count(), 1);
        assert_eq!(recorder.invalidated_count(), 1);
    }
}
