//! Fuzz CBOR decoding of cached session data.
//!
//! Cache entries may come from storage shared with other processes, so
//! decoding must reject malformed input without panicking, and anything
//! that does decode must re-encode to something that decodes identically.

#![no_main]

use libfuzzer_sys::fuzz_target;
use tlsctx_core::SessionData;

fuzz_target!(|data: &[u8]| {
    if let Ok(session) = SessionData::from_cbor(data) {
        let encoded = session.to_cbor().expect("decoded session must re-encode");
        let again = SessionData::from_cbor(&encoded).expect("re-encoded session must decode");
        assert_eq!(again, session);
    }
});
