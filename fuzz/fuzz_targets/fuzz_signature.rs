#![no_main]

//! Fuzz target for SharedKey signing.
//!
//! Any secret either signs or fails with a `SignatureError`. A produced
//! signature must verify against the same metadata and be rejected for any
//! other content length.
//!
//! ```bash
//! cargo fuzz run fuzz_signature
//! ```

use arbitrary::Arbitrary;
use data_proxy::signature::{SignedRequest, verify};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    workspace_id: String,
    content_length: u32,
    timestamp: String,
    secret: String,
    authorization: String,
}

fuzz_target!(|input: Input| {
    let len = input.content_length as usize;

    // Untrusted headers must never panic the verifier.
    let _ = verify(
        &input.authorization,
        &input.workspace_id,
        len,
        &input.timestamp,
        &input.secret,
    );

    let Ok(signed) = SignedRequest::new(
        &input.workspace_id,
        len,
        input.timestamp.clone(),
        &input.secret,
    ) else {
        return;
    };

    assert!(signed.authorization.starts_with("SharedKey "));
    // Ids containing ':' cannot round-trip through the header format.
    if !input.workspace_id.contains(':') {
        assert!(
            verify(
                &signed.authorization,
                &input.workspace_id,
                len,
                &input.timestamp,
                &input.secret,
            )
            .is_ok()
        );
        assert!(
            verify(
                &signed.authorization,
                &input.workspace_id,
                len + 1,
                &input.timestamp,
                &input.secret,
            )
            .is_err()
        );
    }
});
