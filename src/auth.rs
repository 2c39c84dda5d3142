//! Request authentication: canonical message construction and the header
//! bundle handed to the HTTP layer.
//!
//! The server re-derives and checks the exact concatenation
//! `action || timestamp || nonce` (decimal strings, no separators), so the
//! byte layout here is a wire convention, not a style choice.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use rand_core::{OsRng, RngCore};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::errors::IdentityError;
use crate::signer::Signer;
use crate::store::SecureStore;

/// Ephemeral per-request authentication bundle. Constructed for one
/// outgoing call and never persisted.
#[derive(Clone, Debug)]
pub struct AuthHeaders {
    /// Account address of the signing identity ("0x" + 64 hex chars).
    pub address: String,
    /// Compressed SEC1 public key, base64.
    pub public_key_b64: String,
    /// DER-encoded ECDSA signature over the canonical message, base64.
    pub signature_b64: String,
    /// Short verb naming the privileged action, e.g. "upload".
    pub action: String,
    /// Unix seconds at signing time.
    pub timestamp: u64,
    /// Per-request random positive nonce.
    pub nonce: u64,
}

impl AuthHeaders {
    /// Render the bundle as the header names the Polarwing backend expects.
    #[must_use]
    pub fn header_pairs(&self) -> [(&'static str, String); 6] {
        [
            ("X-Sui-Address", self.address.clone()),
            ("X-Sui-Public-Key", self.public_key_b64.clone()),
            ("X-Sui-Signature", self.signature_b64.clone()),
            ("X-Sui-Action", self.action.clone()),
            ("X-Sui-Timestamp", self.timestamp.to_string()),
            ("X-Sui-Nonce", self.nonce.to_string()),
        ]
    }
}

/// Build the canonical signed message for an action.
///
/// `action`, the decimal timestamp, and the decimal nonce are concatenated
/// with no separators; the server rebuilds the same bytes to verify.
#[must_use]
pub fn canonical_message(action: &str, timestamp: u64, nonce: u64) -> Vec<u8> {
    format!("{action}{timestamp}{nonce}").into_bytes()
}

/// Signs canonical request messages and packages the result for the HTTP
/// layer. Borrows the identity handle; does no I/O of its own.
pub struct RequestAuthenticator<'a, S: SecureStore> {
    signer: &'a Signer<S>,
}

impl<'a, S: SecureStore> RequestAuthenticator<'a, S> {
    #[must_use]
    pub const fn new(signer: &'a Signer<S>) -> Self {
        Self { signer }
    }

    /// Authorize `action` with the current time and a fresh random nonce.
    pub fn authorize(&self, action: &str) -> Result<AuthHeaders, IdentityError> {
        self.authorize_at(action, unix_now(), random_nonce())
    }

    /// Authorize `action` with explicit timestamp and nonce. Deterministic;
    /// used by tests and by callers that manage their own nonce policy.
    pub fn authorize_at(
        &self,
        action: &str,
        timestamp: u64,
        nonce: u64,
    ) -> Result<AuthHeaders, IdentityError> {
        let message = canonical_message(action, timestamp, nonce);
        let signature = self.signer.sign(&message)?;
        Ok(AuthHeaders {
            address: self.signer.address()?,
            public_key_b64: BASE64.encode(self.signer.public_key_bytes()?),
            signature_b64: BASE64.encode(&signature.bytes),
            action: action.to_owned(),
            timestamp,
            nonce,
        })
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Random positive 63-bit nonce from the OS RNG, never zero. The entropy
/// makes replay within the server's timestamp window practically
/// infeasible; the window policy itself belongs to the server.
fn random_nonce() -> u64 {
    loop {
        let n = OsRng.next_u64() >> 1;
        if n != 0 {
            return n;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keystore::KeyStore;
    use crate::store::MemoryStore;

    #[test]
    fn canonical_message_layout() {
        assert_eq!(canonical_message("upload", 1_700_000_000, 42), b"upload170000000042");
        // No separators: ("ab", 1, 23) and ("ab", 12, 3) collide by design;
        // the server owns that trade-off and both sides must agree on it.
        assert_eq!(canonical_message("ab", 1, 23), canonical_message("ab", 12, 3));
    }

    #[test]
    fn authorize_at_is_verifiable() {
        let signer = Signer::new(KeyStore::new(MemoryStore::new()));
        signer.generate().unwrap();
        let auth = RequestAuthenticator::new(&signer);

        let headers = auth.authorize_at("upload", 1_700_000_000, 42).unwrap();
        let message = canonical_message(&headers.action, headers.timestamp, headers.nonce);
        let signature = BASE64.decode(&headers.signature_b64).unwrap();
        let public_key = BASE64.decode(&headers.public_key_b64).unwrap();
        assert!(Signer::<MemoryStore>::verify(&signature, &message, &public_key));
        assert_eq!(headers.address, signer.address().unwrap());
    }

    #[test]
    fn authorize_without_key_fails() {
        let signer: Signer<MemoryStore> = Signer::new(KeyStore::new(MemoryStore::new()));
        let auth = RequestAuthenticator::new(&signer);
        assert!(matches!(
            auth.authorize("upload").unwrap_err(),
            IdentityError::KeyNotFound
        ));
    }

    #[test]
    fn header_pairs_use_backend_names() {
        let signer = Signer::new(KeyStore::new(MemoryStore::new()));
        signer.generate().unwrap();
        let headers = RequestAuthenticator::new(&signer)
            .authorize_at("upload", 1_700_000_000, 42)
            .unwrap();
        let pairs = headers.header_pairs();
        assert_eq!(pairs[0].0, "X-Sui-Address");
        assert_eq!(pairs[4].1, "1700000000");
        assert_eq!(pairs[5].1, "42");
    }

    #[test]
    fn random_nonce_is_positive() {
        for _ in 0..32 {
            assert!(random_nonce() > 0);
        }
    }
}
