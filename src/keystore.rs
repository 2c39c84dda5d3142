//! Persistence of the device's single P-256 signing key over a
//! [`SecureStore`].
//!
//! The stored format is the raw 32-byte private scalar, and the export
//! format is that scalar base64-encoded with no envelope, version tag, or
//! checksum. Both are server conventions and must not change without a
//! compatibility plan. Anyone holding an exported scalar holds full control
//! of the account; callers must gate `export` behind an explicit user action
//! and surface a warning to that effect.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use p256::ecdsa::SigningKey;
use rand_core::OsRng;
use zeroize::Zeroize;

use crate::errors::IdentityError;
use crate::store::SecureStore;

/// Store identifier for the active identity key.
pub const DEFAULT_KEY_ID: &str = "app.polarwing.identity.p256";

/// Length of a raw P-256 private scalar in bytes.
pub const PRIVATE_SCALAR_LEN: usize = 32;

/// Key persistence over a secure store. Holds no key material in memory;
/// the in-memory active key lives in [`crate::Signer`].
pub struct KeyStore<S: SecureStore> {
    store: S,
    key_id: String,
}

impl<S: SecureStore> KeyStore<S> {
    /// Wrap `store` using the default key identifier.
    pub fn new(store: S) -> Self {
        Self::with_key_id(store, DEFAULT_KEY_ID)
    }

    /// Wrap `store` using a caller-chosen key identifier. Useful when tests
    /// or tools need several identities side by side in one store.
    pub fn with_key_id(store: S, key_id: impl Into<String>) -> Self {
        Self { store, key_id: key_id.into() }
    }

    /// Generate a fresh P-256 keypair and persist its private scalar,
    /// replacing any previously stored key.
    pub fn generate(&self) -> Result<SigningKey, IdentityError> {
        // Delete first so the backing store never holds two entries for the
        // same identifier.
        self.store.delete(&self.key_id)?;
        let key = SigningKey::random(&mut OsRng);
        self.persist(&key)?;
        log::info!("generated new P-256 identity key under '{}'", self.key_id);
        Ok(key)
    }

    /// Recover a previously stored private key.
    ///
    /// Absent and corrupted entries both come back as `Ok(None)`: a bad
    /// entry means "no key yet", never a crash in the caller.
    pub fn load_existing(&self) -> Result<Option<SigningKey>, IdentityError> {
        let Some(mut raw) = self.store.get(&self.key_id)? else {
            return Ok(None);
        };
        let key = decode_scalar(&raw);
        raw.zeroize();
        match key {
            Ok(key) => Ok(Some(key)),
            Err(e) => {
                log::warn!("stored key under '{}' is corrupted ({e}); treating as absent", self.key_id);
                Ok(None)
            }
        }
    }

    /// Base64-encode the raw private scalar of `key` for user-initiated
    /// backup. This value is equivalent to full account control.
    #[must_use]
    pub fn export(&self, key: &SigningKey) -> String {
        let mut raw = key.to_bytes().to_vec();
        let encoded = BASE64.encode(&raw);
        raw.zeroize();
        encoded
    }

    /// Decode and validate an exported private scalar, persisting it as the
    /// new active key.
    pub fn import(&self, encoded: &str) -> Result<SigningKey, IdentityError> {
        let mut raw = BASE64
            .decode(encoded)
            .map_err(|_| IdentityError::InvalidKeyFormat("not valid base64"))?;
        let key = decode_scalar(&raw);
        raw.zeroize();
        let key = key?;
        self.store.delete(&self.key_id)?;
        self.persist(&key)?;
        log::info!("imported P-256 identity key under '{}'", self.key_id);
        Ok(key)
    }

    /// Remove the stored key material unconditionally.
    pub fn delete(&self) -> Result<(), IdentityError> {
        self.store.delete(&self.key_id)?;
        log::info!("deleted identity key under '{}'", self.key_id);
        Ok(())
    }

    fn persist(&self, key: &SigningKey) -> Result<(), IdentityError> {
        let mut raw = key.to_bytes().to_vec();
        let result = self.store.put(&self.key_id, &raw);
        raw.zeroize();
        result
    }
}

/// Parse a raw 32-byte scalar into a signing key.
fn decode_scalar(raw: &[u8]) -> Result<SigningKey, IdentityError> {
    if raw.len() != PRIVATE_SCALAR_LEN {
        return Err(IdentityError::InvalidKeyFormat("scalar is not 32 bytes"));
    }
    SigningKey::from_slice(raw)
        .map_err(|_| IdentityError::InvalidKeyFormat("scalar is not a valid P-256 key"))
}
