//! The identity handle: the in-memory active keypair, ECDSA-P256-SHA256
//! signing, and signature verification.
//!
//! `Signer` replaces the original client's process-wide singleton with an
//! explicit handle injected into callers; constructing at most one per
//! identity keeps the at-most-one-active-identity semantics. The active key
//! sits behind a `RwLock`: `generate`/`import_private_key`/`delete_key`
//! take the write lock, so they are serialized against every concurrent
//! `sign`/`export_private_key`/`address`, which share the read lock.

use p256::ecdsa::signature::{Signer as _, Verifier as _};
use p256::ecdsa::{Signature as EcdsaSignature, SigningKey, VerifyingKey};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use sha2::{Digest, Sha256};
use std::sync::{Mutex, PoisonError, RwLock};

use crate::address::derive_address;
use crate::errors::IdentityError;
use crate::keystore::KeyStore;
use crate::store::SecureStore;

/// One signing operation's output.
///
/// `digest` is the SHA-256 of `message`, kept for diagnostics and
/// server-side cross-checks. It is not what the signing primitive consumed:
/// ECDSA-P256-SHA256 hashes the raw message again internally.
#[derive(Clone, Debug)]
pub struct Signature {
    /// DER-encoded ECDSA signature.
    pub bytes: Vec<u8>,
    /// The exact byte sequence that was signed.
    pub message: Vec<u8>,
    /// SHA-256 of `message`.
    pub digest: [u8; 32],
}

/// Handle to the device's signing identity.
pub struct Signer<S: SecureStore> {
    keystore: KeyStore<S>,
    active: RwLock<Option<SigningKey>>,
    // Last signature produced, kept for diagnostics only.
    last_signature: Mutex<Option<Signature>>,
}

impl<S: SecureStore> Signer<S> {
    /// Create a handle with no key loaded. Call [`Self::load_existing`] or
    /// [`Self::generate`] before signing.
    #[must_use]
    pub fn new(keystore: KeyStore<S>) -> Self {
        Self {
            keystore,
            active: RwLock::new(None),
            last_signature: Mutex::new(None),
        }
    }

    /// Load a previously persisted key into the handle. Returns whether a
    /// key was found; absent or corrupted stored keys leave the handle in
    /// the no-key state.
    pub fn load_existing(&self) -> Result<bool, IdentityError> {
        let loaded = self.keystore.load_existing()?;
        let found = loaded.is_some();
        *self.write_active() = loaded;
        Ok(found)
    }

    /// Generate and persist a fresh keypair, replacing any active key.
    ///
    /// Regeneration makes the previously advertised address permanently
    /// unreachable by this device; callers must confirm with the user
    /// before invoking it on a loaded identity.
    pub fn generate(&self) -> Result<VerifyingKey, IdentityError> {
        let mut active = self.write_active();
        let key = Self::adopt(&mut active, self.keystore.generate())?;
        Ok(*key.verifying_key())
    }

    /// Decode, validate, and persist an exported private key, replacing any
    /// active key. A key that fails to decode is rejected before the store
    /// is touched, so the previously active key stays loaded.
    pub fn import_private_key(&self, encoded: &str) -> Result<VerifyingKey, IdentityError> {
        let mut active = self.write_active();
        let key = Self::adopt(&mut active, self.keystore.import(encoded))?;
        Ok(*key.verifying_key())
    }

    /// Install a freshly persisted key as the active one. When the store
    /// failed it may already have dropped the previous entry, so the old
    /// in-memory key can no longer be trusted to survive a restart and is
    /// unloaded rather than kept signing for a dead identity.
    fn adopt<'a>(
        active: &'a mut Option<SigningKey>,
        persisted: Result<SigningKey, IdentityError>,
    ) -> Result<&'a SigningKey, IdentityError> {
        match persisted {
            Ok(key) => Ok(active.insert(key)),
            Err(e) => {
                if matches!(e, IdentityError::SecureStoreFailure { .. }) {
                    *active = None;
                }
                Err(e)
            }
        }
    }

    /// Base64-encode the active private scalar for user-initiated backup.
    /// The returned string is equivalent to full account control; gate it
    /// behind an explicit user action and a strong warning.
    pub fn export_private_key(&self) -> Result<String, IdentityError> {
        let active = self.read_active();
        let key = active.as_ref().ok_or(IdentityError::KeyNotFound)?;
        Ok(self.keystore.export(key))
    }

    /// Remove the active key from this handle and from the secure store.
    pub fn delete_key(&self) -> Result<(), IdentityError> {
        let mut active = self.write_active();
        self.keystore.delete()?;
        *active = None;
        Ok(())
    }

    /// The active public key.
    pub fn public_key(&self) -> Result<VerifyingKey, IdentityError> {
        let active = self.read_active();
        active
            .as_ref()
            .map(|key| *key.verifying_key())
            .ok_or(IdentityError::KeyNotFound)
    }

    /// The active public key as its 33-byte compressed SEC1 encoding, the
    /// network-ready form the address is derived from.
    pub fn public_key_bytes(&self) -> Result<Vec<u8>, IdentityError> {
        Ok(self.public_key()?.to_encoded_point(true).as_bytes().to_vec())
    }

    /// Derive the account address of the active public key. Recomputed on
    /// every call; the address is never stored as a source of truth.
    pub fn address(&self) -> Result<String, IdentityError> {
        Ok(derive_address(&self.public_key()?))
    }

    /// Sign `message` with the active key.
    pub fn sign(&self, message: &[u8]) -> Result<Signature, IdentityError> {
        let active = self.read_active();
        let key = active.as_ref().ok_or(IdentityError::KeyNotFound)?;

        let ecdsa_sig: EcdsaSignature = key.sign(message);
        let signature = Signature {
            bytes: ecdsa_sig.to_der().as_bytes().to_vec(),
            message: message.to_vec(),
            digest: Sha256::digest(message).into(),
        };

        let mut last = self
            .last_signature
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *last = Some(signature.clone());
        Ok(signature)
    }

    /// The most recent signature produced by this handle, for diagnostics.
    #[must_use]
    pub fn last_signature(&self) -> Option<Signature> {
        self.last_signature
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Check a DER-encoded signature over `message` against a SEC1-encoded
    /// public key.
    ///
    /// Verification is a predicate and fails closed: malformed signature or
    /// key encodings come back as `false`, never as an error.
    #[must_use]
    pub fn verify(signature_der: &[u8], message: &[u8], public_key_sec1: &[u8]) -> bool {
        let Ok(public_key) = VerifyingKey::from_sec1_bytes(public_key_sec1) else {
            return false;
        };
        let Ok(signature) = EcdsaSignature::from_der(signature_der) else {
            return false;
        };
        public_key.verify(message, &signature).is_ok()
    }

    fn read_active(&self) -> std::sync::RwLockReadGuard<'_, Option<SigningKey>> {
        self.active.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_active(&self) -> std::sync::RwLockWriteGuard<'_, Option<SigningKey>> {
        self.active.write().unwrap_or_else(PoisonError::into_inner)
    }
}
