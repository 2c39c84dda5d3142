#![forbid(unsafe_code)]
#![deny(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::cast_possible_truncation
)]

//! Polarwing identity core
//!
//! This crate implements the cryptographic identity and request-signing core
//! of the Polarwing client: a from-scratch BLAKE2b hash (RFC 7693) used to
//! derive a Sui-style account address from a P-256 public key, a secure
//! key store for the device's single signing keypair, and ECDSA-P256-SHA256
//! request authentication.
//
// Fixed cryptographic choices:
// - Hash: BLAKE2b, unkeyed, caller-chosen output length 1..=64
// - Signature: ECDSA over secp256r1 (P-256), SHA-256 message digest, DER
// - Address: 0x02 scheme flag || compressed SEC1 point, BLAKE2b-256, 0x-hex
// - Key export: raw 32-byte scalar, base64 (no envelope; server convention)
//
// The HTTP layer, UI, and any blockchain node interaction live outside this
// crate; callers receive an `AuthHeaders` bundle and place it into outbound
// requests themselves.

pub mod address;
pub mod auth;
pub mod blake2b;
pub mod errors;
pub mod keystore;
pub mod signer;
pub mod store;

pub use address::{derive_address, ADDRESS_DIGEST_LEN, SCHEME_SECP256R1};
pub use auth::{canonical_message, AuthHeaders, RequestAuthenticator};
pub use errors::IdentityError;
pub use keystore::{KeyStore, DEFAULT_KEY_ID, PRIVATE_SCALAR_LEN};
pub use signer::{Signature, Signer};
pub use store::{FileStore, MemoryStore, SecureStore};

/// Crate version, surfaced for diagnostics.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
