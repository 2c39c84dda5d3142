//! Sui-style account address derivation.
//!
//! address = "0x" || hex( BLAKE2b-256( flag || compressed_pubkey ) )
//!
//! The flag byte identifies the signature scheme (0x02 = secp256r1) and the
//! public key is its 33-byte compressed SEC1 encoding, so an address is a
//! pure function of the public key. It is recomputable at any time and never
//! stored as a source of truth.

use p256::ecdsa::VerifyingKey;
use p256::elliptic_curve::sec1::ToEncodedPoint;

use crate::blake2b;

/// Scheme flag byte for ECDSA over secp256r1.
pub const SCHEME_SECP256R1: u8 = 0x02;

/// Address digest width in bytes (renders as 64 hex chars after "0x").
pub const ADDRESS_DIGEST_LEN: usize = 32;

/// Derive the account address for `public_key`.
#[must_use]
pub fn derive_address(public_key: &VerifyingKey) -> String {
    let point = public_key.to_encoded_point(true);
    let mut preimage = Vec::with_capacity(1 + point.as_bytes().len());
    preimage.push(SCHEME_SECP256R1);
    preimage.extend_from_slice(point.as_bytes());
    format!("0x{}", hex::encode(blake2b::hash256(&preimage)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use p256::ecdsa::SigningKey;

    fn fixed_key() -> SigningKey {
        SigningKey::from_slice(&[0x01u8; 32]).unwrap()
    }

    #[test]
    fn address_format() {
        let addr = derive_address(fixed_key().verifying_key());
        assert!(addr.starts_with("0x"));
        assert_eq!(addr.len(), 2 + 2 * ADDRESS_DIGEST_LEN);
        assert!(addr[2..].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn address_is_deterministic() {
        let key = fixed_key();
        assert_eq!(derive_address(key.verifying_key()), derive_address(key.verifying_key()));
    }

    #[test]
    fn different_keys_get_different_addresses() {
        let a = SigningKey::from_slice(&[0x01u8; 32]).unwrap();
        let b = SigningKey::from_slice(&[0x02u8; 32]).unwrap();
        assert_ne!(derive_address(a.verifying_key()), derive_address(b.verifying_key()));
    }
}
