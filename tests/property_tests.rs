//! Property-based tests for the hash engine and the sign/verify flow.

use polarwing_identity::{blake2b, derive_address, KeyStore, MemoryStore, Signer};
use proptest::prelude::*;

fn loaded_signer() -> Signer<MemoryStore> {
    let signer = Signer::new(KeyStore::new(MemoryStore::new()));
    signer.generate().expect("key generation");
    signer
}

proptest! {
    // For all byte strings m and all valid n: len(hash(m, n)) == n.
    #[test]
    fn hash_output_length(m in prop::collection::vec(any::<u8>(), 0..512), n in 1usize..=64) {
        prop_assert_eq!(blake2b::hash(&m, n).len(), n);
    }

    #[test]
    fn hash_is_deterministic(m in prop::collection::vec(any::<u8>(), 0..512), n in 1usize..=64) {
        prop_assert_eq!(blake2b::hash(&m, n), blake2b::hash(&m, n));
    }

    // Appending a byte must change the digest (collision here would be a
    // padding/counter bug, not bad luck).
    #[test]
    fn trailing_byte_changes_digest(m in prop::collection::vec(any::<u8>(), 0..256), b in any::<u8>()) {
        let mut extended = m.clone();
        extended.push(b);
        prop_assert_ne!(blake2b::hash(&m, 32), blake2b::hash(&extended, 32));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn sign_then_verify_succeeds(m in prop::collection::vec(any::<u8>(), 0..256)) {
        let signer = loaded_signer();
        let pk = signer.public_key_bytes().expect("public key");
        let sig = signer.sign(&m).expect("sign");
        prop_assert!(Signer::<MemoryStore>::verify(&sig.bytes, &m, &pk));
    }

    #[test]
    fn bit_flip_in_message_fails_verification(
        m in prop::collection::vec(any::<u8>(), 1..256),
        byte_index in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        let signer = loaded_signer();
        let pk = signer.public_key_bytes().expect("public key");
        let sig = signer.sign(&m).expect("sign");

        let mut tampered = m.clone();
        let i = byte_index.index(tampered.len());
        tampered[i] ^= 1 << bit;
        prop_assert!(!Signer::<MemoryStore>::verify(&sig.bytes, &tampered, &pk));
    }

    #[test]
    fn bit_flip_in_signature_fails_verification(
        m in prop::collection::vec(any::<u8>(), 0..256),
        byte_index in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        let signer = loaded_signer();
        let pk = signer.public_key_bytes().expect("public key");
        let sig = signer.sign(&m).expect("sign");

        let mut tampered = sig.bytes.clone();
        let i = byte_index.index(tampered.len());
        tampered[i] ^= 1 << bit;
        // Either the DER parse fails or the signature check fails; both
        // must come back false.
        prop_assert!(!Signer::<MemoryStore>::verify(&tampered, &m, &pk));
    }

    #[test]
    fn bit_flip_in_public_key_fails_verification(
        m in prop::collection::vec(any::<u8>(), 0..256),
        byte_index in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        let signer = loaded_signer();
        let pk = signer.public_key_bytes().expect("public key");
        let sig = signer.sign(&m).expect("sign");

        let mut tampered = pk.clone();
        let i = byte_index.index(tampered.len());
        tampered[i] ^= 1 << bit;
        if tampered != pk {
            prop_assert!(!Signer::<MemoryStore>::verify(&sig.bytes, &m, &tampered));
        }
    }

    #[test]
    fn distinct_keys_have_distinct_addresses(_seed in any::<u64>()) {
        let a = loaded_signer();
        let b = loaded_signer();
        prop_assert_ne!(a.address().expect("address"), b.address().expect("address"));
        prop_assert_eq!(
            derive_address(&a.public_key().expect("public key")),
            a.address().expect("address")
        );
    }
}
