//! Proof of key possession over a challenge nonce.

use super::canonical::canonical_encoding;
use crate::ports::{IdentityStore, SignatureError, SignatureVerifier};

/// Sign the canonical encoding of `nonce` with the local identity.
pub fn sign_nonce<I: IdentityStore + ?Sized>(identity: &I, nonce: &[u8]) -> Vec<u8> {
    identity.sign(canonical_encoding(nonce).as_bytes())
}

/// Verify `signature` over the canonical encoding of `nonce`.
///
/// # Errors
/// Propagates the verifier's classification; see [`SignatureError`].
pub fn verify_nonce<V: SignatureVerifier + ?Sized>(
    verifier: &V,
    nonce: &[u8],
    signature: &[u8],
    public_key: &[u8],
) -> Result<(), SignatureError> {
    verifier.verify_detailed(canonical_encoding(nonce).as_bytes(), signature, public_key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::crypto::{P256Identity, P256Verifier};
    use proptest::prelude::*;
    use rand::rngs::OsRng;

    #[test]
    fn signature_over_raw_bytes_is_rejected() {
        let id = P256Identity::generate(&mut OsRng).unwrap();
        let nonce = [0x5au8; 32];
        let raw_sig = id.sign(&nonce);
        assert_eq!(
            verify_nonce(&P256Verifier, &nonce, &raw_sig, &id.public_key()),
            Err(SignatureError::Mismatch),
            "a raw-byte signature must not verify against the canonical text"
        );
    }

    #[test]
    fn wrapped_width_matters() {
        let id = P256Identity::generate(&mut OsRng).unwrap();
        let nonce = [1u8; 64];
        let unwrapped = base64::Engine::encode(&base64::engine::general_purpose::STANDARD, nonce);
        let sig = id.sign(unwrapped.as_bytes());
        assert_eq!(
            verify_nonce(&P256Verifier, &nonce, &sig, &id.public_key()),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn garbage_signature_and_key_are_malformed() {
        let id = P256Identity::generate(&mut OsRng).unwrap();
        let nonce = [0u8; 32];
        let sig = sign_nonce(&id, &nonce);
        assert_eq!(
            verify_nonce(&P256Verifier, &nonce, &[1, 2, 3], &id.public_key()),
            Err(SignatureError::MalformedSignature)
        );
        assert_eq!(
            verify_nonce(&P256Verifier, &nonce, &sig, &[4, 5, 6]),
            Err(SignatureError::MalformedPublicKey)
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_sign_verifies_only_under_own_key(nonce in prop::collection::vec(any::<u8>(), 0..160)) {
            let a = P256Identity::generate(&mut OsRng).unwrap();
            let b = P256Identity::generate(&mut OsRng).unwrap();
            let sig = sign_nonce(&a, &nonce);
            prop_assert!(verify_nonce(&P256Verifier, &nonce, &sig, &a.public_key()).is_ok());
            prop_assert_eq!(
                verify_nonce(&P256Verifier, &nonce, &sig, &b.public_key()),
                Err(SignatureError::Mismatch)
            );
        }
    }
}
