// src/ports/crypto.rs

/// Reasons a signature check did not succeed.
///
/// `MalformedSignature` and `MalformedPublicKey` mean verification could not
/// even be attempted; `Mismatch` means it ran and the signature is wrong.
#[derive(Debug, Clone, Copy, thiserror::Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("signature bytes are not a valid encoding")]
    MalformedSignature,
    #[error("public key bytes are not a valid encoding")]
    MalformedPublicKey,
    #[error("signature does not match message and key")]
    Mismatch,
}

/// Trait for verifying detached signatures against a peer's public key.
///
/// An implementor of `SignatureVerifier` checks that `signature` was produced
/// over exactly `message` by the private key matching `public_key`. The
/// message passed in is already the canonical text form of a nonce; this
/// trait never re-encodes its input.
///
/// Encodings (for the P-256 adapter):
/// - `public_key`: SubjectPublicKeyInfo DER.
/// - `signature`: ASN.1 DER `ECDSA-Sig-Value` over SHA-256 of `message`.
///
/// Error handling:
/// - Never panics on attacker-controlled input. Garbage signature or key
///   bytes map to the `Malformed*` variants.
/// - Callers that only need a yes/no answer use [`SignatureVerifier::verify`].
///
/// Thread safety:
/// Implementations are expected to be stateless and cheap to share.
pub trait SignatureVerifier {
    /// Verify and classify the outcome.
    ///
    /// # Errors
    /// - `SignatureError::MalformedSignature` if `signature` does not decode.
    /// - `SignatureError::MalformedPublicKey` if `public_key` does not decode.
    /// - `SignatureError::Mismatch` if the signature does not validate.
    fn verify_detailed(
        &self,
        message: &[u8],
        signature: &[u8],
        public_key: &[u8],
    ) -> Result<(), SignatureError>;

    /// `true` only if the signature validates. Never fails.
    fn verify(&self, message: &[u8], signature: &[u8], public_key: &[u8]) -> bool {
        self.verify_detailed(message, signature, public_key).is_ok()
    }
}

impl<V: SignatureVerifier + ?Sized> SignatureVerifier for &V {
    fn verify_detailed(
        &self,
        message: &[u8],
        signature: &[u8],
        public_key: &[u8],
    ) -> Result<(), SignatureError> {
        (**self).verify_detailed(message, signature, public_key)
    }
}
