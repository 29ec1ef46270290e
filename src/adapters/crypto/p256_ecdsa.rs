//! ECDSA over NIST P-256 with SHA-256.
//!
//! Wire encodings match what mobile platform crypto libraries emit:
//! - public keys travel as SubjectPublicKeyInfo DER (and as PEM in the
//!   discovery record);
//! - signatures are ASN.1 DER `ECDSA-Sig-Value`.
//!
//! Signing is deterministic (RFC 6979), so the same identity signing the same
//! canonical nonce text always yields the same bytes.

use p256::ecdsa::signature::{Signer, Verifier};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use p256::pkcs8::{DecodePublicKey, EncodePublicKey, LineEnding};
use p256::{PublicKey, SecretKey};
use rand::{CryptoRng, RngCore};

use super::keystore::KeyError;
use crate::ports::{IdentityStore, SignatureError, SignatureVerifier};

/// A device identity backed by an in-memory P-256 signing key.
///
/// Public encodings are computed once at construction.
pub struct P256Identity {
    secret: SecretKey,
    signing: SigningKey,
    public_der: Vec<u8>,
    public_pem: String,
}

impl P256Identity {
    /// Generate a fresh identity.
    ///
    /// # Errors
    /// Returns `KeyError::Spki` if the public key cannot be encoded.
    pub fn generate<R: CryptoRng + RngCore>(rng: &mut R) -> Result<Self, KeyError> {
        Self::from_secret_key(&SecretKey::random(rng))
    }

    /// Wrap an existing secret key.
    ///
    /// # Errors
    /// Returns `KeyError::Spki` if the public key cannot be encoded.
    pub fn from_secret_key(secret: &SecretKey) -> Result<Self, KeyError> {
        let public = secret.public_key();
        let public_der = public.to_public_key_der()?.as_bytes().to_vec();
        let public_pem = public.to_public_key_pem(LineEnding::LF)?;
        Ok(Self {
            secret: secret.clone(),
            signing: SigningKey::from(secret),
            public_der,
            public_pem,
        })
    }

    /// Public key as SubjectPublicKeyInfo PEM, for the discovery record.
    #[must_use]
    pub fn public_key_pem(&self) -> &str {
        &self.public_pem
    }

    /// Public key as SubjectPublicKeyInfo DER.
    #[must_use]
    pub fn public_key_der(&self) -> &[u8] {
        &self.public_der
    }

    pub(crate) fn secret_key(&self) -> &SecretKey {
        &self.secret
    }
}

impl std::fmt::Debug for P256Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("P256Identity")
            .field("public_der_len", &self.public_der.len())
            .finish_non_exhaustive()
    }
}

impl IdentityStore for P256Identity {
    fn public_key(&self) -> Vec<u8> {
        self.public_der.clone()
    }

    fn sign(&self, message: &[u8]) -> Vec<u8> {
        let sig: Signature = self.signing.sign(message);
        sig.to_der().as_bytes().to_vec()
    }
}

/// Stateless P-256 signature verifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct P256Verifier;

impl SignatureVerifier for P256Verifier {
    fn verify_detailed(
        &self,
        message: &[u8],
        signature: &[u8],
        public_key: &[u8],
    ) -> Result<(), SignatureError> {
        let sig = Signature::from_der(signature).map_err(|_| SignatureError::MalformedSignature)?;
        let key = PublicKey::from_public_key_der(public_key)
            .map_err(|_| SignatureError::MalformedPublicKey)?;
        VerifyingKey::from(&key)
            .verify(message, &sig)
            .map_err(|_| SignatureError::Mismatch)
    }
}
