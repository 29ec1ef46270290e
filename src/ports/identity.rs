//! Identity port: the device's long-lived signing key.
//!
//! The key is created once per device and restored on every start (see
//! `adapters::crypto::keystore`). A value implementing this trait always holds
//! a usable key, so signing is infallible; "no identity yet" is handled by the
//! caller before any session is constructed.
use std::sync::Arc;

/// Signing half of a device identity.
pub trait IdentityStore {
    /// Public key as SubjectPublicKeyInfo DER, as sent in `IdentityPublicKey`.
    fn public_key(&self) -> Vec<u8>;

    /// Sign `message` exactly as given and return the DER signature.
    ///
    /// Callers pass the canonical nonce text, not raw nonce bytes.
    fn sign(&self, message: &[u8]) -> Vec<u8>;
}

impl<T: IdentityStore + ?Sized> IdentityStore for &T {
    fn public_key(&self) -> Vec<u8> {
        (**self).public_key()
    }
    fn sign(&self, message: &[u8]) -> Vec<u8> {
        (**self).sign(message)
    }
}

impl<T: IdentityStore + ?Sized> IdentityStore for Arc<T> {
    fn public_key(&self) -> Vec<u8> {
        (**self).public_key()
    }
    fn sign(&self, message: &[u8]) -> Vec<u8> {
        (**self).sign(message)
    }
}
