use crate::domain::handshake::errors::MessageError;
use crate::domain::handshake::nonce::HandshakeNonce;
use crate::domain::handshake::params::FIELD_MAX;
use core::fmt;
use serde::{Deserialize, Serialize};

fn check_len(field: &'static str, bytes: &[u8]) -> Result<(), MessageError> {
    if bytes.len() > FIELD_MAX {
        return Err(MessageError::TooLarge {
            field,
            max: FIELD_MAX,
            actual: bytes.len(),
        });
    }
    Ok(())
}

/// Challenge carrying a nonce the receiver must sign. Sent client → server
/// first, then server → client as the counter-challenge.
///
/// Inbound nonces are accepted at any length up to the defensive bound; only
/// locally generated nonces are guaranteed to be 32 bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NonceRequest {
    #[serde(with = "super::byte_string_serde")]
    pub nonce: Vec<u8>,
}

impl NonceRequest {
    /// Wrap a freshly generated nonce.
    #[must_use]
    pub fn new(nonce: &HandshakeNonce) -> Self {
        Self {
            nonce: nonce.as_bytes().to_vec(),
        }
    }

    /// Build from arbitrary nonce bytes (e.g. test vectors).
    ///
    /// # Errors
    /// See [`NonceRequest::validate`].
    pub fn from_bytes(nonce: Vec<u8>) -> Result<Self, MessageError> {
        let m = Self { nonce };
        m.validate()?;
        Ok(m)
    }

    /// # Errors
    /// Returns `MessageError::TooLarge` if the nonce exceeds the defensive bound.
    pub fn validate(&self) -> Result<(), MessageError> {
        check_len("NonceRequest.nonce", &self.nonce)
    }
}

/// The client's long-lived public key (SubjectPublicKeyInfo DER), sent to the
/// server after the server has proven its own identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IdentityPublicKey {
    #[serde(with = "super::byte_string_serde")]
    pub pubkey: Vec<u8>,
}

impl IdentityPublicKey {
    /// # Errors
    /// See [`IdentityPublicKey::validate`].
    pub fn new(pubkey: Vec<u8>) -> Result<Self, MessageError> {
        let m = Self { pubkey };
        m.validate()?;
        Ok(m)
    }

    /// # Errors
    /// Returns `MessageError::TooLarge` if the key exceeds the defensive bound.
    pub fn validate(&self) -> Result<(), MessageError> {
        check_len("IdentityPublicKey.pubkey", &self.pubkey)
    }
}

/// DER-encoded ECDSA signature over the canonical encoding of a previously
/// received nonce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignedNonce {
    #[serde(with = "super::byte_string_serde")]
    pub signature: Vec<u8>,
}

impl SignedNonce {
    /// # Errors
    /// See [`SignedNonce::validate`].
    pub fn new(signature: Vec<u8>) -> Result<Self, MessageError> {
        let m = Self { signature };
        m.validate()?;
        Ok(m)
    }

    /// # Errors
    /// Returns `MessageError::TooLarge` if the signature exceeds the defensive bound.
    pub fn validate(&self) -> Result<(), MessageError> {
        check_len("SignedNonce.signature", &self.signature)
    }
}

/// The server's verdict on the client's proof of key possession.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignatureVerificationResult {
    pub valid: bool,
}

/// Discriminant of the four handshake message kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    NonceRequest,
    IdentityPublicKey,
    SignedNonce,
    SignatureVerificationResult,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MessageKind::NonceRequest => "NonceRequest",
            MessageKind::IdentityPublicKey => "IdentityPublicKey",
            MessageKind::SignedNonce => "SignedNonce",
            MessageKind::SignatureVerificationResult => "SignatureVerificationResult",
        };
        f.write_str(s)
    }
}

/// Any one of the four handshake messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    NonceRequest(NonceRequest),
    IdentityPublicKey(IdentityPublicKey),
    SignedNonce(SignedNonce),
    SignatureVerificationResult(SignatureVerificationResult),
}

impl Message {
    #[must_use]
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::NonceRequest(_) => MessageKind::NonceRequest,
            Message::IdentityPublicKey(_) => MessageKind::IdentityPublicKey,
            Message::SignedNonce(_) => MessageKind::SignedNonce,
            Message::SignatureVerificationResult(_) => MessageKind::SignatureVerificationResult,
        }
    }

    /// # Errors
    /// Propagates the variant's `validate` error.
    pub fn validate(&self) -> Result<(), MessageError> {
        match self {
            Message::NonceRequest(m) => m.validate(),
            Message::IdentityPublicKey(m) => m.validate(),
            Message::SignedNonce(m) => m.validate(),
            Message::SignatureVerificationResult(_) => Ok(()),
        }
    }
}

impl From<NonceRequest> for Message {
    fn from(m: NonceRequest) -> Self {
        Message::NonceRequest(m)
    }
}
impl From<IdentityPublicKey> for Message {
    fn from(m: IdentityPublicKey) -> Self {
        Message::IdentityPublicKey(m)
    }
}
impl From<SignedNonce> for Message {
    fn from(m: SignedNonce) -> Self {
        Message::SignedNonce(m)
    }
}
impl From<SignatureVerificationResult> for Message {
    fn from(m: SignatureVerificationResult) -> Self {
        Message::SignatureVerificationResult(m)
    }
}
