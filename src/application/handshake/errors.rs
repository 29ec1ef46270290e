use thiserror::Error;

use crate::ports::crypto::SignatureError;

/// Terminal outcomes of a handshake attempt.
///
/// Every variant ends the attempt: the machine resets to `Start` with step 1,
/// drops its nonce and learned peer key, and waits for a fresh `start`.
/// Nothing is retried automatically.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeFailure {
    /// A presented signature did not validate against the expected nonce and key.
    #[error("peer signature is invalid")]
    InvalidSignature,

    /// Verification could not be attempted.
    #[error("signature verification could not be performed: {0}")]
    VerifyFailed(VerifyFailure),

    /// The server reported that our proof did not validate.
    #[error("peer rejected our authentication")]
    AuthenticationFailed,

    /// No expected message arrived before the per-step deadline.
    #[error("handshake step timed out")]
    Timeout,
}

/// Why verification could not run.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum VerifyFailure {
    #[error("malformed signature")]
    MalformedSignature,
    #[error("malformed public key")]
    MalformedPublicKey,
    #[error("no peer public key")]
    MissingPublicKey,
    #[error("no outstanding nonce")]
    MissingNonce,
}

impl From<SignatureError> for HandshakeFailure {
    fn from(e: SignatureError) -> Self {
        match e {
            SignatureError::Mismatch => HandshakeFailure::InvalidSignature,
            SignatureError::MalformedSignature => {
                HandshakeFailure::VerifyFailed(VerifyFailure::MalformedSignature)
            }
            SignatureError::MalformedPublicKey => {
                HandshakeFailure::VerifyFailed(VerifyFailure::MalformedPublicKey)
            }
        }
    }
}
