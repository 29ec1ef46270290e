use thiserror::Error;

use crate::application::handshake::{HandshakeFailure, Role};
use crate::application::transfer::TransferError;
use crate::core::cbor::CodecError;
use crate::ports::TransportError;

/// Errors returned by the session API.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("not authenticated")]
    NotAuthenticated,

    #[error("operation requires the {expected:?} role")]
    WrongRole { expected: Role },

    #[error("client start requires a peer descriptor")]
    MissingPeer,

    #[error("session already started; stop it first")]
    AlreadyStarted,

    #[error("a transfer is already in flight")]
    TransferInProgress,

    #[error("handshake failed: {0}")]
    Handshake(#[from] HandshakeFailure),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("transfer error: {0}")]
    Transfer(#[from] TransferError),

    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}
