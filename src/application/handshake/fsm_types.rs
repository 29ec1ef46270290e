use crate::domain::handshake::{Message, MessageKind};
use crate::protocol::handshake::wire::DecodeError;

use super::errors::HandshakeFailure;

/// Endpoint role during the handshake.
///
/// The client is the radio central that scanned the server's discovery record
/// and already trusts its public key. The server learns the client's key
/// during the exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Sends the first challenge, checks the server's proof, then proves itself.
    Client,
    /// Answers the first challenge, collects the client's key, then challenges it.
    Server,
}

/// Progress of one handshake attempt (`HandshakeFsm`).
///
/// Transitions only move forward; the single way back to `Start` is a reset
/// (explicit stop or terminal failure).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    /// Not started, or reset after stop/failure. Inbound traffic is ignored.
    Start,
    /// Client sent `NonceRequest{Nc}`; expects `SignedNonce` over Nc.
    AwaitServerProof,
    /// Client sent its public key; expects the server's `NonceRequest{Ns}`.
    AwaitServerChallenge,
    /// Client sent its proof over Ns; expects `SignatureVerificationResult`.
    AwaitVerificationResult,
    /// Server is listening; expects `NonceRequest{Nc}`.
    AwaitClientChallenge,
    /// Server proved itself; expects `IdentityPublicKey`.
    AwaitClientKey,
    /// Server sent `NonceRequest{Ns}`; expects `SignedNonce` over Ns.
    AwaitClientProof,
    /// Both sides proved key possession.
    Authenticated,
}

impl HandshakeState {
    /// Step counter as seen by observers. Starts at 1 and only increases
    /// within one attempt.
    #[must_use]
    pub fn step(self) -> u8 {
        match self {
            HandshakeState::Start
            | HandshakeState::AwaitServerProof
            | HandshakeState::AwaitClientChallenge => 1,
            HandshakeState::AwaitServerChallenge | HandshakeState::AwaitClientKey => 2,
            HandshakeState::AwaitVerificationResult | HandshakeState::AwaitClientProof => 3,
            HandshakeState::Authenticated => 4,
        }
    }

    /// The one message kind accepted in this state, if any.
    #[must_use]
    pub fn expected(self) -> Option<MessageKind> {
        match self {
            HandshakeState::AwaitServerProof | HandshakeState::AwaitClientProof => {
                Some(MessageKind::SignedNonce)
            }
            HandshakeState::AwaitServerChallenge | HandshakeState::AwaitClientChallenge => {
                Some(MessageKind::NonceRequest)
            }
            HandshakeState::AwaitVerificationResult => {
                Some(MessageKind::SignatureVerificationResult)
            }
            HandshakeState::AwaitClientKey => Some(MessageKind::IdentityPublicKey),
            HandshakeState::Start | HandshakeState::Authenticated => None,
        }
    }
}

/// Internal events that drive transitions inside `HandshakeFsm`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeEvent {
    /// Client sent its challenge.
    ClientSendChallenge,
    /// Client verified the server's signature over Nc.
    ClientRecvServerProof,
    /// Client answered the server's counter-challenge.
    ClientRecvServerChallenge,
    /// Client received a positive verdict.
    ClientRecvVerdict,
    /// Server began listening.
    ServerListen,
    /// Server signed the client's challenge.
    ServerRecvClientChallenge,
    /// Server stored the client's key and issued Ns.
    ServerRecvClientKey,
    /// Server verified the client's signature over Ns.
    ServerRecvClientProof,
}

/// Result of the most recent attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Outcome {
    #[default]
    Pending,
    Authenticated,
    Failed(HandshakeFailure),
}

/// Why an inbound message did not move the machine.
#[derive(Debug)]
pub enum IgnoreReason {
    /// `start` has not been called (or the machine was reset).
    NotStarted,
    /// The handshake is over; traffic belongs to the transfer engine.
    AlreadyAuthenticated,
    /// Not the message this step accepts.
    Decode(DecodeError),
}

/// What a successfully handled inbound message did.
#[derive(Debug)]
#[must_use]
pub enum Progress {
    /// Nothing changed.
    Ignored(IgnoreReason),
    /// Moved one step; `reply` must be sent to the peer.
    Advanced { reply: Message },
    /// Handshake complete; send `reply` if present.
    Authenticated { reply: Option<Message> },
}
