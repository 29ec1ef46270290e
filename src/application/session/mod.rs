//! Per-connection orchestration.
//!
//! A [`Session`] owns one handshake machine and one transfer engine and is
//! driven by a single caller: every transport event and API call goes through
//! `&mut self`, so no two steps of the same session ever run concurrently.
//! Inbound messages go to the handshake while it is pending and to the
//! transfer engine once it has authenticated.

pub mod errors;
pub mod observer;

pub use errors::SessionError;
pub use observer::{SessionObserver, SessionState, SessionUpdate};

use rand::{CryptoRng, RngCore};
use tracing::{debug, info, warn};

use crate::application::handshake::{
    HandshakeFailure, HandshakeFsm, IgnoreReason, Outcome, Progress, Role,
};
use crate::application::transfer::{ChunkSender, TransferBuffer, TransferReport};
use crate::config::SessionConfig;
use crate::domain::PeerDescriptor;
use crate::domain::handshake::Message;
use crate::ports::{IdentityStore, SignatureVerifier, Transport};
use crate::protocol::handshake::wire::encode_message;

pub struct Session<I, V, R, T, O>
where
    I: IdentityStore,
    V: SignatureVerifier,
    R: RngCore + CryptoRng,
    T: Transport,
    O: SessionObserver,
{
    fsm: HandshakeFsm<I, V, R>,
    transport: T,
    observer: O,
    config: SessionConfig,
    state: SessionState,
    inbound: TransferBuffer,
    peer: Option<PeerDescriptor>,
}

impl<I, V, R, T, O> Session<I, V, R, T, O>
where
    I: IdentityStore,
    V: SignatureVerifier,
    R: RngCore + CryptoRng,
    T: Transport,
    O: SessionObserver,
{
    pub fn new(
        identity: I,
        verifier: V,
        rng: R,
        transport: T,
        observer: O,
        config: SessionConfig,
    ) -> Self {
        Self {
            fsm: HandshakeFsm::new(Role::Client, identity, verifier, rng),
            transport,
            observer,
            config,
            state: SessionState::Idle,
            inbound: TransferBuffer::new(),
            peer: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.fsm.role()
    }

    /// Handshake step counter (1 while idle).
    #[must_use]
    pub fn step(&self) -> u8 {
        self.fsm.step()
    }

    #[must_use]
    pub fn outcome(&self) -> Outcome {
        self.fsm.outcome()
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Server metadata the client started with.
    #[must_use]
    pub fn peer(&self) -> Option<&PeerDescriptor> {
        self.peer.as_ref()
    }

    /// Waiting on the peer for the next handshake message.
    #[must_use]
    pub fn is_handshaking(&self) -> bool {
        self.state == SessionState::Authenticating
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// Begin a handshake. A client must pass the server's descriptor and
    /// sends its opening challenge immediately; a server starts listening.
    ///
    /// # Errors
    /// * `SessionError::AlreadyStarted` unless the session is idle.
    /// * `SessionError::MissingPeer` for a client without a descriptor.
    /// * Transport or codec errors from the opening message; the session is
    ///   left idle.
    pub fn start(&mut self, role: Role, peer: Option<PeerDescriptor>) -> Result<(), SessionError> {
        if self.state != SessionState::Idle {
            return Err(SessionError::AlreadyStarted);
        }
        let peer_key = match role {
            Role::Client => Some(
                peer.as_ref()
                    .ok_or(SessionError::MissingPeer)?
                    .public_key
                    .clone(),
            ),
            Role::Server => None,
        };
        self.fsm.set_role(role);
        self.inbound.reset();
        self.peer = peer;
        info!(?role, peer = self.peer.as_ref().map(|p| p.name.as_str()), "session start");
        if let Some(opening) = self.fsm.start(peer_key)
            && let Err(e) = self.send_message(&opening)
        {
            self.fsm.reset();
            self.peer = None;
            return Err(e);
        }
        self.set_state(SessionState::Authenticating, None);
        Ok(())
    }

    /// Process one inbound transport message. Returns a completed file when
    /// this message finished an inbound transfer.
    ///
    /// # Errors
    /// * `SessionError::Handshake` when the message ended the handshake with a
    ///   failure; the session is already idle and the observer was notified.
    /// * Transport or codec errors while replying to a handshake message;
    ///   the attempt is abandoned and the session is idle. A failed transfer
    ///   acknowledgment is only logged and the file is still returned.
    pub fn on_transport_message(&mut self, bytes: &[u8]) -> Result<Option<Vec<u8>>, SessionError> {
        match self.state {
            SessionState::Idle => {
                debug!(len = bytes.len(), "message while idle ignored");
                Ok(None)
            }
            SessionState::Authenticating => self.on_handshake_message(bytes).map(|()| None),
            SessionState::Authenticated
            | SessionState::Sending
            | SessionState::Receiving
            | SessionState::Sent => match self.fsm.role() {
                Role::Server => self.on_chunk(bytes),
                Role::Client => {
                    self.on_acknowledgment();
                    Ok(None)
                }
            },
        }
    }

    fn on_handshake_message(&mut self, bytes: &[u8]) -> Result<(), SessionError> {
        let progress = match self.fsm.on_message(bytes) {
            Ok(p) => p,
            Err(failure) => {
                self.inbound.reset();
                self.peer = None;
                self.set_state(SessionState::Idle, Some(failure));
                return Err(failure.into());
            }
        };
        match progress {
            Progress::Ignored(IgnoreReason::Decode(_)) => {}
            Progress::Ignored(reason) => debug!(?reason, "handshake message ignored"),
            Progress::Advanced { reply } => self.send_reply(&reply)?,
            Progress::Authenticated { reply } => {
                if let Some(reply) = reply {
                    self.send_reply(&reply)?;
                }
                self.set_state(SessionState::Authenticated, None);
            }
        }
        Ok(())
    }

    /// The machine has already moved past the step this reply answers, so a
    /// reply that never left abandons the attempt.
    fn send_reply(&mut self, reply: &Message) -> Result<(), SessionError> {
        self.send_message(reply).inspect_err(|e| {
            warn!(error = %e, "handshake reply not sent, session reset");
            self.fsm.reset();
            self.inbound.reset();
            self.peer = None;
            self.set_state(SessionState::Idle, None);
        })
    }

    fn on_chunk(&mut self, bytes: &[u8]) -> Result<Option<Vec<u8>>, SessionError> {
        let Some(file) = self.inbound.push(bytes) else {
            if self.state != SessionState::Receiving {
                self.set_state(SessionState::Receiving, None);
            }
            return Ok(None);
        };
        if self.config.acknowledge_transfers
            && let Err(e) = self.transport.send(&[])
        {
            // The file is complete either way; the client just never sees `Sent`.
            warn!(error = %e, len = file.len(), "transfer acknowledgment not sent");
        }
        self.set_state(SessionState::Authenticated, None);
        Ok(Some(file))
    }

    fn on_acknowledgment(&mut self) {
        if self.state == SessionState::Sending {
            info!("transfer acknowledged");
            self.set_state(SessionState::Sent, None);
        } else {
            debug!(state = ?self.state, "unexpected post-handshake message ignored");
        }
    }

    /// Stream `payload` to the server. Client only, after authentication.
    ///
    /// The session stays in `Sending` until the server acknowledges.
    ///
    /// # Errors
    /// * `SessionError::WrongRole` on a server.
    /// * `SessionError::NotAuthenticated` before the handshake completed.
    /// * `SessionError::TransferInProgress` while awaiting an acknowledgment.
    /// * `SessionError::Transfer` if the link refused a chunk; the session
    ///   returns to `Authenticated`.
    pub fn send_file(&mut self, payload: &[u8]) -> Result<TransferReport, SessionError> {
        if self.fsm.role() != Role::Client {
            return Err(SessionError::WrongRole {
                expected: Role::Client,
            });
        }
        match self.state {
            SessionState::Authenticated | SessionState::Sent => {}
            SessionState::Sending => return Err(SessionError::TransferInProgress),
            _ => return Err(SessionError::NotAuthenticated),
        }
        self.set_state(SessionState::Sending, None);
        let sender = ChunkSender::new(self.config.end_of_transfer);
        match sender.send(&mut self.transport, payload) {
            Ok(report) => Ok(report),
            Err(e) => {
                self.set_state(SessionState::Authenticated, None);
                Err(e.into())
            }
        }
    }

    /// Return to idle from any state, discarding nonce, peer key, peer
    /// descriptor and any partial inbound file. Safe to call repeatedly.
    pub fn stop(&mut self) {
        self.fsm.reset();
        self.inbound.reset();
        self.peer = None;
        if self.state != SessionState::Idle {
            info!("session stopped");
            self.set_state(SessionState::Idle, None);
        }
    }

    /// The per-step deadline elapsed. Fails the handshake if one is pending.
    pub fn on_step_timeout(&mut self) -> Option<HandshakeFailure> {
        if !self.is_handshaking() {
            return None;
        }
        let failure = self.fsm.fail(HandshakeFailure::Timeout);
        self.peer = None;
        self.set_state(SessionState::Idle, Some(failure));
        Some(failure)
    }

    fn send_message(&mut self, msg: &Message) -> Result<(), SessionError> {
        let bytes = encode_message(msg)?;
        debug!(kind = %msg.kind(), len = bytes.len(), "sending handshake message");
        self.transport.send(&bytes)?;
        Ok(())
    }

    fn set_state(&mut self, state: SessionState, error: Option<HandshakeFailure>) {
        debug!(from = ?self.state, to = ?state, ?error, "session state");
        self.state = state;
        self.observer.on_update(SessionUpdate { state, error });
    }
}
