use rand::{CryptoRng, RngCore};
use tracing::{debug, info, warn};

use crate::domain::handshake::{
    HandshakeNonce, IdentityPublicKey, Message, NonceRequest, SignatureVerificationResult,
    SignedNonce,
};
use crate::ports::{IdentityStore, SignatureVerifier};
use crate::protocol::handshake::wire::{DecodeError, decode_expected};
use crate::protocol::handshake::{sign_nonce, verify_nonce};

use super::errors::{HandshakeFailure, VerifyFailure};
use super::fsm_types::{HandshakeEvent, HandshakeState, IgnoreReason, Outcome, Progress, Role};

/// Drives one side of the mutual challenge/response exchange.
///
/// Methods never send anything themselves: each inbound message yields a
/// [`Progress`] carrying the reply (if any) for the caller to put on the
/// link. The machine owns the outstanding nonce and the peer's public key and
/// nothing else; one instance serves one connection.
///
/// Error strategy: messages that are not the one the current step accepts are
/// ignored and reported as `Progress::Ignored`. Only terminal failures return
/// `Err`, and by the time they do the machine has already reset itself.
pub struct HandshakeFsm<I: IdentityStore, V: SignatureVerifier, R: RngCore + CryptoRng> {
    pub(crate) role: Role,
    pub(crate) state: HandshakeState,
    pub(crate) identity: I,
    pub(crate) verifier: V,
    pub(crate) rng: R,
    /// Client: the out-of-band server key. Server: the key learned at step 2.
    pub(crate) peer_key: Option<Vec<u8>>,
    /// Nonce we issued and still expect a signature over.
    pub(crate) nonce: Option<HandshakeNonce>,
    pub(crate) outcome: Outcome,
}

impl<I: IdentityStore, V: SignatureVerifier, R: RngCore + CryptoRng> HandshakeFsm<I, V, R> {
    /// Construct an idle machine for `role`.
    pub fn new(role: Role, identity: I, verifier: V, rng: R) -> Self {
        Self {
            role,
            state: HandshakeState::Start,
            identity,
            verifier,
            rng,
            peer_key: None,
            nonce: None,
            outcome: Outcome::Pending,
        }
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub fn state(&self) -> HandshakeState {
        self.state
    }

    #[must_use]
    pub fn step(&self) -> u8 {
        self.state.step()
    }

    #[must_use]
    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state == HandshakeState::Authenticated
    }

    /// Peer key currently held (trusted server key or learned client key).
    #[must_use]
    pub fn peer_key(&self) -> Option<&[u8]> {
        self.peer_key.as_deref()
    }

    /// Begin a fresh attempt, discarding any previous one.
    ///
    /// The client passes the server key it learned out-of-band and gets back
    /// its opening `NonceRequest`. The server passes `None`, sends nothing and
    /// starts listening.
    pub fn start(&mut self, peer_key: Option<Vec<u8>>) -> Option<Message> {
        self.reset();
        match self.role {
            Role::Client => {
                self.peer_key = peer_key;
                let nc = HandshakeNonce::random(&mut self.rng);
                debug!(nonce = %nc, "client challenge issued");
                let msg = NonceRequest::new(&nc).into();
                self.nonce = Some(nc);
                self.apply(HandshakeEvent::ClientSendChallenge);
                Some(msg)
            }
            Role::Server => {
                self.apply(HandshakeEvent::ServerListen);
                None
            }
        }
    }

    /// Switch roles. Implies a reset.
    pub fn set_role(&mut self, role: Role) {
        self.reset();
        self.role = role;
    }

    /// Return to `Start`: step 1, no nonce, no peer key, outcome pending.
    pub fn reset(&mut self) {
        self.state = HandshakeState::Start;
        self.peer_key = None;
        self.nonce = None;
        self.outcome = Outcome::Pending;
    }

    /// Abort the current attempt with `failure` (used for timeouts).
    pub fn fail(&mut self, failure: HandshakeFailure) -> HandshakeFailure {
        warn!(role = ?self.role, step = self.step(), %failure, "handshake failed");
        self.reset();
        self.outcome = Outcome::Failed(failure);
        failure
    }

    /// Feed one inbound message.
    ///
    /// # Errors
    /// Returns the terminal [`HandshakeFailure`] after resetting the machine.
    pub fn on_message(&mut self, bytes: &[u8]) -> Result<Progress, HandshakeFailure> {
        let Some(expected) = self.state.expected() else {
            let reason = if self.is_authenticated() {
                IgnoreReason::AlreadyAuthenticated
            } else {
                IgnoreReason::NotStarted
            };
            return Ok(Progress::Ignored(reason));
        };
        let msg = match decode_expected(bytes, expected) {
            Ok(m) => m,
            Err(e) => {
                self.log_ignored(&e);
                return Ok(Progress::Ignored(IgnoreReason::Decode(e)));
            }
        };
        let result = match (self.state, msg) {
            (HandshakeState::AwaitServerProof, Message::SignedNonce(m)) => {
                self.client_on_server_proof(&m)
            }
            (HandshakeState::AwaitServerChallenge, Message::NonceRequest(m)) => {
                Ok(self.client_on_server_challenge(&m))
            }
            (HandshakeState::AwaitVerificationResult, Message::SignatureVerificationResult(m)) => {
                self.client_on_verdict(m)
            }
            (HandshakeState::AwaitClientChallenge, Message::NonceRequest(m)) => {
                Ok(self.server_on_client_challenge(&m))
            }
            (HandshakeState::AwaitClientKey, Message::IdentityPublicKey(m)) => {
                Ok(self.server_on_client_key(m))
            }
            (HandshakeState::AwaitClientProof, Message::SignedNonce(m)) => {
                self.server_on_client_proof(&m)
            }
            // decode_expected only yields the expected kind
            (_, other) => Ok(Progress::Ignored(IgnoreReason::Decode(
                DecodeError::UnexpectedKind {
                    expected,
                    found: other.kind(),
                },
            ))),
        };
        result.map_err(|f| self.fail(f))
    }

    fn log_ignored(&self, e: &DecodeError) {
        match e {
            DecodeError::Corrupt { .. } => {
                warn!(role = ?self.role, step = self.step(), error = %e, "ignoring corrupt frame");
            }
            _ => debug!(role = ?self.role, step = self.step(), error = %e, "ignoring frame"),
        }
    }

    /// Verify a signature over the nonce we issued, consuming the nonce.
    fn check_proof(&mut self, signature: &[u8]) -> Result<(), HandshakeFailure> {
        let nonce = self
            .nonce
            .take()
            .ok_or(HandshakeFailure::VerifyFailed(VerifyFailure::MissingNonce))?;
        let key = self
            .peer_key
            .as_deref()
            .ok_or(HandshakeFailure::VerifyFailed(VerifyFailure::MissingPublicKey))?;
        if signature.is_empty() {
            return Err(HandshakeFailure::VerifyFailed(
                VerifyFailure::MalformedSignature,
            ));
        }
        verify_nonce(&self.verifier, nonce.as_bytes(), signature, key)?;
        Ok(())
    }

    // Client side

    fn client_on_server_proof(&mut self, m: &SignedNonce) -> Result<Progress, HandshakeFailure> {
        self.check_proof(&m.signature)?;
        debug!("server proof verified");
        let reply = IdentityPublicKey {
            pubkey: self.identity.public_key(),
        }
        .into();
        self.apply(HandshakeEvent::ClientRecvServerProof);
        Ok(Progress::Advanced { reply })
    }

    fn client_on_server_challenge(&mut self, m: &NonceRequest) -> Progress {
        let signature = sign_nonce(&self.identity, &m.nonce);
        self.apply(HandshakeEvent::ClientRecvServerChallenge);
        Progress::Advanced {
            reply: SignedNonce { signature }.into(),
        }
    }

    fn client_on_verdict(
        &mut self,
        m: SignatureVerificationResult,
    ) -> Result<Progress, HandshakeFailure> {
        if !m.valid {
            return Err(HandshakeFailure::AuthenticationFailed);
        }
        self.apply(HandshakeEvent::ClientRecvVerdict);
        self.outcome = Outcome::Authenticated;
        info!(role = ?self.role, "handshake authenticated");
        Ok(Progress::Authenticated { reply: None })
    }

    // Server side

    fn server_on_client_challenge(&mut self, m: &NonceRequest) -> Progress {
        let signature = sign_nonce(&self.identity, &m.nonce);
        self.apply(HandshakeEvent::ServerRecvClientChallenge);
        Progress::Advanced {
            reply: SignedNonce { signature }.into(),
        }
    }

    fn server_on_client_key(&mut self, m: IdentityPublicKey) -> Progress {
        debug_assert!(self.peer_key.is_none(), "peer key stored twice");
        self.peer_key = Some(m.pubkey);
        let ns = HandshakeNonce::random(&mut self.rng);
        debug!(nonce = %ns, "server counter-challenge issued");
        let reply = NonceRequest::new(&ns).into();
        self.nonce = Some(ns);
        self.apply(HandshakeEvent::ServerRecvClientKey);
        Progress::Advanced { reply }
    }

    fn server_on_client_proof(&mut self, m: &SignedNonce) -> Result<Progress, HandshakeFailure> {
        self.check_proof(&m.signature)?;
        self.apply(HandshakeEvent::ServerRecvClientProof);
        self.outcome = Outcome::Authenticated;
        info!(role = ?self.role, "handshake authenticated");
        Ok(Progress::Authenticated {
            reply: Some(SignatureVerificationResult { valid: true }.into()),
        })
    }

    fn apply(&mut self, ev: HandshakeEvent) {
        let old = self.state;
        let new = match (self.role, old, ev) {
            (Role::Client, HandshakeState::Start, HandshakeEvent::ClientSendChallenge) => {
                HandshakeState::AwaitServerProof
            }
            (
                Role::Client,
                HandshakeState::AwaitServerProof,
                HandshakeEvent::ClientRecvServerProof,
            ) => HandshakeState::AwaitServerChallenge,
            (
                Role::Client,
                HandshakeState::AwaitServerChallenge,
                HandshakeEvent::ClientRecvServerChallenge,
            ) => HandshakeState::AwaitVerificationResult,
            (
                Role::Client,
                HandshakeState::AwaitVerificationResult,
                HandshakeEvent::ClientRecvVerdict,
            )
            | (
                Role::Server,
                HandshakeState::AwaitClientProof,
                HandshakeEvent::ServerRecvClientProof,
            ) => HandshakeState::Authenticated,
            (Role::Server, HandshakeState::Start, HandshakeEvent::ServerListen) => {
                HandshakeState::AwaitClientChallenge
            }
            (
                Role::Server,
                HandshakeState::AwaitClientChallenge,
                HandshakeEvent::ServerRecvClientChallenge,
            ) => HandshakeState::AwaitClientKey,
            (Role::Server, HandshakeState::AwaitClientKey, HandshakeEvent::ServerRecvClientKey) => {
                HandshakeState::AwaitClientProof
            }
            _ => {
                debug_assert!(false, "invalid transition: {old:?} --{ev:?}-->");
                return;
            }
        };
        debug_assert!(
            new.step() >= old.step(),
            "state regression: {old:?} -> {new:?}"
        );
        debug!(role = ?self.role, from = ?old, to = ?new, step = new.step(), "handshake transition");
        self.state = new;
    }
}
