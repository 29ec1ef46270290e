//! Async host for one [`Session`].
//!
//! A dedicated `tokio` task owns the session and consumes a single queue of
//! [`SessionInput`]s (transport events and caller commands), so every step is
//! processed to completion before the next one starts. State changes and
//! received files come back on an event channel.
//!
//! The task also enforces the per-step handshake deadline: whenever the
//! handshake advances, the timer restarts; if it fires while the session is
//! still waiting on the peer, the attempt fails with `Timeout`.

use std::time::Duration;

use rand::{CryptoRng, RngCore};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, warn};

use crate::application::handshake::Role;
use crate::application::session::{
    Session, SessionError, SessionObserver, SessionState, SessionUpdate,
};
use crate::application::transfer::TransferReport;
use crate::config::SessionConfig;
use crate::domain::PeerDescriptor;
use crate::ports::{IdentityStore, SignatureVerifier, Transport};

const INPUT_QUEUE: usize = 64;

/// Everything a session task reacts to.
#[derive(Debug)]
pub enum SessionInput {
    /// Caller wants a session in `role`. Takes effect on connect, or at once
    /// if the link is already up.
    Start {
        role: Role,
        peer: Option<PeerDescriptor>,
    },
    /// Link established.
    Connected,
    /// One message from the peer.
    Message(Vec<u8>),
    /// Link lost. The session stops; a later `Connected` restarts it.
    Disconnected,
    /// Client: stream a payload once authenticated.
    SendFile {
        payload: Vec<u8>,
        reply: oneshot::Sender<Result<TransferReport, SessionError>>,
    },
    /// Stop and forget the start request.
    Stop,
}

/// What the task reports back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Update(SessionUpdate),
    FileReceived(Vec<u8>),
}

#[derive(Debug, Error)]
pub enum HandleError {
    #[error("session task has exited")]
    Closed,
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Forwards session updates onto the event channel.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl SessionObserver for ChannelObserver {
    fn on_update(&mut self, update: SessionUpdate) {
        // Nobody listening is not an error for the session.
        let _ = self.events.send(SessionEvent::Update(update));
    }
}

/// Cloneable sender side of a session task.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionInput>,
}

impl SessionHandle {
    async fn submit(&self, input: SessionInput) -> Result<(), HandleError> {
        self.tx.send(input).await.map_err(|_| HandleError::Closed)
    }

    /// # Errors
    /// `HandleError::Closed` if the task has exited.
    pub async fn start(&self, role: Role, peer: Option<PeerDescriptor>) -> Result<(), HandleError> {
        self.submit(SessionInput::Start { role, peer }).await
    }

    /// # Errors
    /// `HandleError::Closed` if the task has exited.
    pub async fn connected(&self) -> Result<(), HandleError> {
        self.submit(SessionInput::Connected).await
    }

    /// # Errors
    /// `HandleError::Closed` if the task has exited.
    pub async fn message(&self, bytes: Vec<u8>) -> Result<(), HandleError> {
        self.submit(SessionInput::Message(bytes)).await
    }

    /// # Errors
    /// `HandleError::Closed` if the task has exited.
    pub async fn disconnected(&self) -> Result<(), HandleError> {
        self.submit(SessionInput::Disconnected).await
    }

    /// # Errors
    /// `HandleError::Closed` if the task has exited.
    pub async fn stop(&self) -> Result<(), HandleError> {
        self.submit(SessionInput::Stop).await
    }

    /// Send a payload and wait until every chunk was accepted by the link.
    ///
    /// # Errors
    /// * `HandleError::Closed` if the task has exited.
    /// * `HandleError::Session` if the session refused or the link failed.
    pub async fn send_file(&self, payload: Vec<u8>) -> Result<TransferReport, HandleError> {
        let (reply, rx) = oneshot::channel();
        self.submit(SessionInput::SendFile { payload, reply }).await?;
        Ok(rx.await.map_err(|_| HandleError::Closed)??)
    }
}

/// Spawn a task owning a new session over `transport`.
///
/// Returns the input handle, the event stream and the task's join handle.
/// The task ends when every `SessionHandle` has been dropped.
pub fn spawn_session<I, V, R, T>(
    identity: I,
    verifier: V,
    rng: R,
    transport: T,
    config: SessionConfig,
) -> (
    SessionHandle,
    mpsc::UnboundedReceiver<SessionEvent>,
    JoinHandle<()>,
)
where
    I: IdentityStore + Send + 'static,
    V: SignatureVerifier + Send + 'static,
    R: RngCore + CryptoRng + Send + 'static,
    T: Transport + Send + 'static,
{
    let (tx, rx) = mpsc::channel(INPUT_QUEUE);
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let observer = ChannelObserver {
        events: events_tx.clone(),
    };
    let session = Session::new(identity, verifier, rng, transport, observer, config);
    let task = SessionTask {
        session,
        events: events_tx,
        intent: None,
        connected: false,
        deadline: None,
        step_timeout: config.step_timeout,
    };
    let join = tokio::spawn(task.run(rx));
    (SessionHandle { tx }, events_rx, join)
}

/// Feed everything `inbound` yields into the session as `Message`s, then
/// report `Disconnected` when the link closes.
pub fn spawn_link_reader(
    mut inbound: mpsc::UnboundedReceiver<Vec<u8>>,
    handle: SessionHandle,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(bytes) = inbound.recv().await {
            if handle.message(bytes).await.is_err() {
                return;
            }
        }
        let _ = handle.disconnected().await;
    })
}

struct SessionTask<I, V, R, T>
where
    I: IdentityStore,
    V: SignatureVerifier,
    R: RngCore + CryptoRng,
    T: Transport,
{
    session: Session<I, V, R, T, ChannelObserver>,
    events: mpsc::UnboundedSender<SessionEvent>,
    intent: Option<(Role, Option<PeerDescriptor>)>,
    connected: bool,
    deadline: Option<Instant>,
    step_timeout: Option<Duration>,
}

impl<I, V, R, T> SessionTask<I, V, R, T>
where
    I: IdentityStore,
    V: SignatureVerifier,
    R: RngCore + CryptoRng,
    T: Transport,
{
    async fn run(mut self, mut rx: mpsc::Receiver<SessionInput>) {
        loop {
            let input = match self.deadline {
                Some(at) => tokio::select! {
                    input = rx.recv() => input,
                    () = sleep_until(at) => {
                        self.deadline = None;
                        if let Some(failure) = self.session.on_step_timeout() {
                            warn!(%failure, "handshake step deadline elapsed");
                        }
                        continue;
                    }
                },
                None => rx.recv().await,
            };
            let Some(input) = input else {
                debug!("all handles dropped; session task exiting");
                self.session.stop();
                return;
            };
            let before = (self.session.state(), self.session.step());
            self.handle(input);
            self.rearm(before);
        }
    }

    fn handle(&mut self, input: SessionInput) {
        match input {
            SessionInput::Start { role, peer } => {
                self.session.stop();
                self.intent = Some((role, peer));
                if self.connected {
                    self.begin();
                }
            }
            SessionInput::Connected => {
                self.connected = true;
                self.begin();
            }
            SessionInput::Message(bytes) => match self.session.on_transport_message(&bytes) {
                Ok(Some(file)) => {
                    let _ = self.events.send(SessionEvent::FileReceived(file));
                }
                Ok(None) | Err(SessionError::Handshake(_)) => {}
                Err(e) => warn!(error = %e, "failed to handle inbound message"),
            },
            SessionInput::Disconnected => {
                info!("link lost");
                self.connected = false;
                self.session.stop();
            }
            SessionInput::SendFile { payload, reply } => {
                let _ = reply.send(self.session.send_file(&payload));
            }
            SessionInput::Stop => {
                self.intent = None;
                self.session.stop();
            }
        }
    }

    fn begin(&mut self) {
        let Some((role, peer)) = self.intent.clone() else {
            return;
        };
        if self.session.state() != SessionState::Idle {
            return;
        }
        if let Err(e) = self.session.start(role, peer) {
            warn!(error = %e, "session start failed");
        }
    }

    /// Restart the deadline when the handshake moved, clear it when it ended.
    fn rearm(&mut self, before: (SessionState, u8)) {
        if !self.session.is_handshaking() {
            self.deadline = None;
            return;
        }
        let moved = before != (self.session.state(), self.session.step());
        if (moved || self.deadline.is_none())
            && let Some(t) = self.step_timeout
        {
            self.deadline = Some(Instant::now() + t);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use rand::rngs::OsRng;

    use super::*;
    use crate::adapters::crypto::P256Verifier;
    use crate::adapters::transport::link;
    use crate::application::handshake::HandshakeFailure;
    use crate::application::session::SessionState;
    use crate::test_support::{descriptor_for, identity};

    async fn next_update(events: &mut mpsc::UnboundedReceiver<SessionEvent>) -> SessionUpdate {
        loop {
            match events.recv().await.unwrap() {
                SessionEvent::Update(u) => return u,
                SessionEvent::FileReceived(_) => {}
            }
        }
    }

    async fn wait_for(events: &mut mpsc::UnboundedReceiver<SessionEvent>, state: SessionState) {
        while next_update(events).await.state != state {}
    }

    #[tokio::test]
    async fn authenticates_and_delivers_file_over_memory_link() {
        let server_id = identity();
        let peer = descriptor_for(&server_id);
        let (central, peripheral) = link(NonZeroUsize::new(8).unwrap());
        let config = SessionConfig::default();
        let (server, mut server_events, _) =
            spawn_session(server_id, P256Verifier, OsRng, peripheral.transport, config);
        let (client, mut client_events, _) =
            spawn_session(identity(), P256Verifier, OsRng, central.transport, config);
        spawn_link_reader(peripheral.inbound, server.clone());
        spawn_link_reader(central.inbound, client.clone());

        server.start(Role::Server, None).await.unwrap();
        server.connected().await.unwrap();
        client.start(Role::Client, Some(peer)).await.unwrap();
        client.connected().await.unwrap();
        wait_for(&mut client_events, SessionState::Authenticated).await;

        let payload: Vec<u8> = (0..40).collect();
        let report = client.send_file(payload.clone()).await.unwrap();
        assert_eq!(report.data_chunks, 5);
        assert!(report.sentinel_sent);

        let file = loop {
            if let SessionEvent::FileReceived(f) = server_events.recv().await.unwrap() {
                break f;
            }
        };
        assert_eq!(file, payload);
        wait_for(&mut client_events, SessionState::Sent).await;
    }

    #[tokio::test(start_paused = true)]
    async fn silent_peer_times_out_the_handshake() {
        let (_central, peripheral) = link(NonZeroUsize::new(20).unwrap());
        let config = SessionConfig {
            step_timeout: Some(Duration::from_secs(5)),
            ..SessionConfig::default()
        };
        let (server, mut events, _) =
            spawn_session(identity(), P256Verifier, OsRng, peripheral.transport, config);
        server.start(Role::Server, None).await.unwrap();
        server.connected().await.unwrap();
        let started = Instant::now();
        assert_eq!(next_update(&mut events).await.state, SessionState::Authenticating);
        let update = next_update(&mut events).await;
        assert_eq!(
            update,
            SessionUpdate {
                state: SessionState::Idle,
                error: Some(HandshakeFailure::Timeout),
            }
        );
        assert!(started.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test]
    async fn start_waits_for_connection_and_reconnect_restarts() {
        let (_central, peripheral) = link(NonZeroUsize::new(20).unwrap());
        let (server, mut events, _) = spawn_session(
            identity(),
            P256Verifier,
            OsRng,
            peripheral.transport,
            SessionConfig::default(),
        );
        server.start(Role::Server, None).await.unwrap();
        server.connected().await.unwrap();
        assert_eq!(next_update(&mut events).await.state, SessionState::Authenticating);
        server.disconnected().await.unwrap();
        assert_eq!(next_update(&mut events).await.state, SessionState::Idle);
        server.connected().await.unwrap();
        assert_eq!(next_update(&mut events).await.state, SessionState::Authenticating);
        server.stop().await.unwrap();
        assert_eq!(next_update(&mut events).await.state, SessionState::Idle);
        // Start request was dropped by stop.
        server.connected().await.unwrap();
        server.disconnected().await.unwrap();
        server.start(Role::Server, None).await.unwrap();
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn send_file_before_authentication_is_refused() {
        let (central, _peripheral) = link(NonZeroUsize::new(20).unwrap());
        let (client, _events, _) = spawn_session(
            identity(),
            P256Verifier,
            OsRng,
            central.transport,
            SessionConfig::default(),
        );
        let err = client.send_file(b"early".to_vec()).await.unwrap_err();
        assert!(matches!(
            err,
            HandleError::Session(SessionError::NotAuthenticated)
        ));
    }

    #[tokio::test]
    async fn link_reader_reports_disconnect() {
        let (central, peripheral) = link(NonZeroUsize::new(20).unwrap());
        let (server, mut events, _) = spawn_session(
            identity(),
            P256Verifier,
            OsRng,
            peripheral.transport,
            SessionConfig::default(),
        );
        let reader = spawn_link_reader(peripheral.inbound, server.clone());
        server.start(Role::Server, None).await.unwrap();
        server.connected().await.unwrap();
        assert_eq!(next_update(&mut events).await.state, SessionState::Authenticating);
        drop(central);
        reader.await.unwrap();
        assert_eq!(next_update(&mut events).await.state, SessionState::Idle);
    }
}
