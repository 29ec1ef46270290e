use crate::application::handshake::HandshakeFailure;

/// Coarse session phase reported to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No handshake running.
    #[default]
    Idle,
    /// Handshake in progress.
    Authenticating,
    /// Mutual proof complete; ready to send or receive a file.
    Authenticated,
    /// Client is writing a payload or waiting for its acknowledgment.
    Sending,
    /// Server has buffered part of a payload.
    Receiving,
    /// Client's last payload was acknowledged.
    Sent,
}

/// One state change. `error` is set when the change was caused by a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionUpdate {
    pub state: SessionState,
    pub error: Option<HandshakeFailure>,
}

/// Narrow notification hook for UI or logging collaborators.
pub trait SessionObserver {
    fn on_update(&mut self, update: SessionUpdate);
}

impl<F: FnMut(SessionUpdate)> SessionObserver for F {
    fn on_update(&mut self, update: SessionUpdate) {
        self(update);
    }
}
