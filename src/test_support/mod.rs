//! Shared fixtures for unit and integration tests.
#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};

use crate::adapters::crypto::{P256Identity, P256Verifier};
use crate::application::session::{Session, SessionObserver, SessionState, SessionUpdate};
use crate::config::SessionConfig;
use crate::domain::PeerDescriptor;
use crate::ports::{IdentityStore, Transport, TransportError};

/// Transport that records every write instead of sending it.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    pub sent: Vec<Vec<u8>>,
    pub chunk_size: usize,
    /// Refuse writes once this many have been accepted.
    pub refuse_after: Option<usize>,
    pub closed: bool,
}

impl RecordingTransport {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size,
            ..Self::default()
        }
    }

    /// Remove and return everything written so far.
    pub fn drain(&mut self) -> Vec<Vec<u8>> {
        std::mem::take(&mut self.sent)
    }
}

impl Transport for RecordingTransport {
    fn send(&mut self, message: &[u8]) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        if self.refuse_after.is_some_and(|n| self.sent.len() >= n) {
            return Err(TransportError::Backpressure);
        }
        self.sent.push(message.to_vec());
        Ok(())
    }

    fn negotiated_chunk_size(&self) -> usize {
        self.chunk_size
    }
}

/// Observer that keeps every update.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    pub updates: Vec<SessionUpdate>,
}

impl RecordingObserver {
    pub fn states(&self) -> Vec<SessionState> {
        self.updates.iter().map(|u| u.state).collect()
    }

    pub fn last(&self) -> Option<SessionUpdate> {
        self.updates.last().copied()
    }
}

impl SessionObserver for RecordingObserver {
    fn on_update(&mut self, update: SessionUpdate) {
        self.updates.push(update);
    }
}

/// RNG that yields a constant byte. Only for reproducible nonces in tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedRng(pub u8);

impl RngCore for FixedRng {
    fn next_u32(&mut self) -> u32 {
        u32::from_le_bytes([self.0; 4])
    }
    fn next_u64(&mut self) -> u64 {
        u64::from_le_bytes([self.0; 8])
    }
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        dest.fill(self.0);
    }
    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl CryptoRng for FixedRng {}

pub type TestSession<R = OsRng> =
    Session<P256Identity, P256Verifier, R, RecordingTransport, RecordingObserver>;

pub fn identity() -> P256Identity {
    P256Identity::generate(&mut OsRng).unwrap()
}

/// Descriptor a client would build from `server`'s discovery record.
pub fn descriptor_for(server: &P256Identity) -> PeerDescriptor {
    PeerDescriptor::new("test-server", server.public_key())
}

pub fn session_with<R: RngCore + CryptoRng>(
    identity: P256Identity,
    rng: R,
    chunk_size: usize,
    config: SessionConfig,
) -> TestSession<R> {
    Session::new(
        identity,
        P256Verifier,
        rng,
        RecordingTransport::new(chunk_size),
        RecordingObserver::default(),
        config,
    )
}

pub fn session(identity: P256Identity, chunk_size: usize) -> TestSession {
    session_with(identity, OsRng, chunk_size, SessionConfig::default())
}

/// Shuttle messages between two sessions until neither has anything left to
/// say. Returns the files completed on either side, in order.
pub fn exchange<A, B>(a: &mut TestSession<A>, b: &mut TestSession<B>) -> Vec<Vec<u8>>
where
    A: RngCore + CryptoRng,
    B: RngCore + CryptoRng,
{
    let mut files = Vec::new();
    loop {
        let to_b = a.transport_mut().drain();
        let to_a = b.transport_mut().drain();
        if to_a.is_empty() && to_b.is_empty() {
            return files;
        }
        for m in to_b {
            if let Ok(Some(f)) = b.on_transport_message(&m) {
                files.push(f);
            }
        }
        for m in to_a {
            if let Ok(Some(f)) = a.on_transport_message(&m) {
                files.push(f);
            }
        }
    }
}
