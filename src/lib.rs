//! Crate root for `bletransfer`.
//!
//! Mutual challenge/response authentication between a client and a server
//! over a message-oriented short-range link, followed by a chunked one-way
//! file transfer from client to server.
//!
//! High-level tree:
//! * `domain` – message types, discovery records and transfer constants.
//! * `protocol` – canonical nonce text, signing, wire frames and chunk
//!   planning.
//! * `application` – the handshake state machine, transfer engines and the
//!   per-connection [`Session`](application::session::Session).
//! * `ports` / `adapters` – seams for identity, verification and transport,
//!   with P-256 and in-memory implementations.
//! * `runtime` – a `tokio` task hosting one session with step deadlines.
pub mod adapters;
pub mod application;
pub mod config;
pub mod core;
pub mod domain;
pub mod ports;
pub mod protocol;
pub mod runtime;

#[doc(hidden)]
pub mod test_support;
