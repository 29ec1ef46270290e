pub mod handshake;
pub mod session;
pub mod transfer;
