//! Protocol rules on top of the domain vocabulary: how nonces are signed,
//! how messages are framed, and how a byte payload maps onto chunks.

pub mod handshake;
pub mod transfer;
