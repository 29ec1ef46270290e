//! Post-authentication file stream: the client pushes one payload as ordered
//! chunks, the server reassembles it and detects where it ends.

pub mod receiver;
pub mod sender;

pub use receiver::TransferBuffer;
pub use sender::{ChunkSender, TransferError, TransferReport};
