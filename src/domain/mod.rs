//! Pure protocol vocabulary: message types, discovery records and transfer
//! constants. No I/O and no cryptography live here.

pub mod discovery;
pub mod handshake;
pub mod transfer;

pub use discovery::{DiscoveryError, PeerDescriptor, ServerInfo};
pub use transfer::{END_OF_FILE_MARKER, EndOfTransfer};
