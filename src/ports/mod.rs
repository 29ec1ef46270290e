pub mod crypto;
pub mod identity;
pub mod transport;

pub use crypto::*;
pub use identity::*;
pub use transport::*;
