pub mod canonical;
pub mod proof;
pub mod wire;

pub use canonical::canonical_encoding;
pub use proof::{sign_nonce, verify_nonce};
