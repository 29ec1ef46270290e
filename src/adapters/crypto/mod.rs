pub mod keystore;
pub mod p256_ecdsa;

pub use keystore::{FileKeyStore, KeyError};
pub use p256_ecdsa::{P256Identity, P256Verifier};
