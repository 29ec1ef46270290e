use thiserror::Error;

/// Semantic validation failures for handshake messages, discovered either at
/// construction or right after deserialization.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MessageError {
    /// A byte field exceeded the defensive size bound.
    #[error("{field} too large: {actual} bytes exceeds {max}")]
    TooLarge {
        field: &'static str,
        max: usize,
        actual: usize,
    },
    /// Generic field length mismatch for fixed-size values.
    #[error("{field} length mismatch: expected {expected}, got {actual}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
}
