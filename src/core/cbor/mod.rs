//! Strict CBOR payload codec for handshake messages.
//!
//! Encoding goes through `ciborium`, which always emits the shortest form.
//! Decoding accepts exactly one item and only in that form: a payload that
//! decodes but re-encodes to different bytes is refused, so every message
//! has a single valid byte representation on the wire.
//!
//! Framing (the one-byte kind tag) is not handled here.

use serde::{Serialize, de::DeserializeOwned};
use std::io::Cursor;

#[derive(thiserror::Error, Debug)]
pub enum CodecError {
    #[error("CBOR serialize error: {0}")]
    Ser(#[from] ciborium::ser::Error<std::io::Error>),

    #[error("CBOR deserialize error: {0}")]
    De(#[from] ciborium::de::Error<std::io::Error>),

    /// Bytes left over after a complete CBOR item.
    #[error("trailing bytes after CBOR value ({extra} extra)")]
    Trailing { extra: usize },

    /// Well-formed, but not the shortest encoding of the decoded value.
    #[error("CBOR input is not in canonical form")]
    NonCanonical,
}

/// # Errors
/// [`CodecError::Ser`] if serialization fails.
pub fn to_cbor<T: Serialize>(v: &T) -> Result<Vec<u8>, CodecError> {
    let mut buf = Vec::with_capacity(96);
    ciborium::ser::into_writer(v, &mut buf)?;
    Ok(buf)
}

/// Decode exactly one canonical item from `b`.
///
/// # Errors
/// * [`CodecError::De`] if the bytes are not a `T`.
/// * [`CodecError::Trailing`] if bytes remain after the item.
/// * [`CodecError::NonCanonical`] if re-encoding does not reproduce `b`.
pub fn from_cbor<T: DeserializeOwned + Serialize>(b: &[u8]) -> Result<T, CodecError> {
    let mut cur = Cursor::new(b);
    let value: T = ciborium::de::from_reader(&mut cur)?;
    let consumed = usize::try_from(cur.position()).unwrap_or(usize::MAX);
    if let Some(extra) = b.len().checked_sub(consumed).filter(|n| *n > 0) {
        return Err(CodecError::Trailing { extra });
    }
    if to_cbor(&value)? != b {
        return Err(CodecError::NonCanonical);
    }
    Ok(value)
}
