//! Binary encoding of handshake messages: `[kind tag:1][canonical CBOR payload]`.
//!
//! Decoding is strict (canonical CBOR, no unknown fields, no trailing bytes,
//! bounded field lengths) and distinguishes three failure shapes:
//! a well-formed frame of another kind, bytes that are not a handshake frame
//! at all, and a frame whose tag is right but whose body is damaged.

pub mod frame;

pub use frame::{FrameType, prepend_frame, split_frame};

use crate::core::cbor::{CodecError, from_cbor, to_cbor};
use crate::domain::handshake::{
    IdentityPublicKey, Message, MessageError, MessageKind, NonceRequest, SignatureVerificationResult,
    SignedNonce,
};
use thiserror::Error;

/// Why an inbound payload was not accepted as the expected message.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// A valid frame, but for a different message kind.
    #[error("expected {expected} frame, got {found}")]
    UnexpectedKind {
        expected: MessageKind,
        found: MessageKind,
    },
    /// Empty input or an unknown kind tag.
    #[error("not a handshake frame")]
    Unrecognized,
    /// Known tag, payload damaged.
    #[error("corrupt {kind} frame: {reason}")]
    Corrupt {
        kind: MessageKind,
        reason: CorruptReason,
    },
}

#[derive(Debug, Error)]
pub enum CorruptReason {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Message(#[from] MessageError),
}

/// Encode any handshake message for the wire.
///
/// # Errors
/// Returns CBOR serialization errors.
pub fn encode_message(msg: &Message) -> Result<Vec<u8>, CodecError> {
    let payload = match msg {
        Message::NonceRequest(m) => to_cbor(m)?,
        Message::IdentityPublicKey(m) => to_cbor(m)?,
        Message::SignedNonce(m) => to_cbor(m)?,
        Message::SignatureVerificationResult(m) => to_cbor(m)?,
    };
    Ok(prepend_frame(FrameType::from(msg.kind()), &payload))
}

/// Decode whichever message the frame carries.
///
/// # Errors
/// `Unrecognized` or `Corrupt`; never `UnexpectedKind`.
pub fn decode_message(bytes: &[u8]) -> Result<Message, DecodeError> {
    let (ft, payload) = split_frame(bytes).ok_or(DecodeError::Unrecognized)?;
    let kind = ft.kind();
    let corrupt = |reason: CorruptReason| DecodeError::Corrupt { kind, reason };
    let msg: Message = match ft {
        FrameType::NonceRequest => from_cbor::<NonceRequest>(payload)
            .map_err(|e| corrupt(e.into()))?
            .into(),
        FrameType::IdentityPublicKey => from_cbor::<IdentityPublicKey>(payload)
            .map_err(|e| corrupt(e.into()))?
            .into(),
        FrameType::SignedNonce => from_cbor::<SignedNonce>(payload)
            .map_err(|e| corrupt(e.into()))?
            .into(),
        FrameType::SignatureVerificationResult => from_cbor::<SignatureVerificationResult>(payload)
            .map_err(|e| corrupt(e.into()))?
            .into(),
    };
    msg.validate().map_err(|e| corrupt(e.into()))?;
    Ok(msg)
}

/// Decode a frame that must be of kind `expected`.
///
/// The tag is checked before the payload is touched, so a frame of another
/// kind reports `UnexpectedKind` even if its body is damaged.
///
/// # Errors
/// See [`DecodeError`].
pub fn decode_expected(bytes: &[u8], expected: MessageKind) -> Result<Message, DecodeError> {
    match split_frame(bytes) {
        None => Err(DecodeError::Unrecognized),
        Some((ft, _)) if ft.kind() != expected => Err(DecodeError::UnexpectedKind {
            expected,
            found: ft.kind(),
        }),
        Some(_) => decode_message(bytes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::handshake::HandshakeNonce;
    use proptest::prelude::*;

    fn samples() -> Vec<Message> {
        vec![
            NonceRequest::new(&HandshakeNonce::from([0u8; 32])).into(),
            IdentityPublicKey::new(vec![0x30; 91]).unwrap().into(),
            SignedNonce::new(vec![0x30, 0x44, 0x02]).unwrap().into(),
            SignatureVerificationResult { valid: true }.into(),
            SignatureVerificationResult { valid: false }.into(),
        ]
    }

    #[test]
    fn every_kind_round_trips() {
        for m in samples() {
            let bytes = encode_message(&m).unwrap();
            assert_eq!(bytes[0], FrameType::from(m.kind()) as u8);
            assert_eq!(decode_message(&bytes).unwrap(), m);
            assert_eq!(decode_expected(&bytes, m.kind()).unwrap(), m);
        }
    }

    #[test]
    fn other_kind_is_unexpected_not_corrupt() {
        let bytes = encode_message(&SignedNonce::new(vec![1]).unwrap().into()).unwrap();
        let err = decode_expected(&bytes, MessageKind::NonceRequest).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::UnexpectedKind {
                expected: MessageKind::NonceRequest,
                found: MessageKind::SignedNonce
            }
        ));
    }

    #[test]
    fn foreign_bytes_are_unrecognized() {
        assert!(matches!(decode_message(&[]), Err(DecodeError::Unrecognized)));
        assert!(matches!(
            decode_expected(b"EOF", MessageKind::SignedNonce),
            Err(DecodeError::Unrecognized)
        ));
    }

    #[test]
    fn damaged_payload_is_corrupt() {
        let mut bytes = encode_message(&SignatureVerificationResult { valid: true }.into()).unwrap();
        bytes.push(0x00);
        assert!(matches!(
            decode_message(&bytes),
            Err(DecodeError::Corrupt {
                kind: MessageKind::SignatureVerificationResult,
                reason: CorruptReason::Codec(CodecError::Trailing { .. })
            })
        ));
        assert!(matches!(
            decode_expected(&[FrameType::NonceRequest as u8, 0xff], MessageKind::NonceRequest),
            Err(DecodeError::Corrupt { .. })
        ));
    }

    #[test]
    fn oversized_field_is_corrupt() {
        let m = NonceRequest {
            nonce: vec![0u8; 2048],
        };
        let bytes = prepend_frame(FrameType::NonceRequest, &to_cbor(&m).unwrap());
        assert!(matches!(
            decode_message(&bytes),
            Err(DecodeError::Corrupt {
                reason: CorruptReason::Message(MessageError::TooLarge { .. }),
                ..
            })
        ));
    }

    #[test]
    fn huge_length_headers_are_corrupt_not_fatal() {
        // {"nonce": <header claiming 2^40 items/bytes>} with nothing after it.
        for major in [0x9b, 0x5b] {
            let mut bytes = vec![FrameType::NonceRequest as u8, 0xa1, 0x65];
            bytes.extend_from_slice(b"nonce");
            bytes.push(major);
            bytes.extend_from_slice(&(1u64 << 40).to_be_bytes());
            assert!(matches!(
                decode_expected(&bytes, MessageKind::NonceRequest),
                Err(DecodeError::Corrupt {
                    kind: MessageKind::NonceRequest,
                    reason: CorruptReason::Codec(CodecError::De(_)),
                })
            ));
        }
    }

    proptest! {
        #[test]
        fn prop_signed_nonce_round_trips(sig in prop::collection::vec(any::<u8>(), 0..200)) {
            let m: Message = SignedNonce::new(sig).unwrap().into();
            let bytes = encode_message(&m).unwrap();
            prop_assert_eq!(decode_message(&bytes).unwrap(), m);
        }

        #[test]
        fn prop_arbitrary_bytes_never_panic(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
            let _ = decode_message(&bytes);
        }
    }
}
