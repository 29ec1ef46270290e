//! Handshake frame preamble and helpers.

use crate::domain::handshake::MessageKind;

/// One-byte tag preceding every handshake payload.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameType {
    NonceRequest = 0x01,
    IdentityPublicKey = 0x02,
    SignedNonce = 0x03,
    SignatureVerificationResult = 0x04,
}

impl FrameType {
    #[must_use]
    pub fn kind(self) -> MessageKind {
        match self {
            FrameType::NonceRequest => MessageKind::NonceRequest,
            FrameType::IdentityPublicKey => MessageKind::IdentityPublicKey,
            FrameType::SignedNonce => MessageKind::SignedNonce,
            FrameType::SignatureVerificationResult => MessageKind::SignatureVerificationResult,
        }
    }
}

impl From<MessageKind> for FrameType {
    fn from(kind: MessageKind) -> Self {
        match kind {
            MessageKind::NonceRequest => FrameType::NonceRequest,
            MessageKind::IdentityPublicKey => FrameType::IdentityPublicKey,
            MessageKind::SignedNonce => FrameType::SignedNonce,
            MessageKind::SignatureVerificationResult => FrameType::SignatureVerificationResult,
        }
    }
}

impl TryFrom<u8> for FrameType {
    type Error = u8;
    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0x01 => Ok(Self::NonceRequest),
            0x02 => Ok(Self::IdentityPublicKey),
            0x03 => Ok(Self::SignedNonce),
            0x04 => Ok(Self::SignatureVerificationResult),
            other => Err(other),
        }
    }
}

#[inline]
#[must_use]
pub fn prepend_frame(ft: FrameType, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + payload.len());
    out.push(ft as u8);
    out.extend_from_slice(payload);
    out
}

/// Split the tag from the payload. `None` for empty input or an unknown tag.
#[inline]
#[must_use]
pub fn split_frame(input: &[u8]) -> Option<(FrameType, &[u8])> {
    let (&tag, payload) = input.split_first()?;
    let ft = FrameType::try_from(tag).ok()?;
    Some((ft, payload))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_stable() {
        assert_eq!(FrameType::NonceRequest as u8, 0x01);
        assert_eq!(FrameType::SignatureVerificationResult as u8, 0x04);
        for v in 1u8..=4 {
            let ft = FrameType::try_from(v).unwrap();
            assert_eq!(FrameType::from(ft.kind()), ft);
        }
        assert_eq!(FrameType::try_from(0x05), Err(0x05));
    }

    #[test]
    fn split_rejects_empty_and_unknown() {
        assert!(split_frame(&[]).is_none());
        assert!(split_frame(&[0x00, 0xa0]).is_none());
        assert!(split_frame(b"EOF").is_none());
        let framed = prepend_frame(FrameType::SignedNonce, &[9, 9]);
        assert_eq!(split_frame(&framed), Some((FrameType::SignedNonce, &[9u8, 9][..])));
    }
}
