use crate::domain::handshake::errors::MessageError;
use crate::domain::handshake::params::NONCE_LEN;
use core::fmt;
use rand::{CryptoRng, RngCore};

/// Single-use 32-byte challenge issued in `NonceRequest`.
///
/// The client's challenge makes the server prove it holds the key from the
/// discovery record; the server's counter-challenge makes the client prove
/// it holds the key it announced. The issuer keeps the value until the
/// matching `SignedNonce` arrives and drops it after one verification.
///
/// `Debug` prints nothing of the value and `Display` only an 8-byte hex
/// prefix, so nonces can be correlated in logs but not reconstructed.
///
/// ```
/// use bletransfer::domain::handshake::HandshakeNonce;
/// let fixed = HandshakeNonce::from([1u8; 32]);
/// assert_eq!(fixed.to_string(), "0101010101010101…");
/// let fresh = HandshakeNonce::random(&mut rand::rngs::OsRng);
/// assert_ne!(fresh, fixed);
/// assert!(HandshakeNonce::try_from(&[0u8; 31][..]).is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct HandshakeNonce([u8; NONCE_LEN]);

impl HandshakeNonce {
    /// Fill a new nonce from `rng`. Tests inject a fixed generator.
    #[must_use]
    pub fn random<R: CryptoRng + RngCore>(rng: &mut R) -> Self {
        let mut bytes = [0u8; NONCE_LEN];
        rng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; NONCE_LEN] {
        &self.0
    }
}

impl fmt::Debug for HandshakeNonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HandshakeNonce(..)")
    }
}

impl fmt::Display for HandshakeNonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0[..8].iter().try_for_each(|b| write!(f, "{b:02x}"))?;
        f.write_str("…")
    }
}

impl From<[u8; NONCE_LEN]> for HandshakeNonce {
    fn from(bytes: [u8; NONCE_LEN]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for HandshakeNonce {
    type Error = MessageError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        <[u8; NONCE_LEN]>::try_from(bytes)
            .map(Self)
            .map_err(|_| MessageError::LengthMismatch {
                field: "HandshakeNonce",
                expected: NONCE_LEN,
                actual: bytes.len(),
            })
    }
}
