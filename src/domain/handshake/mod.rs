/*
Handshake message type definitions.

This module is the single source of truth for the four messages exchanged
during mutual authentication:

`NonceRequest`, `IdentityPublicKey`, `SignedNonce`, `SignatureVerificationResult`.

The exchange (client initiates):

    C -> S  NonceRequest{Nc}
    S -> C  SignedNonce{sign_S(Nc)}
    C -> S  IdentityPublicKey{pk_C}
    S -> C  NonceRequest{Ns}
    C -> S  SignedNonce{sign_C(Ns)}
    S -> C  SignatureVerificationResult{valid}

Notes:
* Only public material lives here (nonces, public keys, signatures), so the
  types need no zeroization.
* Byte fields travel as CBOR byte strings and are bounded by a defensive
  maximum; emptiness is left to signature verification, which reports it.
* Binary framing (one-byte kind tag + CBOR) lives in `protocol::handshake::wire`.
*/

mod byte_string_serde;
pub mod errors;
pub mod messages;
pub mod nonce;
mod params;

pub use errors::MessageError;
pub use messages::*;
pub use nonce::*;
