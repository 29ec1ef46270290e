/// ---- Handshake size constants ----
/// Fixed sizes are protocol commitments. Defensive maxima (`*_MAX`) are NOT
/// wire commitments; they bound resource usage when decoding untrusted frames.
pub(crate) const NONCE_LEN: usize = 32;
pub(crate) const FIELD_MAX: usize = 1024; // defensive bound for nonce/pubkey/signature bytes
