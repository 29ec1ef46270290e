//! Canonical text form of a nonce.
//!
//! Nonces are never signed raw. Both peers first render the bytes as
//! standard base64 with a `\r\n` line break after every 64 characters (no
//! trailing break), and sign or verify the UTF-8 bytes of that string. A peer
//! that signs raw bytes, or wraps at a different width, produces signatures
//! that fail verification exactly like a forgery.

use base64::{Engine, engine::general_purpose::STANDARD};

/// Characters per line before a break is inserted.
pub const LINE_LENGTH: usize = 64;

const LINE_BREAK: &str = "\r\n";

/// Render `bytes` in canonical form.
#[must_use]
pub fn canonical_encoding(bytes: &[u8]) -> String {
    let flat = STANDARD.encode(bytes);
    if flat.len() <= LINE_LENGTH {
        return flat;
    }
    let breaks = (flat.len() - 1) / LINE_LENGTH;
    let mut out = String::with_capacity(flat.len() + breaks * LINE_BREAK.len());
    // base64 output is ASCII, so byte chunks are char boundaries.
    for (i, line) in flat.as_bytes().chunks(LINE_LENGTH).enumerate() {
        if i > 0 {
            out.push_str(LINE_BREAK);
        }
        out.extend(line.iter().map(|&b| char::from(b)));
    }
    out
}
