//! File transfer vocabulary shared by the sender and receiver engines.

use serde::{Deserialize, Serialize};

/// Literal end-of-transfer marker. A chunk whose bytes are exactly this value
/// ends the transfer and is not part of the file.
pub const END_OF_FILE_MARKER: &[u8; 3] = b"EOF";

/// How a sender signals the end of a payload.
///
/// The receiver always understands both signals (sentinel, then shrinkage);
/// this only controls whether the sender ever emits the sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndOfTransfer {
    /// Never send the sentinel. The receiver only finalizes when the last
    /// chunk is shorter than the one before it, so single-chunk payloads and
    /// payloads that are an exact multiple of the chunk size never complete.
    Legacy,
    /// Send the sentinel only when the shrinkage signal cannot fire: empty
    /// payloads, single-chunk payloads and exact multiples of the chunk size.
    #[default]
    SentinelWhenAmbiguous,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_is_ascii_eof() {
        assert_eq!(std::str::from_utf8(END_OF_FILE_MARKER).unwrap(), "EOF");
    }

    #[test]
    fn policy_serde_names() {
        let p: EndOfTransfer = serde_json::from_str("\"legacy\"").unwrap();
        assert_eq!(p, EndOfTransfer::Legacy);
        assert_eq!(
            serde_json::to_string(&EndOfTransfer::SentinelWhenAmbiguous).unwrap(),
            "\"sentinel_when_ambiguous\""
        );
        assert_eq!(EndOfTransfer::default(), EndOfTransfer::SentinelWhenAmbiguous);
    }
}
