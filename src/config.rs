//! Session tuning loaded from JSON.
//!
//! ```json
//! { "step_timeout_secs": 30, "end_of_transfer": "sentinel_when_ambiguous", "acknowledge_transfers": true }
//! ```
//! Every field is optional. `"step_timeout_secs": null` disables the deadline.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::domain::transfer::EndOfTransfer;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config: {0}")]
    Io(#[from] std::io::Error),
    #[error("parsing config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration parameters for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Idle deadline per pending handshake step. `None` waits forever.
    #[serde(rename = "step_timeout_secs", with = "opt_secs")]
    pub step_timeout: Option<Duration>,
    /// Whether the sender follows ambiguous payloads with the end marker.
    pub end_of_transfer: EndOfTransfer,
    /// Server sends an empty notification after each completed payload.
    pub acknowledge_transfers: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            step_timeout: Some(Duration::from_secs(30)),
            end_of_transfer: EndOfTransfer::default(),
            acknowledge_transfers: true,
        }
    }
}

impl SessionConfig {
    /// # Errors
    /// * `ConfigError::Io` if the file cannot be read.
    /// * `ConfigError::Json` for malformed JSON or unknown fields.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// # Errors
    /// `ConfigError::Json` for malformed JSON or unknown fields.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }
}

mod opt_secs {
    use super::{Deserialize, Deserializer, Duration, Serializer};

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(v: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match v {
            Some(d) => s.serialize_some(&d.as_secs_f64()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        let secs: Option<f64> = Option::deserialize(d)?;
        secs.map(|s| Duration::try_from_secs_f64(s).map_err(serde::de::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_default() {
        assert_eq!(SessionConfig::from_json("{}").unwrap(), SessionConfig::default());
    }

    #[test]
    fn fields_parse() {
        let c = SessionConfig::from_json(
            r#"{"step_timeout_secs": 2.5, "end_of_transfer": "legacy", "acknowledge_transfers": false}"#,
        )
        .unwrap();
        assert_eq!(c.step_timeout, Some(Duration::from_millis(2500)));
        assert_eq!(c.end_of_transfer, EndOfTransfer::Legacy);
        assert!(!c.acknowledge_transfers);
    }

    #[test]
    fn null_timeout_disables_deadline() {
        let c = SessionConfig::from_json(r#"{"step_timeout_secs": null}"#).unwrap();
        assert_eq!(c.step_timeout, None);
    }

    #[test]
    fn negative_timeout_and_unknown_fields_rejected() {
        assert!(SessionConfig::from_json(r#"{"step_timeout_secs": -1}"#).is_err());
        assert!(SessionConfig::from_json(r#"{"nonce_len": 16}"#).is_err());
    }

    #[test]
    fn round_trips_through_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let c = SessionConfig {
            step_timeout: Some(Duration::from_secs(5)),
            ..SessionConfig::default()
        };
        std::fs::write(&path, serde_json::to_string(&c).unwrap()).unwrap();
        assert_eq!(SessionConfig::from_json_file(&path).unwrap(), c);
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            SessionConfig::from_json_file("/nonexistent/session.json"),
            Err(ConfigError::Io(_))
        ));
    }
}
