//! Out-of-band discovery payload.
//!
//! The server publishes a small JSON record (rendered as a QR code by the
//! host application) naming itself and carrying its long-lived public key as
//! PEM text. The client scans it and keeps the result as a [`PeerDescriptor`]
//! for the lifetime of one connection.

use p256::pkcs8::der::pem;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Label of a SubjectPublicKeyInfo PEM document.
const PUBLIC_KEY_LABEL: &str = "PUBLIC KEY";

/// Errors raised while reading a discovery record.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("discovery record is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("identityPublicKey is not a PEM document: {0}")]
    Pem(pem::Error),
    #[error("identityPublicKey PEM label is {0:?}, expected \"PUBLIC KEY\"")]
    UnexpectedLabel(String),
}

/// Wire form of the discovery record. Field names are fixed by the host
/// applications that produce and scan it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerInfo {
    /// SubjectPublicKeyInfo PEM (`-----BEGIN PUBLIC KEY-----`).
    pub identity_public_key: String,
    pub device_id: String,
    /// Advertised radio name; the client connects to the peer with this name.
    pub device_name: String,
    pub owner_user: String,
    pub firmware_version: String,
    /// UNIX seconds at which the record was produced.
    pub timestamp: u32,
}

impl ServerInfo {
    /// Build the record a server publishes about itself, stamped with the
    /// current time.
    #[must_use]
    pub fn describe(
        device_name: impl Into<String>,
        public_key_pem: impl Into<String>,
        device_id: impl Into<String>,
        owner_user: impl Into<String>,
        firmware_version: impl Into<String>,
    ) -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Self {
            identity_public_key: public_key_pem.into(),
            device_id: device_id.into(),
            device_name: device_name.into(),
            owner_user: owner_user.into(),
            firmware_version: firmware_version.into(),
            timestamp: u32::try_from(now).unwrap_or(u32::MAX),
        }
    }

    /// # Errors
    /// Returns `DiscoveryError::Json` if serialization fails.
    pub fn to_json(&self) -> Result<String, DiscoveryError> {
        Ok(serde_json::to_string(self)?)
    }

    /// # Errors
    /// Returns `DiscoveryError::Json` for malformed or incomplete records.
    pub fn from_json(s: &str) -> Result<Self, DiscoveryError> {
        Ok(serde_json::from_str(s)?)
    }
}

/// Server metadata held by the client for one connection.
///
/// `public_key` is the DER body of the advertised PEM; it is not parsed as a
/// curve point here. A key that does not parse surfaces later as a
/// verification failure, not as a discovery failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerDescriptor {
    pub name: String,
    pub public_key: Vec<u8>,
    pub device_id: String,
    pub owner: String,
    pub firmware_version: String,
    pub timestamp: u32,
}

impl PeerDescriptor {
    /// Minimal descriptor for callers that learned the key some other way.
    #[must_use]
    pub fn new(name: impl Into<String>, public_key: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            public_key,
            device_id: String::new(),
            owner: String::new(),
            firmware_version: String::new(),
            timestamp: 0,
        }
    }

    /// Parse a scanned discovery JSON record.
    ///
    /// # Errors
    /// See [`DiscoveryError`].
    pub fn from_json(s: &str) -> Result<Self, DiscoveryError> {
        Self::try_from(ServerInfo::from_json(s)?)
    }
}

impl TryFrom<ServerInfo> for PeerDescriptor {
    type Error = DiscoveryError;

    fn try_from(info: ServerInfo) -> Result<Self, Self::Error> {
        let public_key = pem_body(&info.identity_public_key)?;
        Ok(Self {
            name: info.device_name,
            public_key,
            device_id: info.device_id,
            owner: info.owner_user,
            firmware_version: info.firmware_version,
            timestamp: info.timestamp,
        })
    }
}

/// Decode an RFC 7468 `PUBLIC KEY` document to its DER body.
fn pem_body(text: &str) -> Result<Vec<u8>, DiscoveryError> {
    let (label, der) = pem::decode_vec(text.as_bytes()).map_err(DiscoveryError::Pem)?;
    if label != PUBLIC_KEY_LABEL {
        return Err(DiscoveryError::UnexpectedLabel(label.to_owned()));
    }
    Ok(der)
}
