//! Persistent device identity.
//!
//! The identity key is created on first use and restored on every later
//! start; it is never rotated. Stored as PKCS#8 PEM, readable by the owner
//! only on Unix.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use p256::SecretKey;
use p256::pkcs8::{DecodePrivateKey, EncodePrivateKey, LineEnding};
use rand::{CryptoRng, RngCore};
use thiserror::Error;
use tracing::info;
use zeroize::Zeroizing;

use super::p256_ecdsa::P256Identity;

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("key file i/o: {0}")]
    Io(#[from] io::Error),
    #[error("private key encoding: {0}")]
    Pkcs8(#[from] p256::pkcs8::Error),
    #[error("public key encoding: {0}")]
    Spki(#[from] p256::pkcs8::spki::Error),
}

/// Identity key kept in a single file.
#[derive(Debug, Clone)]
pub struct FileKeyStore {
    path: PathBuf,
}

impl FileKeyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Restore the stored identity, or generate and persist a new one.
    ///
    /// # Errors
    /// * `KeyError::Io` if the file cannot be read or written.
    /// * `KeyError::Pkcs8` if an existing file does not hold a P-256 key.
    pub fn load_or_generate<R: CryptoRng + RngCore>(
        &self,
        rng: &mut R,
    ) -> Result<P256Identity, KeyError> {
        if let Some(identity) = self.load()? {
            info!(path = %self.path.display(), "restored identity key");
            return Ok(identity);
        }
        let identity = P256Identity::generate(rng)?;
        self.store(identity.secret_key())?;
        info!(path = %self.path.display(), "generated new identity key");
        Ok(identity)
    }

    /// Restore the stored identity. `Ok(None)` if no key file exists.
    ///
    /// # Errors
    /// Same as [`FileKeyStore::load_or_generate`].
    pub fn load(&self) -> Result<Option<P256Identity>, KeyError> {
        let pem = match fs::read_to_string(&self.path) {
            Ok(s) => Zeroizing::new(s),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let secret = SecretKey::from_pkcs8_pem(&pem)?;
        Ok(Some(P256Identity::from_secret_key(&secret)?))
    }

    fn store(&self, secret: &SecretKey) -> Result<(), KeyError> {
        let pem = secret.to_pkcs8_pem(LineEnding::LF)?;
        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
        {
            fs::create_dir_all(dir)?;
        }
        let mut opts = fs::OpenOptions::new();
        opts.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            opts.mode(0o600);
        }
        let mut file = opts.open(&self.path)?;
        file.write_all(pem.as_bytes())?;
        file.sync_all()?;
        Ok(())
    }
}
