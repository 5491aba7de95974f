//! Persistent pairing credentials: access token and numeric PIN.
//!
//! On first run the host generates a 256-bit random token (hex-encoded) and a
//! six-digit PIN, persists them to `auth.json` in the config directory, and
//! reuses them on every subsequent start.  The file is chmodded `0o600` on
//! Unix so other local users cannot read the secrets.
//!
//! Validation compares SHA-256 digests of the presented value against the
//! stored digests, so the comparison shape does not depend on where a guess
//! first diverges from the secret.

use std::path::{Path, PathBuf};

use rand::rngs::OsRng;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{info, warn};

const CREDENTIAL_FILE: &str = "auth.json";
const RECORD_VERSION: &str = "1.0";

/// Error type for credential persistence.
///
/// Generation itself cannot fail; only reading and writing the record can.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("I/O error accessing credentials at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize credential record: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// The on-disk credential record.
///
/// The plaintext token and PIN are stored alongside their digests: the host
/// must be able to display them to the user for pairing, and the file itself
/// is the trust boundary (local account, `0o600`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct CredentialRecord {
    version: String,
    token: String,
    token_hash: String,
    pin: String,
    pin_hash: String,
    /// Unix timestamp of generation, for display/debugging only.
    created_at: u64,
}

/// Connection details shown to the user for pairing a remote device.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionInfo {
    pub pin: String,
    pub token: String,
    /// Deep link encoded into the pairing QR code.
    pub qr_data: String,
}

/// Loaded (or freshly generated) pairing credentials.
pub struct CredentialStore {
    path: PathBuf,
    record: CredentialRecord,
}

impl CredentialStore {
    /// Loads credentials from `config_dir`, generating and persisting a new
    /// record when none exists.  An unreadable or corrupt record is replaced
    /// by a fresh one (with a warning) rather than locking the user out.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::Io`] when the config directory or the
    /// credential file cannot be written.
    pub fn initialize(config_dir: &Path) -> Result<Self, CredentialError> {
        std::fs::create_dir_all(config_dir).map_err(|source| CredentialError::Io {
            path: config_dir.to_path_buf(),
            source,
        })?;
        let path = config_dir.join(CREDENTIAL_FILE);

        match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<CredentialRecord>(&content) {
                Ok(record) => {
                    info!("loaded existing pairing credentials");
                    Ok(Self { path, record })
                }
                Err(e) => {
                    warn!("credential record is corrupt ({e}); generating new credentials");
                    Self::generate_at(path)
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("no credential record found; generating new credentials");
                Self::generate_at(path)
            }
            Err(source) => Err(CredentialError::Io { path, source }),
        }
    }

    /// Replaces the current credentials with freshly generated ones and
    /// persists the new record.  Previously paired devices must re-pair.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::Io`] when the record cannot be written.
    pub fn regenerate(&mut self) -> Result<ConnectionInfo, CredentialError> {
        self.record = generate_record();
        persist_record(&self.path, &self.record)?;
        info!("pairing credentials regenerated");
        Ok(self.connection_info())
    }

    /// Checks a presented credential (token or PIN) by digest comparison.
    pub fn validate(&self, presented: &str) -> bool {
        let digest = sha256_hex(presented);
        digest == self.record.token_hash || digest == self.record.pin_hash
    }

    /// Details the user needs to pair a device.
    pub fn connection_info(&self) -> ConnectionInfo {
        ConnectionInfo {
            pin: self.record.pin.clone(),
            token: self.record.token.clone(),
            qr_data: format!("artremote://connect?token={}", self.record.token),
        }
    }

    fn generate_at(path: PathBuf) -> Result<Self, CredentialError> {
        let record = generate_record();
        persist_record(&path, &record)?;
        Ok(Self { path, record })
    }
}

fn generate_record() -> CredentialRecord {
    // 256 bits of OS randomness, hex-encoded.
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    let token: String = bytes.iter().map(|b| format!("{b:02x}")).collect();

    // Uniform six-digit PIN; never starts with 0 so it always reads as six
    // digits.
    let pin = format!("{}", OsRng.gen_range(100_000..=999_999));

    let created_at = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    CredentialRecord {
        version: RECORD_VERSION.to_string(),
        token_hash: sha256_hex(&token),
        pin_hash: sha256_hex(&pin),
        token,
        pin,
        created_at,
    }
}

fn persist_record(path: &Path, record: &CredentialRecord) -> Result<(), CredentialError> {
    let content = serde_json::to_string_pretty(record)?;
    std::fs::write(path, content).map_err(|source| CredentialError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    // Owner read/write only; the file holds plaintext secrets.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).map_err(
            |source| CredentialError::Io {
                path: path.to_path_buf(),
                source,
            },
        )?;
    }

    Ok(())
}

fn sha256_hex(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
