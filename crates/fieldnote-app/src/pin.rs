//! PIN vault: salted-hash storage for the app lock screen.

use std::path::PathBuf;

use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::fs;
use tracing::info;

use fieldnote_core::defaults::PIN_MIN_LEN;
use fieldnote_core::{Error, Result};

#[derive(Serialize, Deserialize)]
struct VaultFile {
    salt: String,
    hash: String,
}

/// File-backed PIN vault.
///
/// The first validated PIN becomes the stored one; later attempts compare
/// against its salted SHA-256. The plaintext never touches disk.
pub struct PinVault {
    path: PathBuf,
}

impl PinVault {
    /// Create a vault stored at the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Validate a PIN, setting it on first use.
    ///
    /// Returns `Ok(true)` when the PIN matches (or was just set),
    /// `Ok(false)` on a mismatch, and `Err(InvalidInput)` for a malformed
    /// PIN (shorter than [`PIN_MIN_LEN`] or non-numeric).
    pub async fn validate(&self, pin: &str) -> Result<bool> {
        if pin.len() < PIN_MIN_LEN || !pin.chars().all(|c| c.is_ascii_digit()) {
            return Err(Error::InvalidInput(format!(
                "PIN must be at least {} digits",
                PIN_MIN_LEN
            )));
        }

        match self.load().await? {
            Some(vault) => Ok(hash_pin(&vault.salt, pin) == vault.hash),
            None => {
                self.save(pin).await?;
                info!(subsystem = "app", component = "pin_vault", "PIN set");
                Ok(true)
            }
        }
    }

    /// Whether a PIN has been set.
    pub async fn is_set(&self) -> Result<bool> {
        Ok(self.load().await?.is_some())
    }

    async fn load(&self) -> Result<Option<VaultFile>> {
        match fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, pin: &str) -> Result<()> {
        let mut salt_bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut salt_bytes);
        let salt = hex::encode(salt_bytes);

        let vault = VaultFile {
            hash: hash_pin(&salt, pin),
            salt,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&self.path, serde_json::to_vec(&vault)?).await?;
        Ok(())
    }
}

fn hash_pin(salt: &str, pin: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(pin.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vault_in(dir: &tempfile::TempDir) -> PinVault {
        PinVault::new(dir.path().join("pin.json"))
    }

    #[tokio::test]
    async fn test_first_pin_is_set_and_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let vault = vault_in(&dir);

        assert!(!vault.is_set().await.unwrap());
        assert!(vault.validate("1234").await.unwrap());
        assert!(vault.is_set().await.unwrap());
    }

    #[tokio::test]
    async fn test_matching_pin_accepted_wrong_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let vault = vault_in(&dir);

        vault.validate("4711").await.unwrap();
        assert!(vault.validate("4711").await.unwrap());
        assert!(!vault.validate("0000").await.unwrap());
    }

    #[tokio::test]
    async fn test_malformed_pin_is_invalid_input() {
        let dir = tempfile::tempdir().unwrap();
        let vault = vault_in(&dir);

        assert!(matches!(
            vault.validate("12").await.unwrap_err(),
            Error::InvalidInput(_)
        ));
        assert!(matches!(
            vault.validate("12ab").await.unwrap_err(),
            Error::InvalidInput(_)
        ));
        // Nothing was persisted by the failed attempts.
        assert!(!vault.is_set().await.unwrap());
    }

    #[tokio::test]
    async fn test_plaintext_never_stored() {
        let dir = tempfile::tempdir().unwrap();
        let vault = vault_in(&dir);
        vault.validate("9876").await.unwrap();

        let raw = std::fs::read_to_string(dir.path().join("pin.json")).unwrap();
        assert!(!raw.contains("9876"));
    }
}
