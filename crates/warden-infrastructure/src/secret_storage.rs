//! Credentials file storage.
//!
//! Provides read-only loading of account credentials from
//! `~/.config/warden/secret.json`.

use std::fs;
use std::path::{Path, PathBuf};

use warden_core::config::SecretConfig;
use warden_core::error::{Result, WardenError};

/// Storage for the credentials file (`secret.json`).
///
/// Responsibilities:
/// - Load `secret.json` from the warden config directory
/// - Parse it into the `SecretConfig` model
///
/// Does NOT:
/// - Write or modify secret files (read-only)
/// - Validate credentials against the network
/// - Handle encryption (plaintext JSON storage)
///
/// # Security Note
///
/// The secret file is plaintext JSON and should carry restrictive file
/// permissions (e.g. 600). Error messages never contain secret values.
pub struct SecretStorage {
    path: PathBuf,
}

impl SecretStorage {
    /// Creates a storage pointed at the default path
    /// (`~/.config/warden/secret.json`).
    pub fn new() -> Result<Self> {
        Ok(Self {
            path: crate::paths::WardenPaths::secret_file()?,
        })
    }

    /// Creates a storage with a custom path (for testing).
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Loads the credentials from the JSON file.
    ///
    /// # Errors
    ///
    /// Returns a `Config` error when the file does not exist, an `Io` error
    /// when it cannot be read, and a `Serialization` error when it is not
    /// valid JSON.
    pub fn load(&self) -> Result<SecretConfig> {
        if !self.path.exists() {
            return Err(WardenError::config(format!(
                "credentials file not found at {}",
                self.path.display()
            )));
        }

        let content = fs::read_to_string(&self.path)?;
        let config = serde_json::from_str(&content)?;

        Ok(config)
    }

    /// Returns the path to the secret file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
