//! Unified path management for warden configuration files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/warden/            # Config directory
//! ├── config.toml              # Runtime configuration
//! └── secret.json              # Account credentials
//! ```

use std::path::PathBuf;

use warden_core::error::{Result, WardenError};

/// Unified path management for warden.
pub struct WardenPaths;

impl WardenPaths {
    /// Returns the warden configuration directory for the platform.
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("warden"))
            .ok_or_else(|| {
                WardenError::config("could not determine the user configuration directory")
            })
    }

    /// Returns the path to `config.toml`.
    pub fn config_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Returns the path to `secret.json`.
    pub fn secret_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("secret.json"))
    }
}
