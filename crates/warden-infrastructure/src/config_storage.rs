//! Runtime configuration storage.
//!
//! Loads `RootConfig` from `~/.config/warden/config.toml`, writing a default
//! file on first run so operators have something to edit.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;
use warden_core::config::RootConfig;
use warden_core::error::{Result, WardenError};

pub struct ConfigStorage {
    path: PathBuf,
}

impl ConfigStorage {
    /// Creates a storage pointed at the default path
    /// (`~/.config/warden/config.toml`).
    pub fn new() -> Result<Self> {
        Ok(Self {
            path: crate::paths::WardenPaths::config_file()?,
        })
    }

    /// Creates a storage with a custom path (for testing or `--config`).
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Loads the configuration, creating a default file when none exists.
    pub fn load_or_init(&self) -> Result<RootConfig> {
        if !self.path.exists() {
            let config = RootConfig::default();
            self.write_default(&config)?;
            return Ok(config);
        }

        let content = fs::read_to_string(&self.path)?;
        let config = toml::from_str(&content)?;
        Ok(config)
    }

    fn write_default(&self, config: &RootConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let rendered = toml::to_string_pretty(config)?;
        fs::write(&self.path, rendered)?;
        info!("wrote default configuration to {}", self.path.display());
        Ok(())
    }

    /// Returns the path to the configuration file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
