pub mod check;
pub mod run;

use std::path::PathBuf;

use anyhow::Result;
use warden_core::config::{RootConfig, SecretConfig};
use warden_infrastructure::{ConfigStorage, SecretStorage};

pub(crate) fn load_config(path: Option<PathBuf>) -> Result<RootConfig> {
    let storage = match path {
        Some(path) => ConfigStorage::with_path(path),
        None => ConfigStorage::new()?,
    };
    Ok(storage.load_or_init()?)
}

pub(crate) fn load_secrets() -> Result<SecretConfig> {
    Ok(SecretStorage::new()?.load()?)
}
