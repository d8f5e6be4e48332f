//! Runtime configuration models.
//!
//! The three historical variants of this agent differed only in whether they
//! prompted for a guard code, retried lost connections, and signed off
//! gracefully. Those differences are configuration knobs on one session
//! manager here, not separate code paths.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use warden_types::Credentials;

/// Root of `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RootConfig {
    pub transport: TransportSettings,
    pub session: SessionSettings,
    pub visibility: VisibilitySettings,
}

/// Which session transport provider to connect with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportSettings {
    pub provider: String,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            provider: "mock".to_string(),
        }
    }
}

/// Session lifecycle knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Backoff before retrying a login that failed because the network was
    /// unreachable.
    pub reconnect_backoff_secs: u64,
    /// Backoff before reconnecting after an unsolicited disconnect.
    pub resume_backoff_secs: u64,
    /// How long to wait for a sign-off acknowledgement before forcing the
    /// disconnect.
    pub sign_off_grace_secs: u64,
    /// Whether a guard code may be requested interactively. When disabled,
    /// a guard code demand is a fatal authentication error.
    pub interactive_guard: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            reconnect_backoff_secs: 60,
            resume_backoff_secs: 30,
            sign_off_grace_secs: 5,
            interactive_guard: true,
        }
    }
}

impl SessionSettings {
    pub fn reconnect_backoff(&self) -> Duration {
        Duration::from_secs(self.reconnect_backoff_secs)
    }

    pub fn resume_backoff(&self) -> Duration {
        Duration::from_secs(self.resume_backoff_secs)
    }

    pub fn sign_off_grace(&self) -> Duration {
        Duration::from_secs(self.sign_off_grace_secs)
    }
}

/// Profile visibility probe knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisibilitySettings {
    /// Base URL of the public community site hosting profile pages.
    pub profile_base_url: String,
    /// Timeout for one profile fetch.
    pub fetch_timeout_secs: u64,
    /// Base delay before retrying a transient fetch failure. Subsequent
    /// attempts back off exponentially from this value.
    pub retry_delay_secs: u64,
    /// Total fetch attempts before the probe settles on `Unknown`.
    pub max_fetch_attempts: u32,
    /// Client identity header. The community site rejects obviously
    /// non-browser clients.
    pub user_agent: String,
}

impl Default for VisibilitySettings {
    fn default() -> Self {
        Self {
            profile_base_url: "https://steamcommunity.com".to_string(),
            fetch_timeout_secs: 10,
            retry_delay_secs: 5,
            max_fetch_attempts: 4,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36"
                .to_string(),
        }
    }
}

impl VisibilitySettings {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

/// Root of `secret.json`. Credentials are kept out of `config.toml` so the
/// runtime config can be shared freely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecretConfig {
    pub account: Option<Credentials>,
}
