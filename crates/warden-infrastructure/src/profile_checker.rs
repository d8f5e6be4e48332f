//! Profile comment-section visibility checker.
//!
//! The network does not expose the "who can comment on my profile" privacy
//! setting through its session protocol, so the checker infers it from the
//! public profile page: profiles with visible comments render a comment
//! thread container with a well-known element id, profiles without do not.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use rand::Rng;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use tokio::time;
use tracing::{debug, warn};
use warden_core::config::VisibilitySettings;
use warden_core::error::{Result, WardenError};
use warden_core::visibility::VisibilityProbe;
use warden_types::{AccountId, VisibilityResult};

/// Element id of the recent-comments thread on a public profile page.
const COMMENT_THREAD_ID: &str = "commentthread_Profile_RecentComments";

static COMMENT_THREAD_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(&format!("#{COMMENT_THREAD_ID}")).expect("static selector is valid")
});

/// Returns whether the profile document contains the comment thread marker.
pub fn document_has_comment_thread(html: &str) -> bool {
    Html::parse_document(html)
        .select(&COMMENT_THREAD_SELECTOR)
        .next()
        .is_some()
}

enum FetchError {
    /// Worth retrying: the connection timed out or could not be established.
    Transient(String),
    /// Not worth retrying: an HTTP error status or a broken response.
    Definite(String),
}

/// Probes public profile pages over HTTP.
pub struct ProfileVisibilityChecker {
    client: Client,
    settings: VisibilitySettings,
}

impl ProfileVisibilityChecker {
    pub fn new(settings: VisibilitySettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.fetch_timeout())
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|err| WardenError::internal(format!("failed to build HTTP client: {err}")))?;
        Ok(Self { client, settings })
    }

    /// Canonical public profile URL for an account.
    pub fn profile_url(&self, account: AccountId) -> String {
        format!(
            "{}/profiles/{}",
            self.settings.profile_base_url.trim_end_matches('/'),
            account
        )
    }

    async fn fetch_once(&self, url: &str) -> std::result::Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(classify_request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Definite(format!(
                "unexpected HTTP status {status}"
            )));
        }

        response.text().await.map_err(classify_request_error)
    }
}

#[async_trait]
impl VisibilityProbe for ProfileVisibilityChecker {
    /// Fetches the profile page and reports the comment-section verdict.
    ///
    /// Transient failures are retried with exponential backoff up to the
    /// configured attempt limit; once exhausted (or on a definite failure)
    /// the verdict settles on `Unknown`, never on a false `Hidden`.
    async fn check(&self, account: AccountId) -> VisibilityResult {
        let url = self.profile_url(account);
        let max_attempts = self.settings.max_fetch_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.fetch_once(&url).await {
                Ok(body) => {
                    return if document_has_comment_thread(&body) {
                        VisibilityResult::visible()
                    } else {
                        VisibilityResult::hidden()
                    };
                }
                Err(FetchError::Definite(reason)) => {
                    warn!(%account, "profile fetch failed: {reason}");
                    return VisibilityResult::unknown(reason);
                }
                Err(FetchError::Transient(reason)) => {
                    if attempt >= max_attempts {
                        warn!(%account, "giving up after {attempt} attempts: {reason}");
                        return VisibilityResult::unknown(format!(
                            "transient failures persisted across {attempt} attempts: {reason}"
                        ));
                    }
                    let delay = retry_delay(self.settings.retry_delay(), attempt);
                    debug!(
                        %account, attempt,
                        "transient fetch failure ({reason}), retrying in {delay:?}"
                    );
                    time::sleep(delay).await;
                }
            }
        }
    }
}

fn classify_request_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() || err.is_connect() {
        FetchError::Transient(err.to_string())
    } else {
        FetchError::Definite(err.to_string())
    }
}

fn retry_delay(base: Duration, attempt: u32) -> Duration {
    let exp = 2f64.powi(attempt.saturating_sub(1) as i32);
    let jitter = rand::thread_rng().gen_range(0.9..1.1);
    base.mul_f64(exp * jitter)
}
