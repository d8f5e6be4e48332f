use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Canonical numeric identifier of an account on the network.
///
/// Rendered as the decimal string used in public profile URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(u64);

impl AccountId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error returned when an account identifier cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("account identifiers are numeric, got {0:?}")]
pub struct ParseAccountIdError(pub String);

impl FromStr for AccountId {
    type Err = ParseAccountIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(AccountId)
            .map_err(|_| ParseAccountIdError(s.to_string()))
    }
}

/// The relationship between the operator's account and another account.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RelationshipKind {
    /// No relationship exists (or it was just removed).
    None,
    /// The other account is blocked.
    Blocked,
    /// The other account sent us a friend request that is pending.
    RequestRecipient,
    /// The accounts are friends.
    Friend,
    /// We sent the other account a friend request that is pending.
    RequestInitiator,
    /// The other account is ignored.
    Ignored,
}

/// A notification that an account's relationship with the operator's
/// account changed. Produced by the session, consumed once by the policy
/// engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipEvent {
    pub account: AccountId,
    pub kind: RelationshipKind,
}

impl RelationshipEvent {
    pub fn new(account: AccountId, kind: RelationshipKind) -> Self {
        Self { account, kind }
    }
}

/// Connection state of the authenticated session.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    AwaitingGuardCode,
    Online,
    /// Terminal state, reached only through non-retryable failures.
    Failed,
}

/// How an authentication attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectFailure {
    #[error("invalid account name or password")]
    InvalidCredentials,
    #[error("too many login attempts, the network is rate limiting this account")]
    RateLimited,
    #[error("the network is unreachable")]
    NetworkUnreachable,
    #[error("login failed: {0}")]
    Unknown(String),
}

impl ConnectFailure {
    /// Only connectivity loss is worth retrying; everything else needs the
    /// operator.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ConnectFailure::NetworkUnreachable)
    }
}

/// Outcome of probing a profile's comment section.
///
/// `Unknown` is the terminal verdict when the probe exhausted its retries or
/// hit a definite non-network failure; it must never cause a relationship to
/// be severed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CommentVisibility {
    Visible,
    Hidden,
    Unknown,
}

/// Result of one visibility check. Not persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibilityResult {
    pub verdict: CommentVisibility,
    /// Present when the verdict is `Unknown`, describing what went wrong.
    pub failure: Option<String>,
}

impl VisibilityResult {
    pub fn visible() -> Self {
        Self {
            verdict: CommentVisibility::Visible,
            failure: None,
        }
    }

    pub fn hidden() -> Self {
        Self {
            verdict: CommentVisibility::Hidden,
            failure: None,
        }
    }

    pub fn unknown(reason: impl Into<String>) -> Self {
        Self {
            verdict: CommentVisibility::Unknown,
            failure: Some(reason.into()),
        }
    }

    pub fn comments_visible(&self) -> bool {
        self.verdict == CommentVisibility::Visible
    }
}

/// How the session ended.
///
/// `Clean` maps to exit code 0, `Forced` (the sign-off grace timer fired
/// without an acknowledgement) to exit code 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownKind {
    Clean,
    Forced,
}

/// A second-factor credential supplied by the operator mid-login.
///
/// The code is short-lived but still a credential, so `Debug` redacts it.
#[derive(Clone, PartialEq, Eq)]
pub struct GuardCode(String);

impl GuardCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for GuardCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("GuardCode(****)")
    }
}

/// Account credentials, loaded once at startup.
///
/// `Debug` shows the account name and elides the password.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub account_name: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("account_name", &self.account_name)
            .field("password", &"****")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_id_display_matches_profile_url_segment() {
        let id = AccountId::new(76500000000000001);
        assert_eq!(id.to_string(), "76500000000000001");
    }

    #[test]
    fn test_account_id_parses_decimal_string() {
        let id: AccountId = "76500000000000002".parse().unwrap();
        assert_eq!(id, AccountId::new(76500000000000002));
    }

    #[test]
    fn test_account_id_rejects_non_numeric_input() {
        let err = "not-an-id".parse::<AccountId>().unwrap_err();
        assert!(err.to_string().contains("not-an-id"));
    }

    #[test]
    fn test_connect_failure_retryability() {
        assert!(ConnectFailure::NetworkUnreachable.is_retryable());
        assert!(!ConnectFailure::InvalidCredentials.is_retryable());
        assert!(!ConnectFailure::RateLimited.is_retryable());
        assert!(!ConnectFailure::Unknown("boom".into()).is_retryable());
    }

    #[test]
    fn test_visibility_result_constructors() {
        assert!(VisibilityResult::visible().comments_visible());
        assert!(!VisibilityResult::hidden().comments_visible());

        let unknown = VisibilityResult::unknown("timed out");
        assert!(!unknown.comments_visible());
        assert_eq!(unknown.verdict, CommentVisibility::Unknown);
        assert_eq!(unknown.failure.as_deref(), Some("timed out"));
    }

    #[test]
    fn test_guard_code_debug_is_redacted() {
        let code = GuardCode::new("ABC12");
        assert_eq!(format!("{:?}", code), "GuardCode(****)");
        assert_eq!(code.as_str(), "ABC12");
    }

    #[test]
    fn test_credentials_debug_elides_password() {
        let credentials = Credentials {
            account_name: "operator".to_string(),
            password: "hunter2".to_string(),
        };
        let rendered = format!("{:?}", credentials);
        assert!(rendered.contains("operator"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn test_relationship_event_round_trips_through_json() {
        let event = RelationshipEvent::new(
            AccountId::new(76500000000000001),
            RelationshipKind::RequestRecipient,
        );
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("request_recipient"));
        let back: RelationshipEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
