//! The profile visibility probe seam.

use async_trait::async_trait;
use warden_types::{AccountId, VisibilityResult};

/// Determines whether an account's public profile shows its comment section.
///
/// A probe never fails with an error: ambiguous outcomes fold into
/// [`VisibilityResult`] as an `Unknown` verdict, because the policy engine
/// always needs a definite answer to act on. Repeating a check has no side
/// effect, so probes need no coordination between invocations.
#[async_trait]
pub trait VisibilityProbe: Send + Sync {
    async fn check(&self, account: AccountId) -> VisibilityResult;
}
