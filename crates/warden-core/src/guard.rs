//! The guard-code prompt seam.

use async_trait::async_trait;
use warden_types::GuardCode;

use crate::error::Result;

/// Supplies a second-factor code when the session demands one.
///
/// Implementations suspend the caller until the code is available; there is
/// deliberately no timeout, since guard codes only occur in operator-attended
/// runs. While the prompt is outstanding the login sequence cannot proceed,
/// so session progress is paused by design.
#[async_trait]
pub trait GuardCodePrompt: Send + Sync {
    /// Obtains a guard code from the operator.
    ///
    /// # Arguments
    ///
    /// * `hint` - Where the code was delivered (e.g. an e-mail domain), when
    ///   the network provides that detail.
    async fn request_code(&self, hint: Option<&str>) -> Result<GuardCode>;
}
