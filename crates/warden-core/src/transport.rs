//! The session transport seam.
//!
//! The vendor's session protocol is an external collaborator. Everything the
//! session manager needs from it is captured by [`NetworkTransport`]: start a
//! login, sign off, act on relationships, and deliver lifecycle notifications
//! as a stream of tagged events.

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use warden_types::{AccountId, ConnectFailure, Credentials, GuardCode, RelationshipEvent};

use crate::error::Result;

/// Notifications delivered by a transport, consumed by the session manager's
/// dispatch loop.
#[derive(Debug)]
pub enum TransportEvent {
    /// Authentication completed and the session is live.
    Online { account: AccountId },
    /// The remote party demands a second factor before the login can
    /// proceed. The code is returned through `reply`; the login sequence
    /// stays suspended until then.
    GuardCodeRequired {
        /// E.g. the e-mail domain the code was sent to. Absent for mobile
        /// authenticator codes.
        hint: Option<String>,
        reply: oneshot::Sender<GuardCode>,
    },
    /// A login attempt failed.
    ConnectFailed { failure: ConnectFailure },
    /// The session ended, either as a sign-off acknowledgement or
    /// unsolicited.
    Disconnected { reason: Option<String> },
    /// An account's relationship with the operator's account changed.
    Relationship(RelationshipEvent),
}

/// An authenticated connection to the network.
///
/// Implementations must deliver relationship events in the order the network
/// reports them. `accept_request` and `sever_relationship` are idempotent:
/// acting on a relationship that no longer exists is a no-op, not an error.
#[async_trait]
pub trait NetworkTransport: Send + Sync {
    /// Returns the event stream for this transport. Called once, before
    /// `connect`.
    fn subscribe(&self) -> mpsc::Receiver<TransportEvent>;

    /// Starts a login attempt. The outcome arrives on the event stream;
    /// an error here means the attempt could not even be started.
    async fn connect(&self, credentials: &Credentials) -> Result<()>;

    /// Requests a graceful sign-off. Acknowledged with a
    /// [`TransportEvent::Disconnected`] event.
    async fn sign_off(&self) -> Result<()>;

    /// Marks the operator's account as present/online after login.
    async fn announce_presence(&self) -> Result<()>;

    async fn accept_request(&self, account: AccountId) -> Result<()>;

    async fn sever_relationship(&self, account: AccountId) -> Result<()>;
}
