//! Commands flowing back into the session manager's dispatch loop.

use tokio::sync::mpsc;
use warden_types::AccountId;

use crate::error::{Result, WardenError};

/// Commands accepted by the session manager's dispatch loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SessionCommand {
    /// Re-run the login sequence after a retry backoff elapsed.
    Reconnect,
    AcceptRequest(AccountId),
    SeverRelationship(AccountId),
}

/// Cloneable handle for issuing relationship actions through the session
/// manager. Routing actions through the dispatch loop keeps every transport
/// write in one place.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    pub(crate) fn new(commands: mpsc::Sender<SessionCommand>) -> Self {
        Self { commands }
    }

    /// Accepts a pending incoming friend request. A no-op if the request no
    /// longer exists.
    pub async fn accept_request(&self, account: AccountId) -> Result<()> {
        self.send(SessionCommand::AcceptRequest(account)).await
    }

    /// Severs the relationship with `account`. A no-op if the relationship
    /// no longer exists.
    pub async fn sever_relationship(&self, account: AccountId) -> Result<()> {
        self.send(SessionCommand::SeverRelationship(account)).await
    }

    async fn send(&self, command: SessionCommand) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| WardenError::transport("the session is no longer running"))
    }
}
