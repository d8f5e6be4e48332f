//! The relationship policy engine.
//!
//! One branch: a pending incoming friend request from an account that hides
//! its profile comment section gets severed; everything else is left for the
//! operator. Acceptance is deliberately a manual step.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use warden_types::{AccountId, CommentVisibility, RelationshipEvent, RelationshipKind};

use crate::session::SessionHandle;
use crate::visibility::VisibilityProbe;

pub struct RelationshipPolicy {
    probe: Arc<dyn VisibilityProbe>,
    session: SessionHandle,
    shutdown: CancellationToken,
}

impl RelationshipPolicy {
    pub fn new(
        probe: Arc<dyn VisibilityProbe>,
        session: SessionHandle,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            probe,
            session,
            shutdown,
        }
    }

    /// Consumes relationship events until the channel closes. Each pending
    /// incoming request is screened in its own task; checks are independent
    /// and idempotent, so no ordering is enforced between them.
    pub async fn run(self: Arc<Self>, mut events: mpsc::Receiver<RelationshipEvent>) {
        while let Some(event) = events.recv().await {
            if event.kind != RelationshipKind::RequestRecipient {
                debug!(account = %event.account, kind = %event.kind, "ignoring relationship change");
                continue;
            }
            let policy = Arc::clone(&self);
            tokio::spawn(async move {
                policy.screen_request(event.account).await;
            });
        }
    }

    /// Screens one pending incoming friend request.
    pub async fn screen_request(&self, account: AccountId) {
        info!(%account, "incoming friend request, probing profile visibility");
        let result = self.probe.check(account).await;
        match result.verdict {
            CommentVisibility::Hidden => {
                // A check that raced shutdown must not act on a session that
                // is already signing off.
                if self.shutdown.is_cancelled() {
                    debug!(%account, "check finished after shutdown began, taking no action");
                    return;
                }
                info!(%account, "comment section hidden, severing relationship");
                if let Err(err) = self.session.sever_relationship(account).await {
                    warn!(%account, "failed to sever relationship: {err}");
                }
            }
            CommentVisibility::Visible => {
                info!(%account, "comment section visible, leaving the request pending");
            }
            CommentVisibility::Unknown => {
                warn!(
                    %account,
                    "visibility undetermined ({}), leaving the request pending",
                    result.failure.as_deref().unwrap_or("no details")
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use warden_types::VisibilityResult;

    use crate::session::handle::SessionCommand;

    struct TableProbe {
        verdicts: HashMap<AccountId, VisibilityResult>,
    }

    #[async_trait]
    impl VisibilityProbe for TableProbe {
        async fn check(&self, account: AccountId) -> VisibilityResult {
            self.verdicts
                .get(&account)
                .cloned()
                .unwrap_or_else(|| VisibilityResult::unknown("account not in table"))
        }
    }

    fn policy_with(
        verdicts: HashMap<AccountId, VisibilityResult>,
        shutdown: CancellationToken,
    ) -> (RelationshipPolicy, mpsc::Receiver<SessionCommand>) {
        let (tx, rx) = mpsc::channel(8);
        let policy = RelationshipPolicy::new(
            Arc::new(TableProbe { verdicts }),
            SessionHandle::new(tx),
            shutdown,
        );
        (policy, rx)
    }

    #[tokio::test]
    async fn test_hidden_comments_sever_exactly_once() {
        let account = AccountId::new(76500000000000002);
        let mut verdicts = HashMap::new();
        verdicts.insert(account, VisibilityResult::hidden());
        let (policy, mut commands) = policy_with(verdicts, CancellationToken::new());

        policy.screen_request(account).await;

        assert_eq!(
            commands.recv().await,
            Some(SessionCommand::SeverRelationship(account))
        );
        assert!(commands.try_recv().is_err(), "only one action expected");
    }

    #[tokio::test]
    async fn test_visible_comments_leave_the_request_alone() {
        let account = AccountId::new(76500000000000001);
        let mut verdicts = HashMap::new();
        verdicts.insert(account, VisibilityResult::visible());
        let (policy, mut commands) = policy_with(verdicts, CancellationToken::new());

        policy.screen_request(account).await;

        assert!(commands.try_recv().is_err(), "no action expected");
    }

    #[tokio::test]
    async fn test_unknown_verdict_never_severs() {
        let account = AccountId::new(76500000000000009);
        let (policy, mut commands) = policy_with(HashMap::new(), CancellationToken::new());

        policy.screen_request(account).await;

        assert!(commands.try_recv().is_err(), "ambiguous checks must not sever");
    }

    #[tokio::test]
    async fn test_check_racing_shutdown_takes_no_action() {
        let account = AccountId::new(76500000000000002);
        let mut verdicts = HashMap::new();
        verdicts.insert(account, VisibilityResult::hidden());
        let shutdown = CancellationToken::new();
        let (policy, mut commands) = policy_with(verdicts, shutdown.clone());

        shutdown.cancel();
        policy.screen_request(account).await;

        assert!(commands.try_recv().is_err(), "no action after shutdown");
    }

    #[tokio::test]
    async fn test_run_only_screens_pending_incoming_requests() {
        let screened = AccountId::new(76500000000000002);
        let friend = AccountId::new(76500000000000005);
        let mut verdicts = HashMap::new();
        verdicts.insert(screened, VisibilityResult::hidden());
        verdicts.insert(friend, VisibilityResult::hidden());
        let (policy, mut commands) = policy_with(verdicts, CancellationToken::new());

        let (events_tx, events_rx) = mpsc::channel(8);
        let run = tokio::spawn(Arc::new(policy).run(events_rx));

        events_tx
            .send(RelationshipEvent::new(friend, RelationshipKind::Friend))
            .await
            .unwrap();
        events_tx
            .send(RelationshipEvent::new(
                screened,
                RelationshipKind::RequestRecipient,
            ))
            .await
            .unwrap();
        drop(events_tx);
        run.await.unwrap();

        assert_eq!(
            commands.recv().await,
            Some(SessionCommand::SeverRelationship(screened))
        );
        assert!(commands.try_recv().is_err(), "friend events are ignored");
    }
}
