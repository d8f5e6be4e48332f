//! Deterministic mock implementation of the shared `NetworkTransport`
//! contract.
//!
//! This crate contains no real protocol logic and is intended for local
//! development and contract-level integration testing: every `connect` call
//! plays back the next scripted event batch, and all transport calls are
//! recorded for assertions.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;
use warden_core::error::{Result, WardenError};
use warden_core::transport::{NetworkTransport, TransportEvent};
use warden_types::{AccountId, ConnectFailure, Credentials, GuardCode, RelationshipEvent, RelationshipKind};

/// Stable provider identifier used for explicit startup selection.
pub const MOCK_TRANSPORT_ID: &str = "mock";

const EVENT_BUFFER: usize = 64;

/// One step of a scripted reaction to a `connect` call.
#[derive(Debug, Clone)]
pub enum ScriptedEvent {
    Online { account: AccountId },
    /// Emits a guard code demand and waits for the code before playing the
    /// rest of the batch, like a real login sequence would.
    GuardCodeRequired { hint: Option<String> },
    ConnectFailed { failure: ConnectFailure },
    Disconnected { reason: Option<String> },
    Relationship(RelationshipEvent),
}

struct Inner {
    /// One event batch per expected `connect` call.
    script: Mutex<VecDeque<Vec<ScriptedEvent>>>,
    events: Mutex<Option<mpsc::Sender<TransportEvent>>>,
    /// Whether `sign_off` is acknowledged with a `Disconnected` event.
    acknowledge_sign_off: bool,
    /// Relationships that currently exist, for idempotence semantics.
    relationships: Mutex<HashSet<AccountId>>,
    connect_calls: AtomicUsize,
    sign_off_calls: AtomicUsize,
    presence_calls: AtomicUsize,
    accept_calls: Mutex<Vec<AccountId>>,
    sever_calls: Mutex<Vec<AccountId>>,
    guard_codes: Mutex<Vec<GuardCode>>,
}

/// Deterministic mock transport used by session tests and local runs.
#[derive(Clone)]
pub struct MockTransport {
    inner: Arc<Inner>,
}

impl MockTransport {
    /// Creates a mock that plays `script[n]` in response to the n-th
    /// `connect` call and acknowledges sign-offs.
    pub fn new(script: Vec<Vec<ScriptedEvent>>) -> Self {
        Self::build(script, true)
    }

    /// Creates a mock that never acknowledges a sign-off, for exercising the
    /// forced-shutdown path.
    pub fn without_sign_off_ack(script: Vec<Vec<ScriptedEvent>>) -> Self {
        Self::build(script, false)
    }

    fn build(script: Vec<Vec<ScriptedEvent>>, acknowledge_sign_off: bool) -> Self {
        Self {
            inner: Arc::new(Inner {
                script: Mutex::new(script.into_iter().collect()),
                events: Mutex::new(None),
                acknowledge_sign_off,
                relationships: Mutex::new(HashSet::new()),
                connect_calls: AtomicUsize::new(0),
                sign_off_calls: AtomicUsize::new(0),
                presence_calls: AtomicUsize::new(0),
                accept_calls: Mutex::new(Vec::new()),
                sever_calls: Mutex::new(Vec::new()),
                guard_codes: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Seeds an existing relationship, so a sever call has something to
    /// remove.
    pub fn with_relationship(self, account: AccountId) -> Self {
        lock(&self.inner.relationships).insert(account);
        self
    }

    pub fn connect_calls(&self) -> usize {
        self.inner.connect_calls.load(Ordering::SeqCst)
    }

    pub fn sign_off_calls(&self) -> usize {
        self.inner.sign_off_calls.load(Ordering::SeqCst)
    }

    pub fn presence_calls(&self) -> usize {
        self.inner.presence_calls.load(Ordering::SeqCst)
    }

    pub fn accept_calls(&self) -> Vec<AccountId> {
        lock(&self.inner.accept_calls).clone()
    }

    pub fn sever_calls(&self) -> Vec<AccountId> {
        lock(&self.inner.sever_calls).clone()
    }

    pub fn guard_codes(&self) -> Vec<GuardCode> {
        lock(&self.inner.guard_codes).clone()
    }

    pub fn relationship_exists(&self, account: AccountId) -> bool {
        lock(&self.inner.relationships).contains(&account)
    }
}

impl Default for MockTransport {
    /// A small local-development script: log in, then deliver one pending
    /// incoming friend request.
    fn default() -> Self {
        let requester = AccountId::new(76561197960265731);
        Self::new(vec![vec![
            ScriptedEvent::Online {
                account: AccountId::new(76561197960287930),
            },
            ScriptedEvent::Relationship(RelationshipEvent::new(
                requester,
                RelationshipKind::RequestRecipient,
            )),
        ]])
        .with_relationship(requester)
    }
}

#[async_trait]
impl NetworkTransport for MockTransport {
    fn subscribe(&self) -> mpsc::Receiver<TransportEvent> {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        *lock(&self.inner.events) = Some(tx);
        rx
    }

    async fn connect(&self, _credentials: &Credentials) -> Result<()> {
        self.inner.connect_calls.fetch_add(1, Ordering::SeqCst);
        let batch = lock(&self.inner.script).pop_front().unwrap_or_default();
        let sender = lock(&self.inner.events).clone().ok_or_else(|| {
            WardenError::transport("subscribe() must be called before connect()")
        })?;
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            play(batch, sender, inner).await;
        });
        Ok(())
    }

    async fn sign_off(&self) -> Result<()> {
        self.inner.sign_off_calls.fetch_add(1, Ordering::SeqCst);
        if self.inner.acknowledge_sign_off {
            if let Some(sender) = lock(&self.inner.events).clone() {
                let _ = sender.try_send(TransportEvent::Disconnected {
                    reason: Some("signed off".to_string()),
                });
            }
        }
        Ok(())
    }

    async fn announce_presence(&self) -> Result<()> {
        self.inner.presence_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn accept_request(&self, account: AccountId) -> Result<()> {
        lock(&self.inner.accept_calls).push(account);
        Ok(())
    }

    async fn sever_relationship(&self, account: AccountId) -> Result<()> {
        lock(&self.inner.sever_calls).push(account);
        // idempotent: severing an absent relationship is a no-op
        if !lock(&self.inner.relationships).remove(&account) {
            debug!(%account, "sever for a relationship that no longer exists");
        }
        Ok(())
    }
}

async fn play(
    batch: Vec<ScriptedEvent>,
    sender: mpsc::Sender<TransportEvent>,
    inner: Arc<Inner>,
) {
    for step in batch {
        match step {
            ScriptedEvent::Online { account } => {
                if sender.send(TransportEvent::Online { account }).await.is_err() {
                    return;
                }
            }
            ScriptedEvent::GuardCodeRequired { hint } => {
                let (reply, code) = oneshot::channel();
                if sender
                    .send(TransportEvent::GuardCodeRequired { hint, reply })
                    .await
                    .is_err()
                {
                    return;
                }
                match code.await {
                    Ok(code) => lock(&inner.guard_codes).push(code),
                    // the session dropped the request, stop the login replay
                    Err(_) => return,
                }
            }
            ScriptedEvent::ConnectFailed { failure } => {
                if sender
                    .send(TransportEvent::ConnectFailed { failure })
                    .await
                    .is_err()
                {
                    return;
                }
            }
            ScriptedEvent::Disconnected { reason } => {
                if sender
                    .send(TransportEvent::Disconnected { reason })
                    .await
                    .is_err()
                {
                    return;
                }
            }
            ScriptedEvent::Relationship(event) => {
                if sender
                    .send(TransportEvent::Relationship(event))
                    .await
                    .is_err()
                {
                    return;
                }
            }
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().expect("mock transport state poisoned")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> Credentials {
        Credentials {
            account_name: "operator".to_string(),
            password: "pw".to_string(),
        }
    }

    #[tokio::test]
    async fn test_playback_preserves_script_order() {
        let transport = MockTransport::new(vec![vec![
            ScriptedEvent::Online {
                account: AccountId::new(1),
            },
            ScriptedEvent::Relationship(RelationshipEvent::new(
                AccountId::new(2),
                RelationshipKind::RequestRecipient,
            )),
        ]]);
        let mut events = transport.subscribe();
        transport.connect(&credentials()).await.unwrap();

        assert!(matches!(
            events.recv().await,
            Some(TransportEvent::Online { .. })
        ));
        assert!(matches!(
            events.recv().await,
            Some(TransportEvent::Relationship(_))
        ));
        assert_eq!(transport.connect_calls(), 1);
    }

    #[tokio::test]
    async fn test_sever_is_idempotent() {
        let account = AccountId::new(42);
        let transport = MockTransport::new(vec![]).with_relationship(account);
        let _events = transport.subscribe();

        transport.sever_relationship(account).await.unwrap();
        assert!(!transport.relationship_exists(account));

        // second sever: still Ok, still gone, nothing else changes
        transport.sever_relationship(account).await.unwrap();
        assert!(!transport.relationship_exists(account));
        assert_eq!(transport.sever_calls(), vec![account, account]);
    }

    #[tokio::test]
    async fn test_guard_code_round_trip() {
        let transport = MockTransport::new(vec![vec![
            ScriptedEvent::GuardCodeRequired {
                hint: Some("example.com".to_string()),
            },
            ScriptedEvent::Online {
                account: AccountId::new(1),
            },
        ]]);
        let mut events = transport.subscribe();
        transport.connect(&credentials()).await.unwrap();

        match events.recv().await {
            Some(TransportEvent::GuardCodeRequired { hint, reply }) => {
                assert_eq!(hint.as_deref(), Some("example.com"));
                reply.send(GuardCode::new("R2D2X")).unwrap();
            }
            other => panic!("expected a guard code demand, got {:?}", other),
        }

        assert!(matches!(
            events.recv().await,
            Some(TransportEvent::Online { .. })
        ));
        assert_eq!(transport.guard_codes(), vec![GuardCode::new("R2D2X")]);
    }

    #[tokio::test]
    async fn test_sign_off_is_acknowledged() {
        let transport = MockTransport::new(vec![]);
        let mut events = transport.subscribe();
        transport.sign_off().await.unwrap();

        assert!(matches!(
            events.recv().await,
            Some(TransportEvent::Disconnected { .. })
        ));
        assert_eq!(transport.sign_off_calls(), 1);
    }
}
