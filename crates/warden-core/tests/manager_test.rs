use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use warden_transport_mock::{MockTransport, ScriptedEvent};
use warden_types::{
    AccountId, ConnectFailure, Credentials, GuardCode, RelationshipEvent, RelationshipKind,
    ShutdownKind,
};

use warden_core::config::SessionSettings;
use warden_core::error::{Result, WardenError};
use warden_core::guard::GuardCodePrompt;
use warden_core::session::SessionManager;

struct StaticPrompt(&'static str);

#[async_trait]
impl GuardCodePrompt for StaticPrompt {
    async fn request_code(&self, _hint: Option<&str>) -> Result<GuardCode> {
        Ok(GuardCode::new(self.0))
    }
}

fn credentials() -> Credentials {
    Credentials {
        account_name: "operator".to_string(),
        password: "pw".to_string(),
    }
}

fn online(raw: u64) -> ScriptedEvent {
    ScriptedEvent::Online {
        account: AccountId::new(raw),
    }
}

fn relationship(raw: u64, kind: RelationshipKind) -> ScriptedEvent {
    ScriptedEvent::Relationship(RelationshipEvent::new(AccountId::new(raw), kind))
}

fn manager_with(
    transport: &MockTransport,
    settings: SessionSettings,
    shutdown: CancellationToken,
) -> (SessionManager, mpsc::Receiver<RelationshipEvent>) {
    let (tx, rx) = mpsc::channel(32);
    let manager = SessionManager::new(
        Arc::new(transport.clone()),
        Arc::new(StaticPrompt("R2D2X")),
        credentials(),
        settings,
        shutdown,
        tx,
    );
    (manager, rx)
}

#[tokio::test(start_paused = true)]
async fn test_clean_shutdown_with_acknowledged_sign_off() {
    let transport = MockTransport::new(vec![vec![online(10)]]);
    let shutdown = CancellationToken::new();
    let (manager, _relationships) =
        manager_with(&transport, SessionSettings::default(), shutdown.clone());
    let run = tokio::spawn(manager.run());

    sleep(Duration::from_millis(10)).await;
    assert_eq!(transport.connect_calls(), 1);
    assert_eq!(transport.presence_calls(), 1, "presence announced after login");

    shutdown.cancel();
    let outcome = run.await.unwrap().unwrap();
    assert_eq!(outcome, ShutdownKind::Clean);
    assert_eq!(transport.sign_off_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_forced_shutdown_when_sign_off_is_never_acknowledged() {
    let transport = MockTransport::without_sign_off_ack(vec![vec![online(10)]]);
    let shutdown = CancellationToken::new();
    let (manager, _relationships) =
        manager_with(&transport, SessionSettings::default(), shutdown.clone());
    let run = tokio::spawn(manager.run());

    sleep(Duration::from_millis(10)).await;
    shutdown.cancel();

    let outcome = run.await.unwrap().unwrap();
    assert_eq!(outcome, ShutdownKind::Forced);
    assert_eq!(transport.sign_off_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_unreachable_network_retries_after_full_backoff_not_sooner() {
    let transport = MockTransport::new(vec![
        vec![ScriptedEvent::ConnectFailed {
            failure: ConnectFailure::NetworkUnreachable,
        }],
        vec![online(10)],
    ]);
    let shutdown = CancellationToken::new();
    let (manager, _relationships) =
        manager_with(&transport, SessionSettings::default(), shutdown.clone());
    let _run = tokio::spawn(manager.run());

    sleep(Duration::from_millis(10)).await;
    assert_eq!(transport.connect_calls(), 1);

    // 59s in: the 60s backoff has not elapsed yet
    sleep(Duration::from_secs(59)).await;
    assert_eq!(transport.connect_calls(), 1);

    sleep(Duration::from_secs(2)).await;
    assert_eq!(transport.connect_calls(), 2);
    assert_eq!(transport.presence_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_unsolicited_disconnect_reconnects_after_resume_backoff() {
    let transport = MockTransport::new(vec![
        vec![
            online(10),
            ScriptedEvent::Disconnected {
                reason: Some("connection lost".to_string()),
            },
        ],
        vec![online(10)],
    ]);
    let shutdown = CancellationToken::new();
    let (manager, _relationships) =
        manager_with(&transport, SessionSettings::default(), shutdown.clone());
    let _run = tokio::spawn(manager.run());

    sleep(Duration::from_millis(10)).await;
    assert_eq!(transport.connect_calls(), 1);

    sleep(Duration::from_secs(29)).await;
    assert_eq!(transport.connect_calls(), 1);

    sleep(Duration::from_secs(2)).await;
    assert_eq!(transport.connect_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_no_reconnect_after_shutdown_even_when_disconnected_arrives() {
    let transport = MockTransport::new(vec![vec![online(10)]]);
    let shutdown = CancellationToken::new();
    let (manager, _relationships) =
        manager_with(&transport, SessionSettings::default(), shutdown.clone());
    let run = tokio::spawn(manager.run());

    sleep(Duration::from_millis(10)).await;
    shutdown.cancel();

    // the sign-off acknowledgement is a Disconnected notification; it must
    // end the session, not restart it
    let outcome = run.await.unwrap().unwrap();
    assert_eq!(outcome, ShutdownKind::Clean);

    sleep(Duration::from_secs(120)).await;
    assert_eq!(transport.connect_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_pending_reconnect_is_cancelled_by_shutdown() {
    let transport = MockTransport::new(vec![vec![ScriptedEvent::ConnectFailed {
        failure: ConnectFailure::NetworkUnreachable,
    }]]);
    let shutdown = CancellationToken::new();
    let (manager, _relationships) =
        manager_with(&transport, SessionSettings::default(), shutdown.clone());
    let run = tokio::spawn(manager.run());

    // a 60s retry is now armed; shut down before it fires
    sleep(Duration::from_millis(10)).await;
    shutdown.cancel();
    let outcome = run.await.unwrap().unwrap();
    assert_eq!(outcome, ShutdownKind::Clean);

    sleep(Duration::from_secs(120)).await;
    assert_eq!(transport.connect_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_guard_code_is_prompted_and_fed_back_to_the_transport() {
    let transport = MockTransport::new(vec![vec![
        ScriptedEvent::GuardCodeRequired {
            hint: Some("example.com".to_string()),
        },
        online(10),
    ]]);
    let shutdown = CancellationToken::new();
    let (manager, _relationships) =
        manager_with(&transport, SessionSettings::default(), shutdown.clone());
    let run = tokio::spawn(manager.run());

    sleep(Duration::from_millis(10)).await;
    assert_eq!(transport.guard_codes(), vec![GuardCode::new("R2D2X")]);
    assert_eq!(transport.presence_calls(), 1, "login resumed after the code");

    shutdown.cancel();
    assert_eq!(run.await.unwrap().unwrap(), ShutdownKind::Clean);
}

#[tokio::test(start_paused = true)]
async fn test_guard_code_demand_is_fatal_when_prompting_is_disabled() {
    let transport = MockTransport::new(vec![vec![ScriptedEvent::GuardCodeRequired {
        hint: None,
    }]]);
    let settings = SessionSettings {
        interactive_guard: false,
        ..SessionSettings::default()
    };
    let shutdown = CancellationToken::new();
    let (manager, _relationships) = manager_with(&transport, settings, shutdown);

    let err = manager.run().await.unwrap_err();
    assert!(matches!(err, WardenError::Authentication(_)));
}

#[tokio::test(start_paused = true)]
async fn test_invalid_credentials_stop_the_session_without_retry() {
    let transport = MockTransport::new(vec![vec![ScriptedEvent::ConnectFailed {
        failure: ConnectFailure::InvalidCredentials,
    }]]);
    let shutdown = CancellationToken::new();
    let (manager, _relationships) =
        manager_with(&transport, SessionSettings::default(), shutdown);
    let run = tokio::spawn(manager.run());

    sleep(Duration::from_secs(120)).await;
    let err = run.await.unwrap().unwrap_err();
    assert!(err.is_fatal());
    assert_eq!(transport.connect_calls(), 1, "fatal failures are not retried");
}

#[tokio::test(start_paused = true)]
async fn test_relationship_events_are_forwarded_in_delivery_order() {
    let transport = MockTransport::new(vec![vec![
        online(10),
        relationship(1, RelationshipKind::RequestRecipient),
        relationship(2, RelationshipKind::Friend),
        relationship(3, RelationshipKind::RequestRecipient),
    ]]);
    let shutdown = CancellationToken::new();
    let (manager, mut relationships) =
        manager_with(&transport, SessionSettings::default(), shutdown.clone());
    let _run = tokio::spawn(manager.run());

    let mut seen = Vec::new();
    for _ in 0..3 {
        seen.push(relationships.recv().await.unwrap());
    }
    assert_eq!(
        seen,
        vec![
            RelationshipEvent::new(AccountId::new(1), RelationshipKind::RequestRecipient),
            RelationshipEvent::new(AccountId::new(2), RelationshipKind::Friend),
            RelationshipEvent::new(AccountId::new(3), RelationshipKind::RequestRecipient),
        ]
    );
}
