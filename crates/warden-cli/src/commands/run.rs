//! The long-running agent: session manager + policy engine wiring.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use warden_core::policy::RelationshipPolicy;
use warden_core::session::SessionManager;
use warden_core::transport::NetworkTransport;
use warden_infrastructure::ProfileVisibilityChecker;
use warden_interaction::TerminalGuardPrompt;
use warden_transport_mock::{MOCK_TRANSPORT_ID, MockTransport};
use warden_types::ShutdownKind;

use crate::commands::{load_config, load_secrets};

pub async fn execute(
    config_path: Option<PathBuf>,
    transport_override: Option<String>,
) -> Result<ExitCode> {
    let config = load_config(config_path)?;
    let secrets = load_secrets()?;
    let credentials = secrets
        .account
        .context("no account credentials configured; add an \"account\" entry to secret.json")?;

    let provider = transport_override.unwrap_or_else(|| config.transport.provider.clone());
    let transport = create_transport(&provider)?;
    info!(provider = %provider, "starting the relationship warden");

    let probe = Arc::new(ProfileVisibilityChecker::new(config.visibility.clone())?);
    let prompt = Arc::new(TerminalGuardPrompt::new());
    let shutdown = CancellationToken::new();
    spawn_signal_listener(shutdown.clone());

    let (relationship_tx, relationship_rx) = mpsc::channel(64);
    let manager = SessionManager::new(
        transport,
        prompt,
        credentials,
        config.session.clone(),
        shutdown.clone(),
        relationship_tx,
    );
    let policy = Arc::new(RelationshipPolicy::new(
        probe,
        manager.handle(),
        shutdown.clone(),
    ));
    let policy_task = tokio::spawn(policy.run(relationship_rx));

    let outcome = manager.run().await?;
    // the manager owned the last relationship sender, so the policy loop
    // ends with it
    let _ = policy_task.await;

    match outcome {
        ShutdownKind::Clean => Ok(ExitCode::SUCCESS),
        ShutdownKind::Forced => Ok(ExitCode::from(1)),
    }
}

fn create_transport(provider: &str) -> Result<Arc<dyn NetworkTransport>> {
    match provider {
        MOCK_TRANSPORT_ID => Ok(Arc::new(MockTransport::default())),
        other => bail!(
            "unknown transport provider {other:?} (available: {MOCK_TRANSPORT_ID}); \
             vendor transports plug in through the warden-core NetworkTransport trait"
        ),
    }
}

fn spawn_signal_listener(shutdown: CancellationToken) {
    tokio::spawn(async move {
        wait_for_termination().await;
        info!("termination signal received, shutting down");
        shutdown.cancel();
    });
}

#[cfg(unix)]
async fn wait_for_termination() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut terminate) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = terminate.recv() => {}
            }
        }
        Err(err) => {
            warn!("cannot listen for SIGTERM ({err}), handling ctrl-c only");
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_termination() {
    let _ = tokio::signal::ctrl_c().await;
}
