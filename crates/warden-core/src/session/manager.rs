//! The session manager.
//!
//! Owns the authenticated connection: one dispatch loop consumes transport
//! events, handle commands and the shutdown token, drives the connection
//! state machine
//! `Disconnected -> Connecting -> {AwaitingGuardCode -> Connecting} -> Online`,
//! and schedules reconnects with fixed backoffs. `Failed` is terminal and
//! reachable only through non-retryable login failures.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use warden_types::{ConnectionState, Credentials, RelationshipEvent, ShutdownKind};

use crate::config::SessionSettings;
use crate::error::{Result, WardenError};
use crate::guard::GuardCodePrompt;
use crate::session::handle::{SessionCommand, SessionHandle};
use crate::transport::{NetworkTransport, TransportEvent};

pub struct SessionManager {
    transport: Arc<dyn NetworkTransport>,
    guard_prompt: Arc<dyn GuardCodePrompt>,
    credentials: Credentials,
    settings: SessionSettings,
    /// Cancelled exactly once, by the shutdown path. Every retry decision
    /// reads it; no retry fires after it flips.
    shutdown: CancellationToken,
    relationships: mpsc::Sender<RelationshipEvent>,
    commands_tx: mpsc::Sender<SessionCommand>,
    commands_rx: Option<mpsc::Receiver<SessionCommand>>,
    state: ConnectionState,
    retry_attempts: u32,
}

impl SessionManager {
    pub fn new(
        transport: Arc<dyn NetworkTransport>,
        guard_prompt: Arc<dyn GuardCodePrompt>,
        credentials: Credentials,
        settings: SessionSettings,
        shutdown: CancellationToken,
        relationships: mpsc::Sender<RelationshipEvent>,
    ) -> Self {
        let (commands_tx, commands_rx) = mpsc::channel(32);
        Self {
            transport,
            guard_prompt,
            credentials,
            settings,
            shutdown,
            relationships,
            commands_tx,
            commands_rx: Some(commands_rx),
            state: ConnectionState::Disconnected,
            retry_attempts: 0,
        }
    }

    /// Returns a handle for issuing relationship actions through this
    /// manager's dispatch loop.
    pub fn handle(&self) -> SessionHandle {
        SessionHandle::new(self.commands_tx.clone())
    }

    /// Runs the session until shutdown or a fatal error.
    ///
    /// # Returns
    ///
    /// * `Ok(ShutdownKind::Clean)` - the sign-off was acknowledged in time
    /// * `Ok(ShutdownKind::Forced)` - the grace timer fired first
    ///
    /// # Errors
    ///
    /// Returns an error for non-retryable failures (bad credentials, rate
    /// limiting, a misbehaving transport).
    pub async fn run(mut self) -> Result<ShutdownKind> {
        let mut events = self.transport.subscribe();
        let mut commands = self
            .commands_rx
            .take()
            .ok_or_else(|| WardenError::internal("session manager started twice"))?;
        let shutdown = self.shutdown.clone();

        self.begin_connect().await?;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                event = events.recv() => match event {
                    Some(event) => self.handle_event(event).await?,
                    None => {
                        return Err(WardenError::transport(
                            "the transport event stream closed unexpectedly",
                        ));
                    }
                },
                command = commands.recv() => {
                    if let Some(command) = command {
                        self.handle_command(command).await?;
                    }
                }
            }
        }

        self.drain(&mut events).await
    }

    async fn begin_connect(&mut self) -> Result<()> {
        self.transition(ConnectionState::Connecting);
        info!(
            account = %self.credentials.account_name,
            "attempting to log in to the network"
        );
        self.transport.connect(&self.credentials).await
    }

    async fn handle_event(&mut self, event: TransportEvent) -> Result<()> {
        match event {
            TransportEvent::Online { account } => {
                self.transition(ConnectionState::Online);
                self.retry_attempts = 0;
                info!(%account, "logged in, watching relationship events");
                if let Err(err) = self.transport.announce_presence().await {
                    warn!("failed to announce presence: {err}");
                }
            }
            TransportEvent::GuardCodeRequired { hint, reply } => {
                self.transition(ConnectionState::AwaitingGuardCode);
                if !self.settings.interactive_guard {
                    self.transition(ConnectionState::Failed);
                    return Err(WardenError::authentication(
                        "a guard code is required but the interactive prompt is disabled",
                    ));
                }
                // The login sequence is suspended until the operator answers,
                // so awaiting here pauses session progress on purpose.
                let code = match self.guard_prompt.request_code(hint.as_deref()).await {
                    Ok(code) => code,
                    Err(err) => {
                        if self.shutdown.is_cancelled() {
                            debug!("guard code prompt interrupted by shutdown");
                            return Ok(());
                        }
                        self.transition(ConnectionState::Failed);
                        return Err(err);
                    }
                };
                if reply.send(code).is_err() {
                    warn!("the transport dropped its guard code request");
                }
                self.transition(ConnectionState::Connecting);
            }
            TransportEvent::ConnectFailed { failure } => {
                if failure.is_retryable() {
                    self.transition(ConnectionState::Disconnected);
                    let backoff = self.settings.reconnect_backoff();
                    warn!(
                        "cannot connect: {failure}; retrying in {}s",
                        backoff.as_secs()
                    );
                    self.schedule_reconnect(backoff);
                } else {
                    self.transition(ConnectionState::Failed);
                    error!("login failed permanently: {failure}");
                    return Err(failure.into());
                }
            }
            TransportEvent::Disconnected { reason } => {
                self.transition(ConnectionState::Disconnected);
                let backoff = self.settings.resume_backoff();
                info!(
                    "disconnected from the network ({}); reconnecting in {}s",
                    reason.as_deref().unwrap_or("no reason given"),
                    backoff.as_secs()
                );
                self.schedule_reconnect(backoff);
            }
            TransportEvent::Relationship(event) => {
                // Forwarded in delivery order; the policy engine decides.
                if self.relationships.send(event).await.is_err() {
                    warn!("relationship consumer is gone, discarding event");
                }
            }
        }
        Ok(())
    }

    async fn handle_command(&mut self, command: SessionCommand) -> Result<()> {
        match command {
            SessionCommand::Reconnect => {
                if self.shutdown.is_cancelled() {
                    return Ok(());
                }
                // connect is idempotent while a login is already in flight
                if matches!(
                    self.state,
                    ConnectionState::Connecting
                        | ConnectionState::AwaitingGuardCode
                        | ConnectionState::Online
                ) {
                    debug!(state = %self.state, "dropping stale reconnect");
                    return Ok(());
                }
                self.retry_attempts += 1;
                debug!(attempt = self.retry_attempts, "reconnecting");
                self.begin_connect().await?;
            }
            SessionCommand::AcceptRequest(account) => {
                info!(%account, "accepting friend request");
                if let Err(err) = self.transport.accept_request(account).await {
                    warn!(%account, "failed to accept request: {err}");
                }
            }
            SessionCommand::SeverRelationship(account) => {
                info!(%account, "severing relationship");
                if let Err(err) = self.transport.sever_relationship(account).await {
                    warn!(%account, "failed to sever relationship: {err}");
                }
            }
        }
        Ok(())
    }

    /// Arms a reconnect unless shutdown already began. The delay also aborts
    /// the moment the token flips, so a pending retry can never outlive the
    /// session.
    fn schedule_reconnect(&self, delay: Duration) {
        if self.shutdown.is_cancelled() {
            debug!("shutdown in progress, not scheduling a reconnect");
            return;
        }
        let commands = self.commands_tx.clone();
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = shutdown.cancelled() => {}
                _ = time::sleep(delay) => {
                    let _ = commands.send(SessionCommand::Reconnect).await;
                }
            }
        });
    }

    /// The shutdown path: request a graceful sign-off, then race the
    /// acknowledgement against the grace timer.
    async fn drain(
        &mut self,
        events: &mut mpsc::Receiver<TransportEvent>,
    ) -> Result<ShutdownKind> {
        info!("shutting down, requesting sign-off");
        if let Err(err) = self.transport.sign_off().await {
            warn!("sign-off request failed: {err}");
        }

        let grace = self.settings.sign_off_grace();
        let outcome = match time::timeout(grace, await_disconnect_ack(events)).await {
            Ok(_acknowledged) => {
                info!("signed off from the network");
                ShutdownKind::Clean
            }
            Err(_elapsed) => {
                warn!(
                    "no sign-off acknowledgement within {}s, forcing disconnect",
                    grace.as_secs()
                );
                ShutdownKind::Forced
            }
        };
        self.transition(ConnectionState::Disconnected);
        Ok(outcome)
    }

    fn transition(&mut self, next: ConnectionState) {
        if self.state == next {
            return;
        }
        debug!(from = %self.state, to = %next, "connection state changed");
        self.state = next;
    }
}

/// Waits for the transport to acknowledge the sign-off. Events other than
/// `Disconnected` arriving during the drain are dropped; in particular no
/// reconnect is ever scheduled here. A closed stream counts as acknowledged,
/// since the transport is already gone.
async fn await_disconnect_ack(events: &mut mpsc::Receiver<TransportEvent>) -> bool {
    while let Some(event) = events.recv().await {
        match event {
            TransportEvent::Disconnected { .. } => return true,
            other => debug!(?other, "dropping event during sign-off"),
        }
    }
    false
}
