//! Startup supervisor
//!
//! Drives the bot process through
//! `Idle -> Connecting -> Connected -> Running -> ShuttingDown -> Stopped`,
//! with `Failed` as the absorbing state after a fatal startup error.
//!
//! Transient connection failures are retried with exponential backoff
//! (`base_delay * 2^attempt`) up to `max_retries` attempts; anything else
//! fails immediately. Teardown always runs all of its steps and only logs
//! their errors.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::config::SupervisorConfig;
use crate::handlers::{HandlerLoader, HandlerSet};
use crate::utils::dedup::DedupLogger;
use crate::utils::errors::{MiniBotError, Result};

/// Lifecycle state of the supervised bot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Idle,
    Connecting,
    Connected,
    Running,
    ShuttingDown,
    Stopped,
    Failed,
}

impl SupervisorState {
    pub fn can_transition_to(self, next: SupervisorState) -> bool {
        use SupervisorState::*;
        matches!(
            (self, next),
            (Idle, Connecting)
                | (Connecting, Connecting)
                | (Connecting, Connected)
                | (Connecting, Failed)
                | (Connected, Running)
                | (Connected, Failed)
                | (Running, ShuttingDown)
                | (ShuttingDown, Stopped)
        )
    }
}

impl fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Establishes a live bot connection
#[async_trait]
pub trait Connector: Send + Sync {
    type Session: BotSession;

    /// Build the client, initialize it and open the event stream
    async fn connect(&self) -> Result<Self::Session>;
}

/// A connected bot that can run handlers and be torn down
#[async_trait]
pub trait BotSession: Send {
    /// Attach the handlers and start consuming events
    async fn start(&mut self, handlers: HandlerSet) -> Result<()>;

    /// Stop accepting new events
    async fn stop_intake(&mut self) -> Result<()>;

    /// Stop the running application
    async fn stop(&mut self) -> Result<()>;

    /// Release whatever the session still holds
    async fn release(&mut self) -> Result<()>;
}

/// Supervises startup, the idle loop and shutdown
#[derive(Debug)]
pub struct StartupSupervisor {
    config: SupervisorConfig,
    loader: HandlerLoader,
    log: Arc<DedupLogger>,
    state: SupervisorState,
    attempts: u32,
}

impl StartupSupervisor {
    pub fn new(config: SupervisorConfig, loader: HandlerLoader, log: Arc<DedupLogger>) -> Self {
        Self {
            config,
            loader,
            log,
            state: SupervisorState::Idle,
            attempts: 0,
        }
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    /// Connection attempts made so far
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Delay before retrying after the zero-based `attempt` failed
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.config.base_delay().saturating_mul(factor)
    }

    /// Start the bot, idle until `shutdown` resolves, then tear down
    pub async fn run_until<C, F>(&mut self, connector: &C, shutdown: F) -> Result<()>
    where
        C: Connector,
        F: Future<Output = ()>,
    {
        let mut session = self.start(connector).await?;
        self.idle_until(shutdown).await;
        self.shutdown(&mut session).await;
        Ok(())
    }

    /// Load handlers once, connect with retries and start the session
    pub async fn start<C: Connector>(&mut self, connector: &C) -> Result<C::Session> {
        self.transition(SupervisorState::Connecting)?;

        let report = self.loader.load();
        let mut session = self.connect(connector).await?;

        if let Err(e) = session.start(report.handlers).await {
            error!(error = %e, "Failed to start event processing");
            self.transition(SupervisorState::Failed)?;
            if let Err(release_err) = session.release().await {
                warn!(error = %release_err, "Failed to release session after start failure");
            }
            return Err(e);
        }

        self.transition(SupervisorState::Running)?;
        self.log.log("MiniBot is running");
        Ok(session)
    }

    async fn connect<C: Connector>(&mut self, connector: &C) -> Result<C::Session> {
        let max_attempts = self.config.max_retries;
        let mut attempt = 0;

        loop {
            self.attempts = attempt + 1;
            debug!(attempt = self.attempts, max_attempts = max_attempts, "Connecting");

            match connector.connect().await {
                Ok(session) => {
                    self.transition(SupervisorState::Connected)?;
                    info!(attempt = self.attempts, "Connected");
                    return Ok(session);
                }
                Err(e) if e.is_transient() => {
                    if self.attempts >= max_attempts {
                        error!(attempts = self.attempts, error = %e, "All connection attempts failed");
                        self.transition(SupervisorState::Failed)?;
                        return Err(MiniBotError::RetriesExhausted {
                            attempts: self.attempts,
                            source: Box::new(e),
                        });
                    }

                    let delay = self.backoff_delay(attempt);
                    self.log.warn(format!(
                        "Connection error: {}. Retrying in {} seconds...",
                        e,
                        delay.as_secs()
                    ));
                    tokio::time::sleep(delay).await;

                    attempt += 1;
                    self.transition(SupervisorState::Connecting)?;
                }
                Err(e) => {
                    error!(error = %e, "Unexpected error while starting the bot");
                    self.transition(SupervisorState::Failed)?;
                    return Err(e);
                }
            }
        }
    }

    /// Keep the process alive until the stop signal; no connection probing
    async fn idle_until<F: Future<Output = ()>>(&mut self, shutdown: F) {
        let interval = self.config.liveness_interval();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Stop signal received, stopping MiniBot...");
                    break;
                }
                _ = tokio::time::sleep(interval) => {
                    debug!(interval_secs = interval.as_secs(), "Supervisor alive");
                }
            }
        }
    }

    /// Ordered teardown; every step runs even if an earlier one fails
    pub async fn shutdown<S: BotSession>(&mut self, session: &mut S) {
        if let Err(e) = self.transition(SupervisorState::ShuttingDown) {
            warn!(error = %e, "Shutting down from an unexpected state");
        }

        if let Err(e) = session.stop_intake().await {
            error!(error = %e, "Error while stopping event intake");
        }
        if let Err(e) = session.stop().await {
            error!(error = %e, "Error while stopping the application");
        }
        if let Err(e) = session.release().await {
            error!(error = %e, "Error while releasing resources");
        }

        if let Err(e) = self.transition(SupervisorState::Stopped) {
            warn!(error = %e, "Unexpected state after teardown");
            self.state = SupervisorState::Stopped;
        }
        info!("MiniBot stopped");
    }

    fn transition(&mut self, next: SupervisorState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(MiniBotError::InvalidStateTransition {
                from: self.state.to_string(),
                to: next.to_string(),
            });
        }

        debug!(from = %self.state, to = %next, "Supervisor state change");
        self.state = next;
        Ok(())
    }
}
