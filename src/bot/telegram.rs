//! Telegram connection and update dispatch
//!
//! `TelegramConnector` builds and initializes the Bot API client;
//! `TelegramSession` runs a teloxide dispatcher that routes every incoming
//! message through the loaded [`HandlerSet`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use teloxide::dispatching::{ShutdownToken, UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::Update;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::{BotConfig, GreetingConfig};
use crate::handlers::{HandlerContext, HandlerSet};
use crate::i18n::I18n;
use crate::models::IncomingMessage;
use crate::services::TelegramClient;
use crate::state::SessionManager;
use crate::utils::errors::{MiniBotError, Result};
use super::supervisor::{BotSession, Connector};

type HandlerResult = std::result::Result<(), Box<dyn std::error::Error + Send + Sync + 'static>>;

/// How long `stop` waits for the dispatcher to drain
const DISPATCHER_STOP_TIMEOUT: Duration = Duration::from_secs(10);

const SHUTDOWN_POLL_ATTEMPTS: u32 = 100;
const SHUTDOWN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Long-lived services shared by every session
#[derive(Debug, Clone)]
pub struct AppServices {
    pub sessions: Arc<SessionManager>,
    pub i18n: Arc<I18n>,
    pub greeting: GreetingConfig,
    pub feedback_chat_id: Option<i64>,
}

/// Connects to the Telegram Bot API
#[derive(Debug, Clone)]
pub struct TelegramConnector {
    config: BotConfig,
    services: AppServices,
}

impl TelegramConnector {
    pub fn new(config: BotConfig, services: AppServices) -> Self {
        Self { config, services }
    }

    /// Build a Bot with the configured timeouts and API endpoint
    pub fn build_bot(&self) -> Result<Bot> {
        let client = teloxide::net::default_reqwest_settings()
            .connect_timeout(Duration::from_secs(self.config.connect_timeout_secs))
            .timeout(Duration::from_secs(self.config.request_timeout_secs))
            .build()
            .map_err(|e| MiniBotError::Config(format!("Failed to build HTTP client: {}", e)))?;

        let mut bot = Bot::with_client(&self.config.token, client);
        if let Some(api_url) = &self.config.api_url {
            bot = bot.set_api_url(Url::parse(api_url)?);
        }

        Ok(bot)
    }
}

#[async_trait]
impl Connector for TelegramConnector {
    type Session = TelegramSession;

    async fn connect(&self) -> Result<TelegramSession> {
        let bot = self.build_bot()?;

        let me = bot.get_me().await?;
        info!(bot_id = me.id.0, username = ?me.username, "Bot client initialized");

        // Polling and webhooks are mutually exclusive
        bot.delete_webhook().await?;
        debug!("Webhook cleared, event stream ready");

        Ok(TelegramSession::new(bot, self.services.clone()))
    }
}

/// A connected bot and its running dispatcher
pub struct TelegramSession {
    bot: Bot,
    services: AppServices,
    shutdown_token: Option<ShutdownToken>,
    dispatcher: Option<JoinHandle<()>>,
}

impl TelegramSession {
    fn new(bot: Bot, services: AppServices) -> Self {
        Self {
            bot,
            services,
            shutdown_token: None,
            dispatcher: None,
        }
    }

    pub fn bot(&self) -> &Bot {
        &self.bot
    }

    pub fn is_dispatching(&self) -> bool {
        self.dispatcher.as_ref().is_some_and(|handle| !handle.is_finished())
    }
}

impl std::fmt::Debug for TelegramSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramSession")
            .field("dispatching", &self.is_dispatching())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl BotSession for TelegramSession {
    async fn start(&mut self, handlers: HandlerSet) -> Result<()> {
        if self.dispatcher.is_some() {
            return Err(MiniBotError::InvalidInput("dispatcher already running".to_string()));
        }

        let client = Arc::new(TelegramClient::new(self.bot.clone()));
        let ctx = HandlerContext::new(
            Arc::clone(&self.services.sessions),
            Arc::clone(&self.services.i18n),
            self.services.greeting.clone(),
            client,
        )
        .with_feedback_chat(self.services.feedback_chat_id);

        info!(handlers = ?handlers.names(), "Starting update dispatcher");

        let mut dispatcher = Dispatcher::builder(self.bot.clone(), create_handler())
            .dependencies(dptree::deps![Arc::new(handlers), Arc::new(ctx)])
            .default_handler(|upd| async move {
                debug!("Unhandled update: {:?}", upd.id);
            })
            .build();

        self.shutdown_token = Some(dispatcher.shutdown_token());
        self.dispatcher = Some(tokio::spawn(async move {
            dispatcher.dispatch().await;
        }));

        Ok(())
    }

    async fn stop_intake(&mut self) -> Result<()> {
        let Some(token) = self.shutdown_token.take() else {
            return Ok(());
        };

        // A freshly spawned dispatcher reports idle until it starts polling
        for _ in 0..SHUTDOWN_POLL_ATTEMPTS {
            match token.shutdown() {
                Ok(stopped) => {
                    tokio::time::timeout(DISPATCHER_STOP_TIMEOUT, stopped)
                        .await
                        .map_err(|_| MiniBotError::Timeout("update intake did not stop in time".to_string()))?;
                    info!("Update intake stopped");
                    return Ok(());
                }
                Err(_) if self.is_dispatching() => {
                    tokio::time::sleep(SHUTDOWN_POLL_INTERVAL).await;
                }
                Err(_) => {
                    debug!("Dispatcher was idle, nothing to stop");
                    return Ok(());
                }
            }
        }

        Err(MiniBotError::Timeout("dispatcher never became ready to stop".to_string()))
    }

    async fn stop(&mut self) -> Result<()> {
        let Some(mut handle) = self.dispatcher.take() else {
            return Ok(());
        };

        match tokio::time::timeout(DISPATCHER_STOP_TIMEOUT, &mut handle).await {
            Ok(joined) => {
                joined.map_err(std::io::Error::from)?;
                info!("Dispatcher stopped");
                Ok(())
            }
            Err(_) => {
                // Left for release to abort
                self.dispatcher = Some(handle);
                Err(MiniBotError::Timeout("dispatcher did not stop in time".to_string()))
            }
        }
    }

    async fn release(&mut self) -> Result<()> {
        if let Some(handle) = self.dispatcher.take() {
            handle.abort();
            warn!("Dispatcher task aborted");
        }
        self.shutdown_token = None;

        debug!("Telegram session released");
        Ok(())
    }
}

fn create_handler() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    Update::filter_message().endpoint(route_message)
}

async fn route_message(msg: Message, handlers: Arc<HandlerSet>, ctx: Arc<HandlerContext>) -> HandlerResult {
    let incoming = IncomingMessage::from(&msg);
    handlers.dispatch(&ctx, &incoming).await?;
    Ok(())
}
