//! Bot handlers module
//!
//! Command handlers react to incoming messages. They are discovered through
//! the registry in [`registry`] and routed through a [`HandlerSet`]:
//! - `registry` loads handler modules with per-module isolation
//! - `terminal` holds the built-in handler modules

pub mod registry;
pub mod terminal;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error};

use crate::config::GreetingConfig;
use crate::i18n::I18n;
use crate::models::{IncomingMessage, UserInfo};
use crate::services::{ChatClient, WelcomeService};
use crate::state::SessionManager;
use crate::utils::errors::Result;

pub use registry::{HandlerLoader, HandlerModule, LoadReport, ModuleExports};

/// A unit of logic registered with the chat client
#[async_trait]
pub trait CommandHandler: Send + Sync {
    fn name(&self) -> &str;

    /// Cheap, synchronous routing check
    fn matches(&self, message: &IncomingMessage) -> bool;

    /// Second routing check for handlers that depend on stored session
    /// state; only consulted after `matches` succeeds.
    async fn accepts(&self, _ctx: &HandlerContext, _message: &IncomingMessage) -> Result<bool> {
        Ok(true)
    }

    async fn handle(&self, ctx: &HandlerContext, message: &IncomingMessage) -> Result<()>;
}

/// Everything a handler may call into
#[derive(Clone)]
pub struct HandlerContext {
    pub sessions: Arc<SessionManager>,
    pub i18n: Arc<I18n>,
    pub welcome: WelcomeService,
    pub client: Arc<dyn ChatClient>,
    /// Where completed feedback is forwarded
    pub feedback_chat_id: Option<i64>,
}

impl HandlerContext {
    pub fn new(
        sessions: Arc<SessionManager>,
        i18n: Arc<I18n>,
        greeting: GreetingConfig,
        client: Arc<dyn ChatClient>,
    ) -> Self {
        let welcome = WelcomeService::new(Arc::clone(&sessions), Arc::clone(&i18n), greeting);
        Self {
            sessions,
            i18n,
            welcome,
            client,
            feedback_chat_id: None,
        }
    }

    pub fn with_feedback_chat(mut self, chat_id: Option<i64>) -> Self {
        self.feedback_chat_id = chat_id;
        self
    }

    /// Derive the sender's user info; `None` when the sender is unknown
    pub fn user_info(&self, message: &IncomingMessage) -> Result<Option<UserInfo>> {
        UserInfo::extract(message, &self.i18n, self.sessions.logger())
    }
}

/// Ordered set of loaded handlers
#[derive(Clone, Default)]
pub struct HandlerSet {
    handlers: Vec<Arc<dyn CommandHandler>>,
}

impl HandlerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, handler: Arc<dyn CommandHandler>) {
        self.handlers.push(handler);
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }

    /// Run the first handler that matches and accepts. Returns its name, or
    /// `None` when nothing matched.
    pub async fn dispatch(&self, ctx: &HandlerContext, message: &IncomingMessage) -> Result<Option<&str>> {
        let Some(handler) = self.select(ctx, message).await? else {
            debug!(chat_id = message.chat_id, "No handler matched message");
            return Ok(None);
        };

        debug!(chat_id = message.chat_id, handler = handler.name(), "Dispatching message");
        handler.handle(ctx, message).await.map_err(|e| {
            error!(handler = handler.name(), chat_id = message.chat_id, error = %e, "Handler failed");
            e
        })?;

        Ok(Some(handler.name()))
    }

    async fn select(&self, ctx: &HandlerContext, message: &IncomingMessage) -> Result<Option<&Arc<dyn CommandHandler>>> {
        for handler in self.handlers.iter().filter(|h| h.matches(message)) {
            if handler.accepts(ctx, message).await? {
                return Ok(Some(handler));
            }
        }
        Ok(None)
    }
}

impl std::fmt::Debug for HandlerSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerSet")
            .field("handlers", &self.names())
            .finish()
    }
}
