//! Outbound chat client
//!
//! The handlers only need two delivery primitives; `TelegramClient` provides
//! them on top of teloxide and folds "the user blocked the bot" into its own
//! error variant so callers can treat it as an ordinary failed delivery.

use std::path::Path;

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::InputFile;
use teloxide::{ApiError, RequestError};
use thiserror::Error;
use tracing::debug;

/// Why a message could not be delivered
#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("recipient has blocked the bot")]
    Blocked,

    #[error("delivery failed: {0}")]
    Failed(String),
}

impl From<RequestError> for DeliveryError {
    fn from(err: RequestError) -> Self {
        match err {
            RequestError::Api(ApiError::BotBlocked) => DeliveryError::Blocked,
            other => DeliveryError::Failed(other.to_string()),
        }
    }
}

/// Delivery primitives used by the handlers
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), DeliveryError>;

    async fn send_file(&self, chat_id: i64, path: &Path, caption: &str) -> Result<(), DeliveryError>;
}

/// Telegram Bot API client
#[derive(Debug, Clone)]
pub struct TelegramClient {
    bot: Bot,
}

impl TelegramClient {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl ChatClient for TelegramClient {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), DeliveryError> {
        self.bot.send_message(ChatId(chat_id), text).await?;
        debug!(chat_id = chat_id, "Message delivered");
        Ok(())
    }

    async fn send_file(&self, chat_id: i64, path: &Path, caption: &str) -> Result<(), DeliveryError> {
        self.bot
            .send_video(ChatId(chat_id), InputFile::file(path))
            .caption(caption)
            .await?;
        debug!(chat_id = chat_id, path = %path.display(), "File delivered");
        Ok(())
    }
}
