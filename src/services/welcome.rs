//! Welcome flow
//!
//! Sends the greeting (video with caption when the asset exists, plain text
//! otherwise) and records the user as replied-to only after delivery succeeded.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::GreetingConfig;
use crate::i18n::{I18n, TranslationParams};
use crate::models::UserInfo;
use crate::state::SessionManager;
use crate::utils::errors::Result;
use super::client::{ChatClient, DeliveryError};

/// Greeting sender
#[derive(Debug, Clone)]
pub struct WelcomeService {
    sessions: Arc<SessionManager>,
    i18n: Arc<I18n>,
    config: GreetingConfig,
}

impl WelcomeService {
    pub fn new(sessions: Arc<SessionManager>, i18n: Arc<I18n>, config: GreetingConfig) -> Self {
        Self { sessions, i18n, config }
    }

    /// Greet the user and persist their profile.
    ///
    /// Returns `Ok(false)` when delivery failed (blocked or otherwise); nothing
    /// is persisted then, so the next attempt greets again. Store failures
    /// propagate.
    pub async fn send_welcome(&self, client: &dyn ChatClient, user: &UserInfo, is_reset: bool) -> Result<bool> {
        let log = self.sessions.logger();

        let mut params = TranslationParams::new();
        params.insert("name".to_string(), user.display_name().to_string());
        let text = self.i18n.t(&self.config.translation_key, &user.lang, Some(&params));

        let delivery = match self.video_asset().await {
            Some(path) => client.send_file(user.chat_id, &path, &text).await,
            None => client.send_message(user.chat_id, &text).await,
        };

        match delivery {
            Ok(()) => {}
            Err(DeliveryError::Blocked) => {
                log.warn(format!("User {} has blocked the bot", user.user_id));
                return Ok(false);
            }
            Err(e) => {
                log.warn(format!("Failed to send greeting to user {}: {}", user.user_id, e));
                return Ok(false);
            }
        }

        self.sessions.save_replied_user(&user.user_id, user.profile()).await?;

        if is_reset {
            log.log(format!("Greeting sent to user {} after !start", user.user_id));
        } else {
            log.log(format!("Greeting sent to user {}", user.user_id));
        }
        Ok(true)
    }

    async fn video_asset(&self) -> Option<PathBuf> {
        let path = self.config.video_path.as_ref()?;
        match tokio::fs::try_exists(path).await {
            Ok(true) => Some(path.clone()),
            _ => None,
        }
    }
}
