//! `!feedback` handler
//!
//! Opens a feedback process for the user and prompts them for their message.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::handlers::registry::{HandlerModule, ModuleExports};
use crate::handlers::{CommandHandler, HandlerContext};
use crate::models::{IncomingMessage, ProcessData};
use crate::services::DeliveryError;
use crate::utils::errors::Result;

pub const MODULE: HandlerModule = HandlerModule { name: "feedback", load };

/// Process label stored on the session record
pub const FEEDBACK_PROCESS: &str = "feedback";

fn load() -> Result<ModuleExports> {
    Ok(ModuleExports::with_handler(command_handler))
}

fn command_handler() -> Arc<dyn CommandHandler> {
    Arc::new(FeedbackHandler)
}

#[derive(Debug, Default)]
pub struct FeedbackHandler;

#[async_trait]
impl CommandHandler for FeedbackHandler {
    fn name(&self) -> &str {
        "feedback"
    }

    fn matches(&self, message: &IncomingMessage) -> bool {
        message.is_private && message.is_command("feedback")
    }

    async fn handle(&self, ctx: &HandlerContext, message: &IncomingMessage) -> Result<()> {
        let Some(user) = ctx.user_info(message)? else {
            return Ok(());
        };

        let mut data = ProcessData::new();
        data.insert("chat_id".to_string(), json!(user.chat_id));
        data.insert("lang".to_string(), json!(user.lang));
        ctx.sessions
            .register_process(&user.user_id, FEEDBACK_PROCESS, Some(data))
            .await?;

        let prompt = ctx.i18n.t("feedback.prompt", &user.lang, None);
        let log = ctx.sessions.logger();
        match ctx.client.send_message(user.chat_id, &prompt).await {
            Ok(()) => {}
            Err(DeliveryError::Blocked) => {
                log.warn(format!("User {} has blocked the bot", user.user_id));
            }
            Err(e) => {
                log.warn(format!("Failed to send feedback prompt to user {}: {}", user.user_id, e));
            }
        }

        Ok(())
    }
}
