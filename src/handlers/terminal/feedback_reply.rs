//! Feedback collection
//!
//! Takes the first plain message a user sends while their feedback process
//! is open, forwards it to the configured feedback chat and closes the
//! process. The session record itself stays, so the user is not greeted again.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use crate::handlers::registry::{HandlerModule, ModuleExports};
use crate::handlers::{CommandHandler, HandlerContext};
use crate::models::{IncomingMessage, ProcessData, UserInfo};
use crate::services::DeliveryError;
use crate::utils::errors::Result;
use super::feedback::FEEDBACK_PROCESS;

pub const MODULE: HandlerModule = HandlerModule { name: "feedback_reply", load };

fn load() -> Result<ModuleExports> {
    Ok(ModuleExports::with_handler(command_handler))
}

fn command_handler() -> Arc<dyn CommandHandler> {
    Arc::new(FeedbackReplyHandler)
}

#[derive(Debug, Default)]
pub struct FeedbackReplyHandler;

#[async_trait]
impl CommandHandler for FeedbackReplyHandler {
    fn name(&self) -> &str {
        "feedback_reply"
    }

    fn matches(&self, message: &IncomingMessage) -> bool {
        message.is_plain_text() && message.sender.is_some()
    }

    async fn accepts(&self, ctx: &HandlerContext, message: &IncomingMessage) -> Result<bool> {
        let Some(sender) = &message.sender else {
            return Ok(false);
        };
        let process = ctx.sessions.active_process(&sender.id.to_string()).await?;
        Ok(process.is_some_and(|p| p.process_type == FEEDBACK_PROCESS))
    }

    async fn handle(&self, ctx: &HandlerContext, message: &IncomingMessage) -> Result<()> {
        let Some(user) = ctx.user_info(message)? else {
            return Ok(());
        };

        let mut step = ProcessData::new();
        step.insert("message".to_string(), json!(user.message_text));
        let Some(finished) = ctx
            .sessions
            .complete_process(&user.user_id, FEEDBACK_PROCESS, step)
            .await?
        else {
            return Ok(());
        };

        info!(
            user_id = %user.user_id,
            started = %finished.started,
            length = user.message_text.chars().count(),
            "Feedback received"
        );

        let log = ctx.sessions.logger();
        if let Some(chat_id) = ctx.feedback_chat_id {
            if let Err(e) = ctx.client.send_message(chat_id, &forwarded(&user)).await {
                log.warn(format!("Failed to forward feedback from user {}: {}", user.user_id, e));
            }
        }

        let lang = finished
            .data
            .get("lang")
            .and_then(|v| v.as_str())
            .unwrap_or(user.lang.as_str());
        let thanks = ctx.i18n.t("feedback.thanks", lang, None);
        match ctx.client.send_message(user.chat_id, &thanks).await {
            Ok(()) => {}
            Err(DeliveryError::Blocked) => {
                log.warn(format!("User {} has blocked the bot", user.user_id));
            }
            Err(e) => {
                log.warn(format!("Failed to thank user {} for feedback: {}", user.user_id, e));
            }
        }

        Ok(())
    }
}

fn forwarded(user: &UserInfo) -> String {
    let from = user.link.as_deref().unwrap_or_else(|| user.display_name());
    format!("Feedback from {} (id {}):\n{}", from, user.user_id, user.message_text)
}
