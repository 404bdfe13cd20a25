//! First-contact greeting
//!
//! Greets any private text message from a user without a session record,
//! using the lock window to swallow rapid-fire duplicates.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::handlers::registry::{HandlerModule, ModuleExports};
use crate::handlers::{CommandHandler, HandlerContext};
use crate::models::IncomingMessage;
use crate::utils::errors::Result;
use crate::utils::helpers::truncate_text;

pub const MODULE: HandlerModule = HandlerModule { name: "greeting", load };

fn load() -> Result<ModuleExports> {
    Ok(ModuleExports::with_handler(command_handler))
}

fn command_handler() -> Arc<dyn CommandHandler> {
    Arc::new(GreetingHandler)
}

#[derive(Debug, Default)]
pub struct GreetingHandler;

#[async_trait]
impl CommandHandler for GreetingHandler {
    fn name(&self) -> &str {
        "greeting"
    }

    fn matches(&self, message: &IncomingMessage) -> bool {
        message.is_plain_text()
    }

    async fn handle(&self, ctx: &HandlerContext, message: &IncomingMessage) -> Result<()> {
        let Some(user) = ctx.user_info(message)? else {
            return Ok(());
        };

        // Advisory only: two events interleaving between this check and
        // set_lock can both get through.
        if ctx.sessions.is_locked(&user.user_id) {
            debug!(user_id = %user.user_id, "User is locked, ignoring message");
            return Ok(());
        }

        if ctx.sessions.has_replied(&user.user_id).await? {
            debug!(
                user_id = %user.user_id,
                text = %truncate_text(&user.message_text, 40),
                "User already greeted"
            );
            return Ok(());
        }

        ctx.sessions.set_lock(&user.user_id);
        ctx.welcome.send_welcome(ctx.client.as_ref(), &user, false).await?;

        Ok(())
    }
}
