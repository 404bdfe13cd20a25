//! `!start` handler
//!
//! Wipes the user's session and lock, then greets them again.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::handlers::registry::{HandlerModule, ModuleExports};
use crate::handlers::{CommandHandler, HandlerContext};
use crate::models::IncomingMessage;
use crate::utils::errors::Result;

pub const MODULE: HandlerModule = HandlerModule { name: "start", load };

fn load() -> Result<ModuleExports> {
    Ok(ModuleExports::with_handler(command_handler))
}

fn command_handler() -> Arc<dyn CommandHandler> {
    Arc::new(StartHandler)
}

/// Resets the user and resends the greeting
#[derive(Debug, Default)]
pub struct StartHandler;

#[async_trait]
impl CommandHandler for StartHandler {
    fn name(&self) -> &str {
        "start"
    }

    fn matches(&self, message: &IncomingMessage) -> bool {
        message.is_private && message.is_command("start")
    }

    async fn handle(&self, ctx: &HandlerContext, message: &IncomingMessage) -> Result<()> {
        let Some(user) = ctx.user_info(message)? else {
            return Ok(());
        };

        ctx.sessions.reset_user(&user.user_id).await?;
        let greeted = ctx.welcome.send_welcome(ctx.client.as_ref(), &user, true).await?;
        debug!(user_id = %user.user_id, greeted = greeted, "Start command handled");

        Ok(())
    }
}
