//! Bot lifecycle
//!
//! - `supervisor` owns startup retries, the idle loop and teardown
//! - `telegram` is the Telegram implementation of the connection seam

pub mod supervisor;
pub mod telegram;

pub use supervisor::{BotSession, Connector, StartupSupervisor, SupervisorState};
pub use telegram::{AppServices, TelegramConnector, TelegramSession};
