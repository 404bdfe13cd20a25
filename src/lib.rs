//! MiniBot Telegram Bot
//!
//! A small Telegram bot that greets first-time private-chat users once,
//! remembers them in a session store and lets independently authored
//! handler modules plug into message handling.

pub mod bot;
pub mod config;
pub mod handlers;
pub mod i18n;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{MiniBotError, Result};

// Re-export main components for easy access
pub use bot::{StartupSupervisor, TelegramConnector};
pub use handlers::{HandlerLoader, HandlerSet};
pub use i18n::I18n;
pub use state::{SessionManager, SessionStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
