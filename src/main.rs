//! MiniBot Telegram Bot
//!
//! Main application entry point

use std::sync::Arc;

use tracing::{error, info};

use minibot::{
    bot::{AppServices, StartupSupervisor, TelegramConnector},
    config::Settings,
    handlers::{terminal, HandlerLoader},
    i18n::I18n,
    state::{open_store, SessionManager},
    utils::{dedup::DedupLogger, logging},
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new()?;
    settings.validate()?;

    // Initialize logging; the guard flushes the file writer on exit
    let _log_guard = logging::init_logging(&settings.logging)?;

    info!("Starting {}...", minibot::info());

    let dedup = Arc::new(DedupLogger::new(settings.logging.dedup_window()));

    // Initialize session storage
    let store = open_store(&settings.session, &settings.redis)?;
    let sessions = Arc::new(SessionManager::new(store, &settings.session, Arc::clone(&dedup))?);

    // Initialize i18n system
    info!("Loading translations...");
    let mut i18n = I18n::new(&settings.i18n);
    i18n.load_translations().await?;

    let services = AppServices {
        sessions,
        i18n: Arc::new(i18n),
        greeting: settings.greeting.clone(),
        feedback_chat_id: settings.handlers.feedback_chat_id,
    };

    let connector = TelegramConnector::new(settings.bot.clone(), services);
    let loader = HandlerLoader::new(terminal::modules(), &settings.handlers);
    let mut supervisor = StartupSupervisor::new(settings.supervisor.clone(), loader, dedup);

    supervisor.run_until(&connector, shutdown_signal()).await?;

    info!("MiniBot has been shut down.");
    Ok(())
}

/// Resolves on Ctrl-C
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for the stop signal");
        std::future::pending::<()>().await;
    }
}
