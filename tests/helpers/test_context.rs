//! Test context for unified test setup
//!
//! Wires the session manager, translations and handler context against the
//! in-memory store and the recording chat client.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use minibot::config::{GreetingConfig, I18nConfig, SessionConfig};
use minibot::handlers::HandlerContext;
use minibot::i18n::I18n;
use minibot::services::ChatClient;
use minibot::state::{MemorySessionStore, SessionManager};
use minibot::utils::dedup::DedupLogger;
use tempfile::TempDir;

use super::{init_test_env, MockChatClient};

pub const WELCOME_EN: &str = "Hello, {name}!";
pub const WELCOME_UK: &str = "Привіт, {name}!";
pub const FEEDBACK_PROMPT_EN: &str = "Tell us what you think";
pub const FEEDBACK_THANKS_EN: &str = "Thanks, noted";
/// Chat that collects forwarded feedback
pub const FEEDBACK_CHAT_ID: i64 = -100500;

/// Unified test context that manages all test components
pub struct TestContext {
    pub temp_dir: TempDir,
    pub store: Arc<MemorySessionStore>,
    pub sessions: Arc<SessionManager>,
    pub i18n: Arc<I18n>,
    pub client: Arc<MockChatClient>,
    pub handlers: HandlerContext,
}

impl TestContext {
    /// Context whose greeting is plain text
    pub async fn new() -> Self {
        Self::build(false).await
    }

    /// Context whose greeting is sent as a video with a caption
    pub async fn with_video() -> Self {
        Self::build(true).await
    }

    async fn build(with_video: bool) -> Self {
        init_test_env();

        let temp_dir = tempfile::tempdir().expect("temp dir");
        write_translations(temp_dir.path());

        let video_path = temp_dir.path().join("welcome.mp4");
        if with_video {
            std::fs::write(&video_path, b"not really a video").expect("video asset");
        }

        let store = Arc::new(MemorySessionStore::new());
        let sessions = Arc::new(
            SessionManager::new(store.clone(), &SessionConfig::default(), Arc::new(DedupLogger::default()))
                .expect("session manager"),
        );

        let mut i18n = I18n::new(&I18nConfig {
            translations_dir: temp_dir.path().to_path_buf(),
            ..I18nConfig::default()
        });
        i18n.load_translations().await.expect("translations");
        let i18n = Arc::new(i18n);

        let client = Arc::new(MockChatClient::new());
        let greeting = GreetingConfig {
            video_path: Some(video_path),
            translation_key: "welcome".to_string(),
        };
        let handlers = HandlerContext::new(
            sessions.clone(),
            i18n.clone(),
            greeting,
            client.clone() as Arc<dyn ChatClient>,
        )
        .with_feedback_chat(Some(FEEDBACK_CHAT_ID));

        Self {
            temp_dir,
            store,
            sessions,
            i18n,
            client,
            handlers,
        }
    }

    pub fn video_path(&self) -> PathBuf {
        self.temp_dir.path().join("welcome.mp4")
    }
}

/// English and Ukrainian translations; Russian is deliberately missing
pub fn write_translations(dir: &Path) {
    std::fs::write(
        dir.join("en.json"),
        serde_json::json!({
            "welcome": WELCOME_EN,
            "feedback": { "prompt": FEEDBACK_PROMPT_EN, "thanks": FEEDBACK_THANKS_EN }
        })
        .to_string(),
    )
    .expect("en.json");

    std::fs::write(
        dir.join("uk.json"),
        serde_json::json!({ "welcome": WELCOME_UK }).to_string(),
    )
    .expect("uk.json");
}
