//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from built-in defaults, an optional TOML file and
//! environment variables.

use std::path::PathBuf;
use std::time::Duration;

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use crate::utils::errors::{MiniBotError, Result};

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub bot: BotConfig,
    pub redis: RedisConfig,
    pub session: SessionConfig,
    pub supervisor: SupervisorConfig,
    pub greeting: GreetingConfig,
    /// Empty collections do not survive the defaults layer, so this section may be absent
    #[serde(default)]
    pub handlers: HandlersConfig,
    pub i18n: I18nConfig,
    pub logging: LoggingConfig,
}

/// Telegram bot configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BotConfig {
    pub token: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    /// Overrides the Bot API endpoint (local Bot API server, test doubles)
    pub api_url: Option<String>,
}

/// Redis configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RedisConfig {
    pub url: String,
    pub prefix: String,
}

/// Where user sessions are persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Redis,
    Memory,
}

/// Session state configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    pub storage: StorageBackend,
    pub lock_expiration_secs: u64,
    pub utc_offset_hours: i32,
}

/// Startup supervisor configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SupervisorConfig {
    pub max_retries: u32,
    pub base_delay_secs: u64,
    pub liveness_interval_secs: u64,
}

/// Greeting flow configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GreetingConfig {
    pub video_path: Option<PathBuf>,
    pub translation_key: String,
}

/// Handler registry configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct HandlersConfig {
    /// Names of handler modules to skip at load time
    pub disabled: Vec<String>,
    /// Chat that receives completed feedback replies; unset keeps them in the log only
    pub feedback_chat_id: Option<i64>,
}

/// Internationalization configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct I18nConfig {
    pub default_language: String,
    pub supported_languages: Vec<String>,
    pub translations_dir: PathBuf,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: String,
    pub dedup_window_secs: u64,
}

impl Settings {
    /// Load settings from defaults, `config.toml` and `MINIBOT__*` variables
    pub fn new() -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&Settings::default())?)
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::with_prefix("MINIBOT").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<()> {
        super::validation::validate_settings(self)
    }
}

impl SessionConfig {
    pub fn lock_expiration(&self) -> Duration {
        Duration::from_secs(self.lock_expiration_secs)
    }

    /// Fixed offset used to stamp session records
    pub fn utc_offset(&self) -> Result<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_hours * 3600).ok_or_else(|| {
            MiniBotError::Config(format!("Invalid UTC offset: {} hours", self.utc_offset_hours))
        })
    }
}

impl SupervisorConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_secs(self.base_delay_secs)
    }

    pub fn liveness_interval(&self) -> Duration {
        Duration::from_secs(self.liveness_interval_secs)
    }
}

impl LoggingConfig {
    pub fn dedup_window(&self) -> Duration {
        Duration::from_secs(self.dedup_window_secs)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            storage: StorageBackend::Redis,
            lock_expiration_secs: 10,
            utc_offset_hours: 2,
        }
    }
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay_secs: 3,
            liveness_interval_secs: 300,
        }
    }
}

impl Default for I18nConfig {
    fn default() -> Self {
        Self {
            default_language: "en".to_string(),
            supported_languages: vec!["en".to_string(), "ru".to_string(), "uk".to_string()],
            translations_dir: PathBuf::from("translations"),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bot: BotConfig {
                token: String::new(),
                connect_timeout_secs: 30,
                request_timeout_secs: 30,
                api_url: None,
            },
            redis: RedisConfig {
                url: "redis://localhost:6379".to_string(),
                prefix: "minibot:".to_string(),
            },
            session: SessionConfig::default(),
            supervisor: SupervisorConfig::default(),
            greeting: GreetingConfig {
                video_path: Some(PathBuf::from("assets/welcome.mp4")),
                translation_key: "welcome".to_string(),
            },
            handlers: HandlersConfig::default(),
            i18n: I18nConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: "logs".to_string(),
                dedup_window_secs: 15,
            },
        }
    }
}
