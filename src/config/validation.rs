//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use crate::utils::errors::{MiniBotError, Result};
use super::settings::StorageBackend;
use super::Settings;

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_bot_config(&settings.bot)?;
    validate_session_config(&settings.session, &settings.redis)?;
    validate_supervisor_config(&settings.supervisor)?;
    validate_i18n_config(&settings.i18n)?;
    validate_logging_config(&settings.logging)?;

    Ok(())
}

/// Validate bot configuration
fn validate_bot_config(config: &super::BotConfig) -> Result<()> {
    if config.token.is_empty() {
        return Err(MiniBotError::Config(
            "Bot token is required".to_string()
        ));
    }

    if config.request_timeout_secs == 0 {
        return Err(MiniBotError::Config(
            "Request timeout must be greater than 0".to_string()
        ));
    }

    if let Some(api_url) = &config.api_url {
        url::Url::parse(api_url)?;
    }

    Ok(())
}

/// Validate session and storage configuration
fn validate_session_config(config: &super::SessionConfig, redis: &super::RedisConfig) -> Result<()> {
    if config.storage == StorageBackend::Redis && redis.url.is_empty() {
        return Err(MiniBotError::Config(
            "Redis URL is required for the redis storage backend".to_string()
        ));
    }

    if config.lock_expiration_secs == 0 {
        return Err(MiniBotError::Config(
            "Lock expiration must be greater than 0".to_string()
        ));
    }

    if !(-12..=14).contains(&config.utc_offset_hours) {
        return Err(MiniBotError::Config(
            format!("UTC offset must be within -12..=14 hours, got {}", config.utc_offset_hours)
        ));
    }

    Ok(())
}

/// Validate startup supervisor configuration
fn validate_supervisor_config(config: &super::SupervisorConfig) -> Result<()> {
    if config.max_retries == 0 {
        return Err(MiniBotError::Config(
            "At least one connection attempt must be allowed".to_string()
        ));
    }

    if config.liveness_interval_secs == 0 {
        return Err(MiniBotError::Config(
            "Liveness interval must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate internationalization configuration
fn validate_i18n_config(config: &super::I18nConfig) -> Result<()> {
    if config.default_language.is_empty() {
        return Err(MiniBotError::Config(
            "Default language is required".to_string()
        ));
    }

    if !config.supported_languages.contains(&config.default_language) {
        return Err(MiniBotError::Config(
            "Default language must be in supported languages list".to_string()
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(MiniBotError::Config(
            format!("Invalid log level: {}. Valid levels: {:?}", config.level, valid_levels)
        ));
    }

    Ok(())
}
