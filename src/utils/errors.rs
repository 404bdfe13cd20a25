//! Error handling for MiniBot
//!
//! This module defines the main error type used throughout the application
//! and the transient/fatal classification the startup supervisor relies on.

use teloxide::RequestError;
use thiserror::Error;

/// Main error type for MiniBot
#[derive(Error, Debug)]
pub enum MiniBotError {
    #[error("Telegram API error: {0}")]
    Telegram(#[from] RequestError),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Session store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration loading error: {0}")]
    ConfigLoad(#[from] config::ConfigError),

    #[error("Operation timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Connection failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<MiniBotError>,
    },

    #[error("Failed to load handler module '{module}': {reason}")]
    HandlerLoad { module: String, reason: String },

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for MiniBot operations
pub type Result<T> = std::result::Result<T, MiniBotError>;

impl MiniBotError {
    /// Whether the failure is a connectivity hiccup worth retrying with backoff.
    pub fn is_transient(&self) -> bool {
        match self {
            MiniBotError::Timeout(_) | MiniBotError::Network(_) => true,
            MiniBotError::Telegram(e) => matches!(
                e,
                RequestError::Network(_) | RequestError::Io(_) | RequestError::RetryAfter(_)
            ),
            MiniBotError::Redis(e) => e.is_timeout() || e.is_connection_refusal() || e.is_io_error(),
            _ => false,
        }
    }

    /// Display strings of the underlying sources, nearest first
    pub fn causes(&self) -> Vec<String> {
        let mut causes = Vec::new();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            causes.push(cause.to_string());
            source = cause.source();
        }
        causes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(MiniBotError::Timeout("getMe".to_string()).is_transient());
        assert!(MiniBotError::Network("connection reset".to_string()).is_transient());
        assert!(!MiniBotError::Config("missing token".to_string()).is_transient());
        assert!(!MiniBotError::InvalidInput("bad".to_string()).is_transient());
        assert!(!MiniBotError::StoreUnavailable("down".to_string()).is_transient());
    }

    #[test]
    fn test_telegram_api_errors_are_not_transient() {
        let err = MiniBotError::Telegram(RequestError::Api(teloxide::ApiError::InvalidToken));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_causes_walk_the_source_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset by peer");
        let err = MiniBotError::RetriesExhausted {
            attempts: 2,
            source: Box::new(MiniBotError::Io(io)),
        };

        assert_eq!(err.causes(), vec!["I/O error: reset by peer", "reset by peer"]);
        assert!(MiniBotError::Timeout("getMe".to_string()).causes().is_empty());
    }

    #[test]
    fn test_retries_exhausted_message() {
        let err = MiniBotError::RetriesExhausted {
            attempts: 5,
            source: Box::new(MiniBotError::Timeout("getMe".to_string())),
        };
        assert_eq!(
            err.to_string(),
            "Connection failed after 5 attempts: Operation timed out: getMe"
        );
    }
}
