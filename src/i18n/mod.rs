//! Internationalization module
//!
//! Translation lookup and language detection for outgoing bot messages.

pub mod loader;

pub use loader::{I18n, TranslationParams};
