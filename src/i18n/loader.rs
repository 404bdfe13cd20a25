//! Translation loader and i18n management
//!
//! This module provides translation loading, language detection and message
//! formatting for the greeting flow.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};
use tokio::fs;
use tracing::{debug, error, info, warn};

use crate::config::I18nConfig;
use crate::utils::errors::{MiniBotError, Result};

/// Translation parameters for message formatting
pub type TranslationParams = HashMap<String, String>;

/// Main internationalization manager
#[derive(Debug, Clone)]
pub struct I18n {
    /// Loaded translations by language code
    translations: HashMap<String, Map<String, Value>>,
    default_language: String,
    supported_languages: Vec<String>,
    translations_dir: PathBuf,
}

fn ukrainian_letters() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[ґєіїҐЄІЇ]").expect("static pattern"))
}

fn cyrillic_letters() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\p{Cyrillic}").expect("static pattern"))
}

impl I18n {
    /// Create a new I18n instance
    pub fn new(config: &I18nConfig) -> Self {
        Self {
            translations: HashMap::new(),
            default_language: config.default_language.clone(),
            supported_languages: config.supported_languages.clone(),
            translations_dir: config.translations_dir.clone(),
        }
    }

    /// Load `<lang>.json` for every supported language.
    ///
    /// A missing or broken file for a non-default language is logged and
    /// skipped; the default language is mandatory.
    pub async fn load_translations(&mut self) -> Result<()> {
        let supported_languages = self.supported_languages.clone();
        for lang_code in &supported_languages {
            let file_path = self.translations_dir.join(format!("{}.json", lang_code));

            if file_path.exists() {
                match self.load_language_file(&file_path, lang_code).await {
                    Ok(_) => info!("Loaded translations for language: {}", lang_code),
                    Err(e) => {
                        error!("Failed to load translations for {}: {}", lang_code, e);
                        if lang_code == &self.default_language {
                            return Err(MiniBotError::Config(
                                format!("Failed to load default language translations: {}", e)
                            ));
                        }
                    }
                }
            } else {
                warn!("Translation file not found: {}", file_path.display());
                if lang_code == &self.default_language {
                    return Err(MiniBotError::Config(
                        format!("Default language translation file not found: {}", file_path.display())
                    ));
                }
            }
        }

        Ok(())
    }

    /// Load a single language file
    async fn load_language_file(&mut self, file_path: &Path, lang_code: &str) -> Result<()> {
        let content = fs::read_to_string(file_path).await?;
        let translations: Value = serde_json::from_str(&content)?;

        let Value::Object(map) = translations else {
            return Err(MiniBotError::Config(
                format!("Invalid translation file format for {}", lang_code)
            ));
        };

        debug!("Loaded {} translation keys for {}", map.len(), lang_code);
        self.translations.insert(lang_code.to_string(), map);
        Ok(())
    }

    /// Get a translated message, falling back to the default language and
    /// finally to the key itself
    pub fn t(&self, key: &str, lang: &str, params: Option<&TranslationParams>) -> String {
        let effective_lang = self.get_effective_language(lang);

        let value = self
            .get_translation_value(key, &effective_lang)
            .or_else(|| self.get_translation_value(key, &self.default_language));

        match value {
            Some(Value::String(text)) => self.format_message(text, params),
            Some(other) => self.format_message(&other.to_string(), params),
            None => {
                warn!("Translation key '{}' not found in any language", key);
                key.to_string()
            }
        }
    }

    /// Check if a language is supported
    pub fn is_language_supported(&self, lang: &str) -> bool {
        self.supported_languages.iter().any(|l| l == lang)
    }

    /// Get default language
    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    /// Pick the user's language from the client-reported locale, then from
    /// the script of the message text, then the default.
    pub fn detect_user_language(&self, telegram_lang: Option<&str>, text: &str) -> String {
        if let Some(lang) = telegram_lang {
            // "en-US" -> "en"
            let lang_code = lang.split(|c: char| c == '-' || c == '_').next().unwrap_or(lang).to_lowercase();
            if self.is_language_supported(&lang_code) {
                return lang_code;
            }
        }

        let guessed = if ukrainian_letters().is_match(text) {
            Some("uk")
        } else if cyrillic_letters().is_match(text) {
            Some("ru")
        } else {
            None
        };

        match guessed {
            Some(lang) if self.is_language_supported(lang) => lang.to_string(),
            _ => self.default_language.clone(),
        }
    }

    fn get_effective_language(&self, lang: &str) -> String {
        if self.is_language_supported(lang) && self.translations.contains_key(lang) {
            lang.to_string()
        } else {
            self.default_language.clone()
        }
    }

    /// Resolve nested keys like "greeting.welcome"
    fn get_translation_value(&self, key: &str, lang: &str) -> Option<&Value> {
        let translations = self.translations.get(lang)?;
        let mut parts = key.split('.');
        let mut current = translations.get(parts.next()?)?;
        for part in parts {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn format_message(&self, template: &str, params: Option<&TranslationParams>) -> String {
        let Some(params) = params else {
            return template.to_string();
        };

        params.iter().fold(template.to_string(), |text, (key, value)| {
            text.replace(&format!("{{{}}}", key), value)
        })
    }
}
