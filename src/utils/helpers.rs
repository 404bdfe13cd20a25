//! Helper functions and utilities
//!
//! This module contains common helper functions used throughout the application.

use chrono::{DateTime, FixedOffset, Offset, Utc};
use url::Url;

use crate::utils::errors::Result;

/// Wall clock pinned to a fixed UTC offset (UTC+2 by default)
#[derive(Debug, Clone, Copy)]
pub struct LocalClock {
    offset: FixedOffset,
}

impl LocalClock {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    pub fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }
}

impl Default for LocalClock {
    fn default() -> Self {
        // 2 hours is always within FixedOffset's range
        Self::new(FixedOffset::east_opt(2 * 3600).unwrap_or_else(|| Utc.fix()))
    }
}

/// Format a timestamp the way operators read it in the logs
pub fn format_local_time(timestamp: &DateTime<FixedOffset>) -> String {
    timestamp.format("%d.%m.%y %H:%M:%S").to_string()
}

/// Public t.me link for a username, if the user has one
pub fn profile_link(username: Option<&str>) -> Result<Option<String>> {
    match username.map(str::trim).filter(|name| !name.is_empty()) {
        Some(name) => {
            let link = Url::parse("https://t.me/")?.join(name)?;
            Ok(Some(link.to_string()))
        }
        None => Ok(None),
    }
}

/// Truncate text to a maximum number of characters with ellipsis
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
