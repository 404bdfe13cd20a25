//! Repeated-line suppression for noisy log sites
//!
//! Only the most recently emitted line is remembered. A line is dropped when
//! it equals that line and the previous emission is younger than the window;
//! anything else is emitted and becomes the new remembered line.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::{info, warn};

#[derive(Debug)]
struct LastLine {
    text: String,
    emitted_at: Instant,
}

/// Log emitter that swallows back-to-back duplicates
#[derive(Debug)]
pub struct DedupLogger {
    window: Duration,
    last: Mutex<Option<LastLine>>,
}

impl DedupLogger {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last: Mutex::new(None),
        }
    }

    /// Emit `text` at info level unless it repeats the previous line.
    /// Returns whether the line was emitted.
    pub fn log(&self, text: impl AsRef<str>) -> bool {
        let text = text.as_ref();
        let emit = self.should_emit(text);
        if emit {
            info!("{}", text);
        }
        emit
    }

    /// Same as [`DedupLogger::log`] at warn level; shares the remembered line.
    pub fn warn(&self, text: impl AsRef<str>) -> bool {
        let text = text.as_ref();
        let emit = self.should_emit(text);
        if emit {
            warn!("{}", text);
        }
        emit
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    fn should_emit(&self, text: &str) -> bool {
        let now = Instant::now();
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(prev) = last.as_ref() {
            if prev.text == text && now.duration_since(prev.emitted_at) < self.window {
                return false;
            }
        }

        *last = Some(LastLine {
            text: text.to_string(),
            emitted_at: now,
        });
        true
    }
}

impl Default for DedupLogger {
    fn default() -> Self {
        Self::new(Duration::from_secs(15))
    }
}
