//! Per-user advisory lock window
//!
//! Volatile, process-local exclusion markers keyed by user id. A lock expires
//! on its own once the window elapses; nothing here blocks or queues callers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

/// Lock table with automatic expiry
#[derive(Debug, Clone)]
pub struct LockTable {
    window: Duration,
    entries: Arc<Mutex<HashMap<String, Instant>>>,
}

impl LockTable {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Lock `user_id` for one window and schedule the sweep in the background.
    ///
    /// Must be called from within a tokio runtime. Re-locking an already
    /// locked user restarts the window.
    pub fn set_lock(&self, user_id: &str) {
        let expires_at = Instant::now() + self.window;
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(user_id.to_string(), expires_at);
        debug!(user_id = %user_id, window_secs = self.window.as_secs(), "User locked");

        let entries = Arc::clone(&self.entries);
        let user_id = user_id.to_string();
        tokio::spawn(async move {
            tokio::time::sleep_until(expires_at).await;
            let mut entries = entries.lock().unwrap_or_else(PoisonError::into_inner);
            // a later set_lock may have pushed the expiry out
            if entries.get(&user_id).is_some_and(|at| *at <= Instant::now()) {
                entries.remove(&user_id);
                debug!(user_id = %user_id, "User lock expired");
            }
        });
    }

    /// Pure lookup; an entry past its expiry counts as unlocked even before
    /// the sweep removes it
    pub fn is_locked(&self, user_id: &str) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(user_id)
            .is_some_and(|expires_at| *expires_at > Instant::now())
    }

    /// Drop the lock immediately; returns whether one was held
    pub fn clear(&self, user_id: &str) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(user_id)
            .is_some()
    }

    /// Number of entries not yet swept
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}
