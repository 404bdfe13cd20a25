//! User session manager
//!
//! Orchestrates the session store and the lock table: greeting status,
//! process registration and user resets.

use std::sync::Arc;

use tracing::debug;

use crate::config::SessionConfig;
use crate::models::{ProcessData, ProcessState, UserProfile, UserSession};
use crate::utils::dedup::DedupLogger;
use crate::utils::errors::{MiniBotError, Result};
use crate::utils::helpers::{format_local_time, LocalClock};
use super::locks::LockTable;
use super::storage::SessionStore;

/// Session state manager, constructed once and shared by reference
#[derive(Debug, Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    locks: LockTable,
    clock: LocalClock,
    log: Arc<DedupLogger>,
}

impl SessionManager {
    /// Create a manager from session settings
    pub fn new(store: Arc<dyn SessionStore>, config: &SessionConfig, log: Arc<DedupLogger>) -> Result<Self> {
        Ok(Self::with_parts(
            store,
            LockTable::new(config.lock_expiration()),
            LocalClock::new(config.utc_offset()?),
            log,
        ))
    }

    pub fn with_parts(store: Arc<dyn SessionStore>, locks: LockTable, clock: LocalClock, log: Arc<DedupLogger>) -> Self {
        Self { store, locks, clock, log }
    }

    /// Whether a session record exists; existence alone is the answer
    pub async fn has_replied(&self, user_id: &str) -> Result<bool> {
        self.store.exists(user_id).await
    }

    /// Fetch the stored record
    pub async fn session(&self, user_id: &str) -> Result<Option<UserSession>> {
        self.store.load(user_id).await
    }

    /// Overwrite the user's record with fresh profile fields.
    ///
    /// The record is replaced wholesale, so any active process is dropped.
    pub async fn save_replied_user(&self, user_id: &str, profile: UserProfile) -> Result<UserSession> {
        let session = UserSession::new(user_id, self.clock.now(), profile);
        self.store.save(&session).await?;

        debug!(user_id = %user_id, timestamp = %format_local_time(&session.timestamp), "Session record written");
        self.log.log(format!("User {} saved to session store", user_id));
        Ok(session)
    }

    /// Delete the user's record and lock; a missing record is not an error
    pub async fn remove_user(&self, user_id: &str) -> Result<()> {
        let existed = self.store.delete(user_id).await?;
        let was_locked = self.locks.clear(user_id);
        debug!(user_id = %user_id, existed = existed, was_locked = was_locked, "Session removed");

        self.log.log(format!("User {} removed from session store", user_id));
        Ok(())
    }

    /// Explicit reset requested by the user
    pub async fn reset_user(&self, user_id: &str) -> Result<()> {
        self.remove_user(user_id).await?;

        self.log.log(format!("Data for user {} reset", user_id));
        Ok(())
    }

    /// Start `process_type` for the user, replacing any active process.
    ///
    /// The record is created if missing. Read and write share one store
    /// connection but are not atomic against concurrent writers.
    pub async fn register_process(
        &self,
        user_id: &str,
        process_type: &str,
        data: Option<ProcessData>,
    ) -> Result<UserSession> {
        let now = self.clock.now();
        let data = data.unwrap_or_default();
        let id = user_id.to_string();
        let label = process_type.to_string();

        let change = self
            .store
            .update(
                user_id,
                Box::new(move |current: Option<UserSession>| {
                    Some(match current {
                        Some(mut existing) => {
                            existing.start_process(label, data, now);
                            existing
                        }
                        None => UserSession::with_process(id, label, data, now),
                    })
                }),
            )
            .await?;
        let session = change.after.ok_or_else(|| {
            MiniBotError::StoreUnavailable(format!("record for user {} missing after write", user_id))
        })?;

        self.log.log(format!("Process '{}' registered for user {}", process_type, user_id));
        Ok(session)
    }

    /// End the user's `process_type` process with a final step, keeping the
    /// record itself. Returns the finished process, or `None` when that
    /// process was not active.
    pub async fn complete_process(
        &self,
        user_id: &str,
        process_type: &str,
        step: ProcessData,
    ) -> Result<Option<ProcessState>> {
        let now = self.clock.now();
        let label = process_type.to_string();

        let change = self
            .store
            .update(
                user_id,
                Box::new(move |current: Option<UserSession>| {
                    let mut session = current?;
                    session.finish_process(&label, ProcessData::new(), now)?;
                    Some(session)
                }),
            )
            .await?;
        if !change.written {
            debug!(user_id = %user_id, process = process_type, "No matching process to complete");
            return Ok(None);
        }

        let finished = change
            .before
            .and_then(|mut session| session.finish_process(process_type, step, now));

        self.log.log(format!("Process '{}' completed for user {}", process_type, user_id));
        Ok(finished)
    }

    /// The user's active process, if any
    pub async fn active_process(&self, user_id: &str) -> Result<Option<ProcessState>> {
        Ok(self.store.load(user_id).await?.and_then(|session| session.process))
    }

    /// Mark the user locked for one window; expiry runs in the background
    pub fn set_lock(&self, user_id: &str) {
        self.locks.set_lock(user_id);
    }

    pub fn is_locked(&self, user_id: &str) -> bool {
        self.locks.is_locked(user_id)
    }

    pub fn logger(&self) -> &Arc<DedupLogger> {
        &self.log
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::storage::{MemorySessionStore, SessionChange, SessionUpdate};
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Records which store operations a manager call used
    #[derive(Debug, Default)]
    struct CallLog {
        inner: MemorySessionStore,
        calls: Mutex<Vec<&'static str>>,
    }

    impl CallLog {
        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: &'static str) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl SessionStore for CallLog {
        async fn load(&self, user_id: &str) -> Result<Option<UserSession>> {
            self.record("load");
            self.inner.load(user_id).await
        }

        async fn save(&self, session: &UserSession) -> Result<()> {
            self.record("save");
            self.inner.save(session).await
        }

        async fn delete(&self, user_id: &str) -> Result<bool> {
            self.record("delete");
            self.inner.delete(user_id).await
        }

        async fn update(&self, user_id: &str, apply: SessionUpdate) -> Result<SessionChange> {
            self.record("update");
            self.inner.update(user_id, apply).await
        }
    }

    fn manager(store: Arc<MemorySessionStore>) -> SessionManager {
        SessionManager::new(store, &SessionConfig::default(), Arc::new(DedupLogger::default())).unwrap()
    }

    #[tokio::test]
    async fn test_register_process_creates_record() {
        let store = Arc::new(MemorySessionStore::new());
        let sessions = manager(store.clone());

        let mut data = ProcessData::new();
        data.insert("step".to_string(), json!("email"));
        sessions.register_process("7", "signup", Some(data)).await.unwrap();

        let stored = sessions.session("7").await.unwrap().unwrap();
        let process = stored.process.unwrap();
        assert_eq!(process.process_type, "signup");
        assert_eq!(process.data["step"], json!("email"));
        assert_eq!(stored.timestamp, process.started);
        // registering a process also counts as a record for has_replied
        assert!(sessions.has_replied("7").await.unwrap());
    }

    #[tokio::test]
    async fn test_register_process_keeps_profile() {
        let store = Arc::new(MemorySessionStore::new());
        let sessions = manager(store);

        let profile = UserProfile {
            username: Some("frankie".to_string()),
            ..UserProfile::default()
        };
        let saved = sessions.save_replied_user("7", profile.clone()).await.unwrap();
        sessions.register_process("7", "feedback", None).await.unwrap();

        let stored = sessions.session("7").await.unwrap().unwrap();
        assert_eq!(stored.profile, profile);
        assert_eq!(stored.timestamp, saved.timestamp);
        assert_eq!(stored.process_type(), Some("feedback"));
        assert!(stored.process.unwrap().data.is_empty());
    }

    #[tokio::test]
    async fn test_process_writes_use_single_store_round() {
        let store = Arc::new(CallLog::default());
        let sessions = SessionManager::new(store.clone(), &SessionConfig::default(), Arc::new(DedupLogger::default()))
            .unwrap();

        sessions.register_process("7", "feedback", None).await.unwrap();
        assert_eq!(store.calls(), vec!["update"]);

        sessions.register_process("7", "survey", None).await.unwrap();
        sessions.complete_process("7", "survey", ProcessData::new()).await.unwrap();
        assert_eq!(store.calls(), vec!["update", "update", "update"]);
    }

    #[tokio::test]
    async fn test_complete_process_keeps_record() {
        let store = Arc::new(MemorySessionStore::new());
        let sessions = manager(store.clone());

        let mut data = ProcessData::new();
        data.insert("lang".to_string(), json!("uk"));
        sessions.register_process("7", "feedback", Some(data)).await.unwrap();

        let mut step = ProcessData::new();
        step.insert("message".to_string(), json!("thanks"));
        let finished = sessions.complete_process("7", "feedback", step).await.unwrap().unwrap();

        assert_eq!(finished.data["lang"], json!("uk"));
        assert_eq!(finished.data["message"], json!("thanks"));
        assert!(sessions.active_process("7").await.unwrap().is_none());
        assert!(sessions.has_replied("7").await.unwrap());
    }

    #[tokio::test]
    async fn test_complete_process_ignores_other_process() {
        let store = Arc::new(MemorySessionStore::new());
        let sessions = manager(store.clone());

        assert!(sessions.complete_process("7", "feedback", ProcessData::new()).await.unwrap().is_none());
        assert!(store.is_empty());

        sessions.register_process("7", "survey", None).await.unwrap();
        assert!(sessions.complete_process("7", "feedback", ProcessData::new()).await.unwrap().is_none());
        assert_eq!(
            sessions.active_process("7").await.unwrap().map(|p| p.process_type),
            Some("survey".to_string())
        );
    }

    #[tokio::test]
    async fn test_store_unavailable_propagates() {
        let store = Arc::new(MemorySessionStore::new());
        let sessions = manager(store.clone());
        store.set_available(false);

        assert_matches!(sessions.has_replied("7").await, Err(MiniBotError::StoreUnavailable(_)));
        assert_matches!(
            sessions.register_process("7", "feedback", None).await,
            Err(MiniBotError::StoreUnavailable(_))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_clears_lock() {
        let store = Arc::new(MemorySessionStore::new());
        let sessions = manager(store);

        sessions.set_lock("7");
        assert!(sessions.is_locked("7"));

        sessions.reset_user("7").await.unwrap();
        assert!(!sessions.is_locked("7"));

        tokio::time::advance(Duration::from_secs(11)).await;
        assert!(!sessions.is_locked("7"));
    }
}
