//! Session record storage
//!
//! This module handles persistence of user session records. Redis is the
//! production backend; every operation acquires its own connection and
//! releases it when the operation's scope ends, error or not.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::{debug, error, warn};

use crate::config::{RedisConfig, SessionConfig, StorageBackend};
use crate::models::UserSession;
use crate::utils::errors::{MiniBotError, Result};

/// Namespace of user session records inside the key prefix
const USERS_NAMESPACE: &str = "users_info";

/// Rewrites a stored record; returning `None` leaves it untouched
pub type SessionUpdate = Box<dyn FnOnce(Option<UserSession>) -> Option<UserSession> + Send>;

/// A record as seen before and after [`SessionStore::update`]
#[derive(Debug, Clone)]
pub struct SessionChange {
    pub before: Option<UserSession>,
    pub after: Option<UserSession>,
    pub written: bool,
}

impl SessionChange {
    fn new(before: Option<UserSession>, updated: Option<UserSession>) -> Self {
        let written = updated.is_some();
        let after = updated.or_else(|| before.clone());
        Self { before, after, written }
    }
}

/// Keyed persistence of [`UserSession`] records; `save` is an upsert
#[async_trait]
pub trait SessionStore: Send + Sync + std::fmt::Debug {
    async fn load(&self, user_id: &str) -> Result<Option<UserSession>>;

    async fn save(&self, session: &UserSession) -> Result<()>;

    /// Delete if present; returns whether a record existed
    async fn delete(&self, user_id: &str) -> Result<bool>;

    async fn exists(&self, user_id: &str) -> Result<bool> {
        Ok(self.load(user_id).await?.is_some())
    }

    /// Read-modify-write of one record. Backends run it over a single
    /// connection; it is not atomic against other writers.
    async fn update(&self, user_id: &str, apply: SessionUpdate) -> Result<SessionChange> {
        let before = self.load(user_id).await?;
        let updated = apply(before.clone());
        if let Some(session) = &updated {
            self.save(session).await?;
        }
        Ok(SessionChange::new(before, updated))
    }
}

/// Redis-backed session store
#[derive(Clone)]
pub struct RedisSessionStore {
    client: redis::Client,
    config: RedisConfig,
}

impl RedisSessionStore {
    /// Create a new store; no connection is opened until the first operation
    pub fn new(config: RedisConfig) -> Result<Self> {
        let client = redis::Client::open(config.url.as_str())?;
        Ok(Self { client, config })
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| {
                error!(error = %e, url = %self.config.url, "Failed to connect to Redis");
                MiniBotError::StoreUnavailable(e.to_string())
            })
    }

    fn get_session_key(&self, user_id: &str) -> String {
        format!("{}{}:{}", self.config.prefix, USERS_NAMESPACE, user_id)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn load(&self, user_id: &str) -> Result<Option<UserSession>> {
        let key = self.get_session_key(user_id);
        let mut conn = self.connection().await?;

        let serialized: Option<String> = conn.get(&key).await?;
        match serialized {
            Some(data) => {
                let session = serde_json::from_str::<UserSession>(&data).map_err(|e| {
                    error!(user_id = %user_id, error = %e, "Failed to deserialize session");
                    e
                })?;
                debug!(user_id = %user_id, process = ?session.process_type(), "Session loaded from Redis");
                Ok(Some(session))
            }
            None => {
                debug!(user_id = %user_id, "No session found in Redis");
                Ok(None)
            }
        }
    }

    async fn save(&self, session: &UserSession) -> Result<()> {
        let key = self.get_session_key(&session.user_id);
        let serialized = serde_json::to_string(session)?;
        let mut conn = self.connection().await?;

        conn.set::<_, _, ()>(&key, serialized).await?;
        debug!(user_id = %session.user_id, key = %key, "Session saved to Redis");
        Ok(())
    }

    async fn delete(&self, user_id: &str) -> Result<bool> {
        let key = self.get_session_key(user_id);
        let mut conn = self.connection().await?;

        let deleted: u32 = conn.del(&key).await?;
        debug!(user_id = %user_id, deleted = deleted > 0, "Session delete attempted");
        Ok(deleted > 0)
    }

    async fn exists(&self, user_id: &str) -> Result<bool> {
        let key = self.get_session_key(user_id);
        let mut conn = self.connection().await?;

        let exists: bool = conn.exists(&key).await?;
        Ok(exists)
    }

    async fn update(&self, user_id: &str, apply: SessionUpdate) -> Result<SessionChange> {
        let key = self.get_session_key(user_id);
        let mut conn = self.connection().await?;

        let serialized: Option<String> = conn.get(&key).await?;
        let before = serialized
            .map(|data| serde_json::from_str::<UserSession>(&data))
            .transpose()?;

        let updated = apply(before.clone());
        if let Some(session) = &updated {
            conn.set::<_, _, ()>(&key, serde_json::to_string(session)?).await?;
            debug!(user_id = %user_id, process = ?session.process_type(), "Session updated in Redis");
        }

        Ok(SessionChange::new(before, updated))
    }
}

impl std::fmt::Debug for RedisSessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisSessionStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Process-local store for development runs and tests.
///
/// Records are kept in their serialized form so that encoding problems show
/// up the same way they would against Redis.
#[derive(Debug)]
pub struct MemorySessionStore {
    records: Mutex<HashMap<String, String>>,
    available: AtomicBool,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }

    /// Simulate the backing store going away (or coming back)
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_available(&self) -> Result<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(MiniBotError::StoreUnavailable("in-memory store disabled".to_string()))
        }
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, user_id: &str) -> Result<Option<UserSession>> {
        self.check_available()?;
        let records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        records
            .get(user_id)
            .map(|data| serde_json::from_str(data).map_err(MiniBotError::from))
            .transpose()
    }

    async fn save(&self, session: &UserSession) -> Result<()> {
        self.check_available()?;
        let serialized = serde_json::to_string(session)?;
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(session.user_id.clone(), serialized);
        Ok(())
    }

    async fn delete(&self, user_id: &str) -> Result<bool> {
        self.check_available()?;
        Ok(self
            .records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(user_id)
            .is_some())
    }

    async fn exists(&self, user_id: &str) -> Result<bool> {
        self.check_available()?;
        Ok(self
            .records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(user_id))
    }

    async fn update(&self, user_id: &str, apply: SessionUpdate) -> Result<SessionChange> {
        self.check_available()?;
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);

        let before = records
            .get(user_id)
            .map(|data| serde_json::from_str::<UserSession>(data))
            .transpose()?;

        let updated = apply(before.clone());
        if let Some(session) = &updated {
            records.insert(user_id.to_string(), serde_json::to_string(session)?);
        }

        Ok(SessionChange::new(before, updated))
    }
}

/// Open the store selected by the session settings
pub fn open_store(session: &SessionConfig, redis: &RedisConfig) -> Result<Arc<dyn SessionStore>> {
    match session.storage {
        StorageBackend::Redis => Ok(Arc::new(RedisSessionStore::new(redis.clone())?)),
        StorageBackend::Memory => {
            warn!("Using the in-memory session store; sessions are lost on restart");
            Ok(Arc::new(MemorySessionStore::new()))
        }
    }
}
