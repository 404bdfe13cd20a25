//! User session model
//!
//! One record per user id. The existence of a record is what marks a user as
//! greeted; the optional process block tracks a multi-step interaction.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form step state accumulated by an active process
pub type ProcessData = Map<String, Value>;

/// Persisted per-user session record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSession {
    pub user_id: String,
    /// Last write, stamped in the configured local offset
    pub timestamp: DateTime<FixedOffset>,
    #[serde(flatten)]
    pub profile: UserProfile,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process: Option<ProcessState>,
}

/// Profile fields captured from the chat client
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub link: Option<String>,
    pub chat_id: Option<i64>,
}

/// In-progress multi-step interaction; type and data always travel together
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessState {
    pub process_type: String,
    #[serde(default)]
    pub data: ProcessData,
    pub started: DateTime<FixedOffset>,
    pub last_activity: DateTime<FixedOffset>,
}

impl UserSession {
    /// Fresh record with profile fields and no active process
    pub fn new(user_id: impl Into<String>, timestamp: DateTime<FixedOffset>, profile: UserProfile) -> Self {
        Self {
            user_id: user_id.into(),
            timestamp,
            profile,
            process: None,
        }
    }

    /// Fresh record that only carries a process
    pub fn with_process(
        user_id: impl Into<String>,
        process_type: impl Into<String>,
        data: ProcessData,
        now: DateTime<FixedOffset>,
    ) -> Self {
        let mut session = Self::new(user_id, now, UserProfile::default());
        session.start_process(process_type, data, now);
        session
    }

    /// Replace whatever process was active; processes never stack
    pub fn start_process(&mut self, process_type: impl Into<String>, data: ProcessData, now: DateTime<FixedOffset>) {
        self.process = Some(ProcessState {
            process_type: process_type.into(),
            data,
            started: now,
            last_activity: now,
        });
    }

    /// End the active process if it is `process_type`, folding the final
    /// step into its data. Returns the finished process.
    pub fn finish_process(
        &mut self,
        process_type: &str,
        step: ProcessData,
        now: DateTime<FixedOffset>,
    ) -> Option<ProcessState> {
        if self.process_type() != Some(process_type) {
            return None;
        }

        let mut finished = self.process.take()?;
        finished.data.extend(step);
        finished.last_activity = now;
        Some(finished)
    }

    pub fn process_type(&self) -> Option<&str> {
        self.process.as_ref().map(|p| p.process_type.as_str())
    }

    pub fn is_idle(&self) -> bool {
        self.process.is_none()
    }
}
