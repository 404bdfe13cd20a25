//! Recording chat client
//!
//! Stands in for the Telegram client: records every delivery and can be told
//! to fail the next sends.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use minibot::services::{ChatClient, DeliveryError};

/// One recorded delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentItem {
    pub chat_id: i64,
    pub text: String,
    pub file: Option<PathBuf>,
}

/// Scripted result for a single send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Delivered,
    Blocked,
    Failed,
}

#[derive(Debug, Default)]
pub struct MockChatClient {
    sent: Mutex<Vec<SentItem>>,
    script: Mutex<VecDeque<SendOutcome>>,
}

impl MockChatClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue outcomes for the next sends; unscripted sends succeed
    pub fn script(&self, outcomes: impl IntoIterator<Item = SendOutcome>) {
        self.script.lock().unwrap().extend(outcomes);
    }

    /// Successfully delivered items, in order
    pub fn sent(&self) -> Vec<SentItem> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    fn deliver(&self, item: SentItem) -> Result<(), DeliveryError> {
        let outcome = self.script.lock().unwrap().pop_front().unwrap_or(SendOutcome::Delivered);
        match outcome {
            SendOutcome::Delivered => {
                self.sent.lock().unwrap().push(item);
                Ok(())
            }
            SendOutcome::Blocked => Err(DeliveryError::Blocked),
            SendOutcome::Failed => Err(DeliveryError::Failed("network is down".to_string())),
        }
    }
}

#[async_trait]
impl ChatClient for MockChatClient {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), DeliveryError> {
        self.deliver(SentItem {
            chat_id,
            text: text.to_string(),
            file: None,
        })
    }

    async fn send_file(&self, chat_id: i64, path: &Path, caption: &str) -> Result<(), DeliveryError> {
        self.deliver(SentItem {
            chat_id,
            text: caption.to_string(),
            file: Some(path.to_path_buf()),
        })
    }
}
