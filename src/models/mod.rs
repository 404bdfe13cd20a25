//! Data models module
//!
//! This module contains the session record and the inbound message view

pub mod message;
pub mod session;

// Re-export commonly used models
pub use message::{IncomingMessage, Sender, UserInfo};
pub use session::{ProcessData, ProcessState, UserProfile, UserSession};
