//! State management module
//!
//! This module handles user session records and the per-user lock window

pub mod locks;
pub mod session;
pub mod storage;

// Re-export commonly used state components
pub use locks::LockTable;
pub use session::SessionManager;
pub use storage::{open_store, MemorySessionStore, RedisSessionStore, SessionChange, SessionStore, SessionUpdate};
