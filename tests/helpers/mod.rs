//! Test helpers module
//!
//! This module provides utilities and helpers for testing MiniBot.
//! It includes a recording chat client, a mock Bot API server and a
//! unified test context.

pub mod chat_client;
pub mod simple_test;
pub mod telegram_mock;
pub mod test_context;
pub mod test_data;

pub use chat_client::*;
pub use simple_test::*;
pub use telegram_mock::*;
pub use test_context::*;
pub use test_data::*;
