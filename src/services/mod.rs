//! Services module
//!
//! Outbound delivery and the greeting flow built on top of it

pub mod client;
pub mod welcome;

pub use client::{ChatClient, DeliveryError, TelegramClient};
pub use welcome::WelcomeService;
