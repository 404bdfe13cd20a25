//! Test data helpers for creating test messages and senders

use fake::faker::name::en::{FirstName, LastName};
use fake::faker::internet::en::Username;
use fake::Fake;
use minibot::models::{IncomingMessage, Sender};
use serde_json::json;
use teloxide::types::Message;

/// Bot token accepted by the mock API server
pub fn test_bot_token() -> String {
    "12345:test_token".to_string()
}

/// Sender with generated names and an English client locale
pub fn fake_sender(id: u64) -> Sender {
    Sender {
        id,
        username: Some(Username().fake()),
        first_name: Some(FirstName().fake()),
        last_name: Some(LastName().fake()),
        phone: None,
        language_code: Some("en".to_string()),
    }
}

/// Private-chat message; the chat id equals the user id as in Telegram
pub fn private_message(sender: &Sender, text: &str) -> IncomingMessage {
    IncomingMessage {
        chat_id: sender.id as i64,
        is_private: true,
        sender: Some(sender.clone()),
        text: Some(text.to_string()),
    }
}

pub fn group_message(sender: &Sender, text: &str) -> IncomingMessage {
    IncomingMessage {
        chat_id: -1001234567890,
        is_private: false,
        sender: Some(sender.clone()),
        text: Some(text.to_string()),
    }
}

/// Raw Bot API message, as the dispatcher would receive it
pub fn telegram_private_message(user_id: u64, first_name: &str, text: &str) -> Message {
    serde_json::from_value(json!({
        "message_id": 1,
        "date": 1_700_000_000,
        "chat": {
            "id": user_id,
            "type": "private",
            "first_name": first_name
        },
        "from": {
            "id": user_id,
            "is_bot": false,
            "first_name": first_name,
            "language_code": "uk"
        },
        "text": text
    }))
    .expect("valid message JSON")
}
