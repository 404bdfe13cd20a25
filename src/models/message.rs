//! Inbound message model
//!
//! Transport-neutral view of an incoming chat event plus the user fields the
//! handlers derive from it.

use teloxide::types::{Message, User};

use crate::i18n::I18n;
use crate::models::session::UserProfile;
use crate::utils::dedup::DedupLogger;
use crate::utils::errors::Result;
use crate::utils::helpers::profile_link;

/// Author of an incoming message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sender {
    pub id: u64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub language_code: Option<String>,
}

/// Incoming chat event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncomingMessage {
    pub chat_id: i64,
    pub is_private: bool,
    pub sender: Option<Sender>,
    pub text: Option<String>,
}

impl IncomingMessage {
    /// Trimmed text, empty when the message carries none
    pub fn text(&self) -> &str {
        self.text.as_deref().map(str::trim).unwrap_or("")
    }

    /// Non-empty private text that is not a command
    pub fn is_plain_text(&self) -> bool {
        let text = self.text();
        self.is_private && !text.is_empty() && !text.starts_with(|c: char| c == '!' || c == '/')
    }

    /// True when the text is `!<name>` or `/<name>`, optionally with arguments
    pub fn is_command(&self, name: &str) -> bool {
        let text = self.text();
        let Some(rest) = text.strip_prefix('!').or_else(|| text.strip_prefix('/')) else {
            return false;
        };
        let command = rest.split_whitespace().next().unwrap_or("");
        // "/start@my_bot" addresses the bot explicitly in groups
        let command = command.split('@').next().unwrap_or(command);
        command.eq_ignore_ascii_case(name)
    }
}

impl From<&User> for Sender {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.0,
            username: user.username.clone(),
            first_name: Some(user.first_name.clone()).filter(|name| !name.is_empty()),
            last_name: user.last_name.clone(),
            phone: None,
            language_code: user.language_code.clone(),
        }
    }
}

impl From<&Message> for IncomingMessage {
    fn from(msg: &Message) -> Self {
        let sender = msg.from.as_ref().map(|user| {
            let mut sender = Sender::from(user);
            // The Bot API only reveals a phone number when the user shares their own contact
            sender.phone = msg
                .contact()
                .filter(|contact| contact.user_id == Some(user.id))
                .map(|contact| contact.phone_number.clone());
            sender
        });

        Self {
            chat_id: msg.chat.id.0,
            is_private: msg.chat.is_private(),
            sender,
            text: msg.text().map(str::to_string),
        }
    }
}

/// User fields derived from an incoming message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInfo {
    pub user_id: String,
    pub chat_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub link: Option<String>,
    pub message_text: String,
    pub message_text_lower: String,
    pub lang: String,
}

impl UserInfo {
    /// Derive user info from a message; `None` when the sender is unknown
    pub fn extract(message: &IncomingMessage, i18n: &I18n, log: &DedupLogger) -> Result<Option<Self>> {
        let Some(sender) = message.sender.as_ref() else {
            log.warn("Could not resolve the sender of an incoming message");
            return Ok(None);
        };

        let message_text = message.text().to_string();
        let lang = i18n.detect_user_language(sender.language_code.as_deref(), &message_text);

        Ok(Some(Self {
            user_id: sender.id.to_string(),
            chat_id: message.chat_id,
            username: sender.username.clone(),
            first_name: sender.first_name.clone(),
            last_name: sender.last_name.clone(),
            phone: sender.phone.clone(),
            link: profile_link(sender.username.as_deref())?,
            message_text_lower: message_text.to_lowercase(),
            message_text,
            lang,
        }))
    }

    /// Profile fields persisted with the session record
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            username: self.username.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            phone: self.phone.clone(),
            link: self.link.clone(),
            chat_id: Some(self.chat_id),
        }
    }

    /// Name used to address the user in messages
    pub fn display_name(&self) -> &str {
        self.first_name
            .as_deref()
            .or(self.username.as_deref())
            .unwrap_or("there")
    }
}
