use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who wrote a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Assistant => "assistant",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Sender::User => "You",
            Sender::Assistant => "Assistant",
        }
    }
}

/// A recorded message. Immutable once the store has assigned `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub text: String,
    pub sender: Sender,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// A message as handed to the store, before it is stamped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDraft {
    pub text: String,
    pub sender: Sender,
}

impl MessageDraft {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::User,
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::Assistant,
        }
    }

    /// Stamp the draft into a stored message
    pub fn into_message(self, id: impl Into<String>, created_at: DateTime<Utc>) -> ChatMessage {
        ChatMessage {
            id: id.into(),
            text: self.text,
            sender: self.sender,
            created_at,
        }
    }
}

/// Generate a store-assigned message id
pub fn new_message_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
