use std::fmt;
use serde::{Deserialize, Serialize};

const THREAD_ID_PREFIX: &str = "chat-";

/// Identifier of a chat thread, e.g. `chat-1718000000000`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThreadId(String);

impl ThreadId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh timestamp-based id. Two calls within the same millisecond collide.
    pub fn generate() -> Self {
        Self::from_millis(chrono::Utc::now().timestamp_millis())
    }

    pub fn from_millis(millis: i64) -> Self {
        Self(format!("{}{}", THREAD_ID_PREFIX, millis))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ThreadId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ThreadId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A chat thread. Carries nothing beyond its id; messages live under it in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    pub id: ThreadId,
}

impl Thread {
    pub fn new(id: ThreadId) -> Self {
        Self { id }
    }
}
