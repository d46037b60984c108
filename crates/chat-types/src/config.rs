use serde::{Deserialize, Serialize};

/// Hardcoded assistant endpoint used by the hosted deployment
pub const DEFAULT_ASSISTANT_ENDPOINT: &str =
    "wss://mobileprovider-aiagent-degjh6fcbnatcfcp.italynorth-01.azurewebsites.net/ws";

pub const DEFAULT_REPLY_TIMEOUT_MS: u64 = 30_000;

/// Top-level client configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatConfig {
    pub assistant: AssistantConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    pub endpoint: String,
    /// How long a send may wait for its reply before the pending flag is released
    pub reply_timeout_ms: u64,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ASSISTANT_ENDPOINT.to_string(),
            reply_timeout_ms: DEFAULT_REPLY_TIMEOUT_MS,
        }
    }
}

impl AssistantConfig {
    pub fn validate(&self) -> crate::Result<()> {
        if !(self.endpoint.starts_with("ws://") || self.endpoint.starts_with("wss://")) {
            return Err(crate::ChatError::Config(format!(
                "assistant endpoint must be a ws:// or wss:// url, got {:?}",
                self.endpoint
            )));
        }
        if self.reply_timeout_ms == 0 {
            return Err(crate::ChatError::Config(
                "reply_timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackendType,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackendType::Auto,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageBackendType {
    /// Auto-detect best available backend
    Auto,
    Memory,
    IndexedDb,
}
