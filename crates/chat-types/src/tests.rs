#[cfg(test)]
mod tests {
    use crate::config::*;
    use crate::error::*;
    use crate::event::*;
    use crate::message::*;
    use crate::thread::*;
    use chrono::{TimeZone, Utc};

    // ─── Thread Tests ────────────────────────────────────────

    #[test]
    fn test_thread_id_from_millis() {
        let id = ThreadId::from_millis(1718000000000);
        assert_eq!(id.as_str(), "chat-1718000000000");
        assert_eq!(id.to_string(), "chat-1718000000000");
    }

    #[test]
    fn test_thread_id_generate_has_prefix() {
        let id = ThreadId::generate();
        assert!(id.as_str().starts_with("chat-"));
        let millis: i64 = id.as_str()["chat-".len()..].parse().unwrap();
        assert!(millis > 0);
    }

    #[test]
    fn test_thread_id_serializes_as_plain_string() {
        let thread = Thread::new(ThreadId::from("chat-1"));
        let json = serde_json::to_string(&thread).unwrap();
        assert_eq!(json, r#"{"id":"chat-1"}"#);
    }

    // ─── Message Tests ───────────────────────────────────────

    #[test]
    fn test_sender_serialization() {
        assert_eq!(serde_json::to_string(&Sender::User).unwrap(), r#""user""#);
        assert_eq!(serde_json::to_string(&Sender::Assistant).unwrap(), r#""assistant""#);

        let sender: Sender = serde_json::from_str(r#""assistant""#).unwrap();
        assert_eq!(sender, Sender::Assistant);
    }

    #[test]
    fn test_sender_labels() {
        assert_eq!(Sender::User.label(), "You");
        assert_eq!(Sender::Assistant.label(), "Assistant");
        assert_eq!(Sender::User.as_str(), "user");
    }

    #[test]
    fn test_draft_into_message() {
        let at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let msg = MessageDraft::user("hi").into_message("m1", at);
        assert_eq!(msg.id, "m1");
        assert_eq!(msg.text, "hi");
        assert_eq!(msg.sender, Sender::User);
        assert_eq!(msg.created_at, at);
    }

    #[test]
    fn test_message_uses_created_at_field_name() {
        let at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let msg = MessageDraft::assistant("hello").into_message("m1", at);
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("createdAt"));
        assert!(json.contains(r#""sender":"assistant""#));
    }

    #[test]
    fn test_new_message_ids_are_unique() {
        assert_ne!(new_message_id(), new_message_id());
    }

    // ─── Event Tests ─────────────────────────────────────────

    #[test]
    fn test_epoch_next_is_monotonic() {
        let e = Epoch::default();
        assert_eq!(e, Epoch(0));
        assert!(e.next() > e);
        assert_eq!(e.next().next(), Epoch(2));
    }

    #[test]
    fn test_link_state_labels() {
        assert_eq!(LinkState::Open.label(), "Connected");
        assert_ne!(LinkState::Connecting.label(), LinkState::Closed.label());
    }

    #[test]
    fn test_chat_event_serialization() {
        let event = ChatEvent::SendFailed {
            text: "hi".to_string(),
            reason: "link dropped".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("SendFailed"));
        assert!(json.contains("link dropped"));
    }

    // ─── Config Tests ────────────────────────────────────────

    #[test]
    fn test_default_config() {
        let config = ChatConfig::default();
        assert_eq!(config.assistant.endpoint, DEFAULT_ASSISTANT_ENDPOINT);
        assert_eq!(config.assistant.reply_timeout_ms, DEFAULT_REPLY_TIMEOUT_MS);
        assert_eq!(config.storage.backend, StorageBackendType::Auto);
        assert!(config.assistant.validate().is_ok());
    }

    #[test]
    fn test_config_rejects_http_endpoint() {
        let config = AssistantConfig {
            endpoint: "https://example.com".to_string(),
            ..AssistantConfig::default()
        };
        assert!(matches!(config.validate(), Err(ChatError::Config(_))));
    }

    #[test]
    fn test_config_rejects_zero_timeout() {
        let config = AssistantConfig {
            reply_timeout_ms: 0,
            ..AssistantConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_deserializes() {
        let json = r#"{
            "assistant": {"endpoint": "ws://localhost:8000/ws", "reply_timeout_ms": 500},
            "storage": {"backend": "Memory"}
        }"#;
        let config: ChatConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.assistant.endpoint, "ws://localhost:8000/ws");
        assert_eq!(config.storage.backend, StorageBackendType::Memory);
    }

    // ─── Error Tests ─────────────────────────────────────────

    #[test]
    fn test_error_display() {
        let err = ChatError::Store("permission denied".to_string());
        assert_eq!(err.to_string(), "Store error: permission denied");

        let err = ChatError::NotConnected;
        assert_eq!(err.to_string(), "Assistant link is not open");

        let err = ChatError::JsInterop("No window object".to_string());
        assert_eq!(err.to_string(), "JS interop error: No window object");
    }

    #[test]
    fn test_error_from_serde() {
        let serde_err = serde_json::from_str::<serde_json::Value>("{{invalid}}").unwrap_err();
        let err: ChatError = serde_err.into();
        assert!(matches!(err, ChatError::Serialization(_)));
    }
}
