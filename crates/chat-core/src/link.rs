//! Assistant link — the per-selection connection to the assistant.
//!
//! State machine: `Disconnected → Connecting → Open → Closed`.
//! A link is owned by exactly one selection and is closed before any
//! newer link opens.

use chat_types::{
    ChatError, Result,
    event::LinkState,
};
use serde_json::Value;
use crate::ports::{InboundStream, LinkConnection};

/// Recorded when a structured payload carries no usable `reply`
pub const FALLBACK_REPLY: &str = "Sorry, I couldn't process that.";

pub struct AssistantLink {
    state: LinkState,
    connection: Option<Box<dyn LinkConnection>>,
}

impl AssistantLink {
    pub fn new() -> Self {
        Self {
            state: LinkState::Disconnected,
            connection: None,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == LinkState::Open
    }

    pub fn begin_connect(&mut self) {
        self.state = LinkState::Connecting;
    }

    /// Handshake finished: adopt the connection and hand back its inbound stream
    pub fn opened(&mut self, mut connection: Box<dyn LinkConnection>) -> Option<InboundStream> {
        let inbound = connection.take_inbound();
        self.connection = Some(connection);
        self.state = LinkState::Open;
        inbound
    }

    /// Transmit raw text. Only valid while open; nothing is queued.
    pub fn send(&self, text: &str) -> Result<()> {
        match (&self.connection, self.state) {
            (Some(conn), LinkState::Open) => conn.send(text),
            _ => Err(ChatError::NotConnected),
        }
    }

    /// The remote side went away
    pub fn mark_closed(&mut self) {
        self.connection = None;
        self.state = LinkState::Closed;
    }

    /// Close our side. Idempotent.
    pub fn close(&mut self) {
        if let Some(mut conn) = self.connection.take() {
            conn.close();
        }
        self.state = LinkState::Closed;
    }
}

impl Default for AssistantLink {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for AssistantLink {
    fn drop(&mut self) {
        self.close();
    }
}

/// Turn an inbound payload into the text recorded for the assistant.
///
/// JSON with a truthy `reply` yields that reply; JSON without one yields
/// [`FALLBACK_REPLY`]; anything that is not JSON is returned verbatim.
pub fn parse_reply(payload: &str) -> String {
    let data: Value = match serde_json::from_str(payload) {
        Ok(v) => v,
        Err(_) => return payload.to_string(),
    };

    match data.get("reply") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(v) if is_truthy(v) => v.to_string(),
        _ => FALLBACK_REPLY.to_string(),
    }
}

fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
