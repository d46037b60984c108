//! Port traits — the hexagonal architecture boundary.
//!
//! These traits are defined here in `chat-core` (pure Rust).
//! Implementations live in `chat-platform` (browser adapters).
//! The core never imports platform code; it only depends on these traits.

use std::pin::Pin;
use std::rc::Rc;
use async_trait::async_trait;
use futures::Stream;
use chat_types::{
    Result,
    message::{ChatMessage, MessageDraft},
    thread::{Thread, ThreadId},
};

// ─── Document Store Port ─────────────────────────────────────

/// Receives the complete ordered message list of a thread, once on
/// subscribe and again after every change.
pub type SnapshotListener = Rc<dyn Fn(Vec<ChatMessage>)>;

/// Handle to a live subscription. Dropping it unsubscribes.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Stop receiving snapshots. Takes effect before this call returns.
    pub fn unsubscribe(mut self) {
        self.cancel_now();
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

/// Hosted document store holding `chats/{thread}` records and their
/// `chats/{thread}/messages/{message}` children.
#[async_trait(?Send)]
pub trait DocumentStore {
    /// One-shot listing of every thread. Order is unspecified.
    async fn list_threads(&self) -> Result<Vec<Thread>>;

    /// Write an empty thread record
    async fn create_thread(&self, id: &ThreadId) -> Result<()>;

    /// Remove the thread record only. Messages under it are not touched.
    async fn delete_thread(&self, id: &ThreadId) -> Result<()>;

    /// Record a message; the store assigns its id and creation stamp
    async fn add_message(&self, thread: &ThreadId, draft: MessageDraft) -> Result<ChatMessage>;

    /// One-shot listing of the message ids under a thread
    async fn list_message_ids(&self, thread: &ThreadId) -> Result<Vec<String>>;

    async fn delete_message(&self, thread: &ThreadId, message_id: &str) -> Result<()>;

    /// Live query over a thread's messages ordered by creation stamp.
    /// The current snapshot is delivered before this returns.
    async fn subscribe_messages(
        &self,
        thread: &ThreadId,
        listener: SnapshotListener,
    ) -> Result<Subscription>;

    /// Name of this backend (for logging/debug)
    fn backend_name(&self) -> &str;
}

// ─── Storage Port ────────────────────────────────────────────

#[async_trait(?Send)]
pub trait StoragePort {
    /// Get a value by key
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Set a value
    async fn set(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Delete a value
    async fn delete(&self, key: &str) -> Result<()>;

    /// List keys with a given prefix
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>>;

    /// Check if a key exists
    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }

    /// Name of this backend (for logging/debug)
    fn backend_name(&self) -> &str;
}

// ─── Assistant Transport Port ────────────────────────────────

/// Inbound traffic on an assistant connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkFrame {
    /// A raw payload from the assistant
    Text(String),
    /// The connection ended. Always the last item of the stream.
    Closed { reason: Option<String> },
}

pub type InboundStream = Pin<Box<dyn Stream<Item = LinkFrame>>>;

/// An open duplex connection to the assistant
pub trait LinkConnection {
    /// Transmit raw text. Fire-and-forget: returns once queued.
    fn send(&self, text: &str) -> Result<()>;

    /// Take the inbound stream. Returns `None` after the first call.
    fn take_inbound(&mut self) -> Option<InboundStream>;

    /// Close the connection. Idempotent.
    fn close(&mut self);
}

#[async_trait(?Send)]
pub trait AssistantTransport {
    /// Open a connection and wait for the handshake to finish
    async fn connect(&self, endpoint: &str) -> Result<Box<dyn LinkConnection>>;
}
