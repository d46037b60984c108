//! Message feed — live, ordered view of one thread's messages.
//!
//! The feed is a materialized snapshot: every change re-delivers the full
//! ordered list. Ordering comes from the store's query, never from local
//! sorting.

use std::rc::Rc;
use chat_types::{
    Result,
    message::{ChatMessage, MessageDraft, Sender},
    thread::ThreadId,
};
use crate::ports::{DocumentStore, SnapshotListener, Subscription};

#[derive(Clone)]
pub struct MessageFeed {
    store: Rc<dyn DocumentStore>,
}

impl MessageFeed {
    pub fn new(store: Rc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Start a live subscription. The caller owns the handle and must drop
    /// or unsubscribe it before subscribing to another thread.
    pub async fn subscribe(
        &self,
        thread: &ThreadId,
        listener: SnapshotListener,
    ) -> Result<Subscription> {
        self.store.subscribe_messages(thread, listener).await
    }

    /// Record a message. The local view is updated by the subscription,
    /// not by this call.
    pub async fn append_message(
        &self,
        thread: &ThreadId,
        text: &str,
        sender: Sender,
    ) -> Result<ChatMessage> {
        let draft = MessageDraft {
            text: text.to_string(),
            sender,
        };
        self.store.add_message(thread, draft).await
    }

    /// Delete every message currently under `thread`.
    /// Messages written while this runs may survive.
    pub async fn delete_all_messages(&self, thread: &ThreadId) -> Result<usize> {
        let ids = self.store.list_message_ids(thread).await?;
        let deletes = ids
            .iter()
            .map(|id| self.store.delete_message(thread, id));
        futures::future::try_join_all(deletes).await?;
        Ok(ids.len())
    }
}
