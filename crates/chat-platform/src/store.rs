//! Chat document store, built on top of StoragePort.
//!
//! Maps the hosted document layout onto storage keys:
//!   thread  `chats/{thread}`                     → `{}`
//!   message `chats/{thread}/messages/{message}`  → `{"text","sender","createdAt"}`
//!
//! Deleting a thread record leaves its messages in place, like the hosted
//! store. Live queries are served by re-reading the thread after each write
//! and pushing the full ordered list to every listener of that thread.
//! Every write bumps a per-thread revision; a snapshot whose read overlapped a
//! newer write is dropped (or re-read, for a first snapshot) so listeners never
//! end on a stale list.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use chat_core::ports::{DocumentStore, SnapshotListener, StoragePort, Subscription};
use chat_types::{
    Result,
    message::{new_message_id, ChatMessage, MessageDraft, Sender},
    thread::{Thread, ThreadId},
};

const CHATS_PREFIX: &str = "chats/";
const MESSAGES_SEGMENT: &str = "messages";
const EMPTY_RECORD: &[u8] = b"{}";

#[derive(Debug, Serialize, Deserialize)]
struct MessageRecord {
    text: String,
    sender: Sender,
    #[serde(rename = "createdAt")]
    created_at: DateTime<Utc>,
}

struct Listener {
    id: u64,
    thread: ThreadId,
    callback: SnapshotListener,
}

type Listeners = Rc<RefCell<Vec<Listener>>>;

pub struct StorageDocumentStore {
    storage: Rc<dyn StoragePort>,
    listeners: Listeners,
    next_listener: Cell<u64>,
    last_stamp: Cell<Option<DateTime<Utc>>>,
    revisions: RefCell<HashMap<ThreadId, u64>>,
}

impl StorageDocumentStore {
    pub fn new(storage: Rc<dyn StoragePort>) -> Self {
        Self {
            storage,
            listeners: Rc::new(RefCell::new(Vec::new())),
            next_listener: Cell::new(0),
            last_stamp: Cell::new(None),
            revisions: RefCell::new(HashMap::new()),
        }
    }

    /// Number of live subscriptions on `thread`
    pub fn listener_count(&self, thread: &ThreadId) -> usize {
        self.listeners
            .borrow()
            .iter()
            .filter(|l| &l.thread == thread)
            .count()
    }

    fn thread_key(id: &ThreadId) -> String {
        format!("{}{}", CHATS_PREFIX, id)
    }

    fn messages_prefix(id: &ThreadId) -> String {
        format!("{}{}/{}/", CHATS_PREFIX, id, MESSAGES_SEGMENT)
    }

    fn message_key(id: &ThreadId, message_id: &str) -> String {
        format!("{}{}", Self::messages_prefix(id), message_id)
    }

    /// Wall clock, bumped so stamps from this store strictly increase
    fn next_stamp(&self) -> DateTime<Utc> {
        let now = Utc::now();
        let stamp = match self.last_stamp.get() {
            Some(last) if now <= last => last + Duration::milliseconds(1),
            _ => now,
        };
        self.last_stamp.set(Some(stamp));
        stamp
    }

    fn revision(&self, thread: &ThreadId) -> u64 {
        self.revisions.borrow().get(thread).copied().unwrap_or(0)
    }

    fn bump_revision(&self, thread: &ThreadId) {
        *self.revisions.borrow_mut().entry(thread.clone()).or_insert(0) += 1;
    }

    /// Every readable message of a thread ordered by creation stamp
    async fn load_messages(&self, thread: &ThreadId) -> Result<Vec<ChatMessage>> {
        let prefix = Self::messages_prefix(thread);
        let keys = self.storage.list_keys(&prefix).await?;

        let mut messages = Vec::with_capacity(keys.len());
        for key in keys {
            let Some(bytes) = self.storage.get(&key).await? else {
                continue;
            };
            let id = key.strip_prefix(&prefix).unwrap_or(&key).to_string();
            match serde_json::from_slice::<MessageRecord>(&bytes) {
                Ok(record) => messages.push(ChatMessage {
                    id,
                    text: record.text,
                    sender: record.sender,
                    created_at: record.created_at,
                }),
                Err(e) => log::warn!("Skipping unreadable message {}: {}", key, e),
            }
        }
        messages.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(messages)
    }

    /// Push the current snapshot of `thread` to its listeners
    async fn notify(&self, thread: &ThreadId) -> Result<()> {
        if self.listener_count(thread) == 0 {
            return Ok(());
        }
        let revision = self.revision(thread);
        let snapshot = self.load_messages(thread).await?;
        if self.revision(thread) != revision {
            // The newer write's own refresh delivers
            return Ok(());
        }
        // Clone out so callbacks may subscribe or unsubscribe
        let targets: Vec<SnapshotListener> = self
            .listeners
            .borrow()
            .iter()
            .filter(|l| &l.thread == thread)
            .map(|l| l.callback.clone())
            .collect();
        for callback in targets {
            callback(snapshot.clone());
        }
        Ok(())
    }
}

#[async_trait(?Send)]
impl DocumentStore for StorageDocumentStore {
    async fn list_threads(&self) -> Result<Vec<Thread>> {
        let keys = self.storage.list_keys(CHATS_PREFIX).await?;
        let threads = keys
            .iter()
            .filter_map(|k| k.strip_prefix(CHATS_PREFIX))
            .filter(|rest| !rest.is_empty() && !rest.contains('/'))
            .map(|id| Thread::new(ThreadId::from(id)))
            .collect();
        Ok(threads)
    }

    async fn create_thread(&self, id: &ThreadId) -> Result<()> {
        self.storage.set(&Self::thread_key(id), EMPTY_RECORD).await
    }

    async fn delete_thread(&self, id: &ThreadId) -> Result<()> {
        self.storage.delete(&Self::thread_key(id)).await
    }

    async fn add_message(&self, thread: &ThreadId, draft: MessageDraft) -> Result<ChatMessage> {
        let message = draft.into_message(new_message_id(), self.next_stamp());
        let record = MessageRecord {
            text: message.text.clone(),
            sender: message.sender,
            created_at: message.created_at,
        };
        let bytes = serde_json::to_vec(&record)?;
        self.storage
            .set(&Self::message_key(thread, &message.id), &bytes)
            .await?;
        self.bump_revision(thread);

        if let Err(e) = self.notify(thread).await {
            log::warn!("Live query refresh for {} failed: {}", thread, e);
        }
        Ok(message)
    }

    async fn list_message_ids(&self, thread: &ThreadId) -> Result<Vec<String>> {
        let prefix = Self::messages_prefix(thread);
        let keys = self.storage.list_keys(&prefix).await?;
        Ok(keys
            .iter()
            .map(|k| k.strip_prefix(&prefix).unwrap_or(k).to_string())
            .collect())
    }

    async fn delete_message(&self, thread: &ThreadId, message_id: &str) -> Result<()> {
        self.storage
            .delete(&Self::message_key(thread, message_id))
            .await?;
        self.bump_revision(thread);
        if let Err(e) = self.notify(thread).await {
            log::warn!("Live query refresh for {} failed: {}", thread, e);
        }
        Ok(())
    }

    async fn subscribe_messages(
        &self,
        thread: &ThreadId,
        listener: SnapshotListener,
    ) -> Result<Subscription> {
        // Register before reading so writes during the read are not missed
        let id = self.next_listener.get() + 1;
        self.next_listener.set(id);
        self.listeners.borrow_mut().push(Listener {
            id,
            thread: thread.clone(),
            callback: listener.clone(),
        });
        let subscription = {
            let listeners = Rc::downgrade(&self.listeners);
            Subscription::new(move || {
                if let Some(listeners) = listeners.upgrade() {
                    listeners.borrow_mut().retain(|l| l.id != id);
                }
            })
        };

        loop {
            let revision = self.revision(thread);
            // On error the subscription drops and unregisters
            let snapshot = self.load_messages(thread).await?;
            if self.revision(thread) == revision {
                listener(snapshot);
                break;
            }
        }
        Ok(subscription)
    }

    fn backend_name(&self) -> &str {
        self.storage.backend_name()
    }
}
