//! Thread directory — the sidebar's list of threads and its lifecycle.

use std::cell::RefCell;
use std::rc::Rc;
use chat_types::{
    Result,
    thread::{Thread, ThreadId},
};
use crate::feed::MessageFeed;
use crate::ports::DocumentStore;

pub struct ThreadDirectory {
    store: Rc<dyn DocumentStore>,
    feed: MessageFeed,
    threads: RefCell<Vec<Thread>>,
}

impl ThreadDirectory {
    pub fn new(store: Rc<dyn DocumentStore>) -> Self {
        let feed = MessageFeed::new(store.clone());
        Self {
            store,
            feed,
            threads: RefCell::new(Vec::new()),
        }
    }

    /// Replace the in-memory list with the store's. Order is the store's
    /// (unsorted). Read errors propagate and leave the list untouched.
    pub async fn load(&self) -> Result<Vec<Thread>> {
        let threads = self.store.list_threads().await?;
        *self.threads.borrow_mut() = threads.clone();
        log::info!(
            "Loaded {} thread(s) from {}",
            threads.len(),
            self.store.backend_name()
        );
        Ok(threads)
    }

    /// Write a new empty thread and append it to the list
    pub async fn create(&self) -> Result<Thread> {
        let id = ThreadId::generate();
        self.store.create_thread(&id).await?;
        let thread = Thread::new(id);
        self.threads.borrow_mut().push(thread.clone());
        Ok(thread)
    }

    /// Delete a thread's messages, then the thread record.
    ///
    /// Children go first: the store does not cascade, so removing the parent
    /// first would strand its messages. On any failure the list is left as it
    /// was and the error is logged and returned.
    pub async fn delete(&self, id: &ThreadId) -> Result<()> {
        let result = async {
            let removed = self.feed.delete_all_messages(id).await?;
            self.store.delete_thread(id).await?;
            Ok::<usize, chat_types::ChatError>(removed)
        }
        .await;

        match result {
            Ok(removed) => {
                self.threads.borrow_mut().retain(|t| &t.id != id);
                log::info!("Deleted chat {} ({} message(s))", id, removed);
                Ok(())
            }
            Err(e) => {
                log::error!("Error deleting chat {}: {}", id, e);
                Err(e)
            }
        }
    }

    pub fn threads(&self) -> Vec<Thread> {
        self.threads.borrow().clone()
    }
}
