//! Chat session — selection, live feed, assistant link and the send gate.
//!
//! Flow for one round trip:
//! 1. `send` records the user message through the feed, then transmits it
//! 2. the link's inbound frame is parsed and recorded as an assistant message
//! 3. the store's live query re-delivers the thread's full ordered list
//! 4. the pending flag is released, enabling the next send
//!
//! Every selection gets a fresh [`Epoch`]. Snapshots, inbound frames and
//! close notices carry the epoch they were started under and are dropped
//! once a newer selection exists, so a torn-down thread can never write
//! into the one that replaced it.
//!
//! The session is clone-cheap and never holds a `RefCell` borrow across an
//! `.await`; async tasks spawned by the app each hold a clone.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use futures::StreamExt;
use chat_types::{
    Result,
    config::AssistantConfig,
    event::{ChatEvent, Epoch, LinkState},
    message::{ChatMessage, Sender},
    thread::{Thread, ThreadId},
};
use crate::directory::ThreadDirectory;
use crate::event_bus::EventBus;
use crate::feed::MessageFeed;
use crate::link::{parse_reply, AssistantLink};
use crate::ports::{AssistantTransport, DocumentStore, InboundStream, LinkFrame, SnapshotListener, Subscription};

#[derive(Clone)]
pub struct ChatSession {
    inner: Rc<SessionInner>,
}

struct SessionInner {
    config: AssistantConfig,
    transport: Rc<dyn AssistantTransport>,
    directory: ThreadDirectory,
    feed: MessageFeed,
    event_bus: EventBus,
    state: RefCell<SessionState>,
}

struct SessionState {
    epoch: Epoch,
    selection: Option<Selection>,
    messages: Vec<ChatMessage>,
    pending: Option<PendingSend>,
    next_token: u64,
    last_failed: Option<String>,
}

struct Selection {
    thread: ThreadId,
    subscription: Option<Subscription>,
    link: AssistantLink,
}

/// The single in-flight user → assistant round trip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSend {
    pub token: u64,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Recorded and transmitted; the reply is awaited under `token`
    Sent { token: u64 },
    /// Nothing was written or transmitted
    Skipped(SkipReason),
    /// The user message was recorded but the thread was switched away
    /// before it could be transmitted
    Abandoned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    EmptyInput,
    NoSelection,
    Pending,
    NotConnected,
    NothingToRetry,
}

impl ChatSession {
    pub fn new(
        config: AssistantConfig,
        store: Rc<dyn DocumentStore>,
        transport: Rc<dyn AssistantTransport>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            inner: Rc::new(SessionInner {
                config,
                transport,
                directory: ThreadDirectory::new(store.clone()),
                feed: MessageFeed::new(store),
                event_bus,
                state: RefCell::new(SessionState {
                    epoch: Epoch::default(),
                    selection: None,
                    messages: Vec::new(),
                    pending: None,
                    next_token: 0,
                    last_failed: None,
                }),
            }),
        }
    }

    // ─── Read accessors ──────────────────────────────────────

    pub fn threads(&self) -> Vec<Thread> {
        self.inner.directory.threads()
    }

    pub fn selected(&self) -> Option<ThreadId> {
        self.inner
            .state
            .borrow()
            .selection
            .as_ref()
            .map(|s| s.thread.clone())
    }

    /// Latest snapshot of the selected thread, in store order
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.inner.state.borrow().messages.clone()
    }

    pub fn pending(&self) -> Option<PendingSend> {
        self.inner.state.borrow().pending.clone()
    }

    pub fn is_pending(&self) -> bool {
        self.inner.state.borrow().pending.is_some()
    }

    pub fn link_state(&self) -> LinkState {
        self.inner
            .state
            .borrow()
            .selection
            .as_ref()
            .map(|s| s.link.state())
            .unwrap_or(LinkState::Disconnected)
    }

    pub fn can_send(&self) -> bool {
        !self.is_pending() && self.link_state() == LinkState::Open
    }

    pub fn current_epoch(&self) -> Epoch {
        self.inner.state.borrow().epoch
    }

    pub fn is_current(&self, epoch: Epoch) -> bool {
        self.current_epoch() == epoch
    }

    /// Text of the last send that failed or timed out
    pub fn last_failed(&self) -> Option<String> {
        self.inner.state.borrow().last_failed.clone()
    }

    pub fn reply_timeout_ms(&self) -> u64 {
        self.inner.config.reply_timeout_ms
    }

    // ─── Thread directory ────────────────────────────────────

    /// One-shot listing at startup
    pub async fn load_threads(&self) -> Result<Vec<Thread>> {
        let threads = self.inner.directory.load().await?;
        self.emit(ChatEvent::ThreadsLoaded {
            threads: threads.clone(),
        });
        Ok(threads)
    }

    /// Create a thread and select it. The returned pump, if any, must be
    /// driven to receive assistant replies.
    pub async fn create_thread(&self) -> Result<(Thread, Option<LinkPump>)> {
        let thread = self.inner.directory.create().await?;
        self.emit(ChatEvent::ThreadCreated {
            thread: thread.clone(),
        });
        let pump = self.select_thread(Some(thread.id.clone())).await?;
        Ok((thread, pump))
    }

    /// Delete a thread (messages first). Clears the selection if it was the
    /// selected one. On failure nothing local changes.
    pub async fn delete_thread(&self, id: &ThreadId) -> Result<()> {
        if let Err(e) = self.inner.directory.delete(id).await {
            self.emit(ChatEvent::Error {
                message: format!("Failed to delete {}: {}", id, e),
            });
            return Err(e);
        }
        self.emit(ChatEvent::ThreadDeleted { id: id.clone() });

        if self.selected().as_ref() == Some(id) {
            self.teardown_selection();
            self.emit(ChatEvent::SelectionChanged { selected: None });
        }
        Ok(())
    }

    // ─── Selection ───────────────────────────────────────────

    /// Switch to `thread` (or to nothing).
    ///
    /// The previous subscription and connection are torn down before
    /// anything new is opened. Selecting the current thread again reconnects.
    pub async fn select_thread(&self, thread: Option<ThreadId>) -> Result<Option<LinkPump>> {
        let epoch = self.teardown_selection();

        let Some(thread) = thread else {
            self.emit(ChatEvent::SelectionChanged { selected: None });
            return Ok(None);
        };

        {
            let mut state = self.inner.state.borrow_mut();
            let mut link = AssistantLink::new();
            link.begin_connect();
            state.selection = Some(Selection {
                thread: thread.clone(),
                subscription: None,
                link,
            });
        }
        self.emit(ChatEvent::SelectionChanged {
            selected: Some(thread.clone()),
        });
        self.emit(ChatEvent::LinkStateChanged {
            thread: thread.clone(),
            state: LinkState::Connecting,
        });

        // Feed first, so replies to this selection always have a listener
        let listener = self.snapshot_listener(epoch, thread.clone());
        let subscription = match self.inner.feed.subscribe(&thread, listener).await {
            Ok(s) => s,
            Err(e) => {
                log::error!("Failed to subscribe to {}: {}", thread, e);
                self.close_link_if_current(epoch, &thread);
                return Err(e);
            }
        };
        let stale = {
            let mut state = self.inner.state.borrow_mut();
            let current = state.epoch == epoch;
            match state.selection.as_mut() {
                Some(sel) if current => {
                    sel.subscription = Some(subscription);
                    None
                }
                _ => Some(subscription),
            }
        };
        if let Some(subscription) = stale {
            log::debug!("Selection of {} superseded during subscribe", thread);
            subscription.unsubscribe();
            return Ok(None);
        }

        let endpoint = self.inner.config.endpoint.clone();
        let connection = match self.inner.transport.connect(&endpoint).await {
            Ok(c) => c,
            Err(e) => {
                log::warn!("Assistant link for {} failed to open: {}", thread, e);
                self.close_link_if_current(epoch, &thread);
                return Err(e);
            }
        };

        let opened = {
            let mut state = self.inner.state.borrow_mut();
            let current = state.epoch == epoch;
            match state.selection.as_mut() {
                Some(sel) if current => Ok(sel.link.opened(connection)),
                _ => Err(connection),
            }
        };
        let inbound = match opened {
            Ok(inbound) => inbound,
            Err(mut connection) => {
                log::debug!("Selection of {} superseded during connect", thread);
                connection.close();
                return Ok(None);
            }
        };
        log::info!("WebSocket connected");
        self.emit(ChatEvent::LinkStateChanged {
            thread: thread.clone(),
            state: LinkState::Open,
        });

        Ok(inbound.map(|inbound| LinkPump {
            session: self.clone(),
            epoch,
            inbound,
        }))
    }

    /// End the session: unsubscribe and close the link
    pub fn shutdown(&self) {
        self.teardown_selection();
    }

    // ─── Sending ─────────────────────────────────────────────

    /// Record `text` as a user message and transmit it.
    ///
    /// Silently skipped while a send is pending, while the link is not open,
    /// with no selection, or for blank input.
    pub async fn send(&self, text: &str) -> Result<SendOutcome> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(SendOutcome::Skipped(SkipReason::EmptyInput));
        }

        let (thread, epoch, token) = {
            let mut state = self.inner.state.borrow_mut();
            let (thread, open) = match state.selection.as_ref() {
                Some(sel) => (sel.thread.clone(), sel.link.is_open()),
                None => return Ok(SendOutcome::Skipped(SkipReason::NoSelection)),
            };
            if state.pending.is_some() {
                return Ok(SendOutcome::Skipped(SkipReason::Pending));
            }
            if !open {
                return Ok(SendOutcome::Skipped(SkipReason::NotConnected));
            }
            state.next_token += 1;
            let token = state.next_token;
            state.pending = Some(PendingSend {
                token,
                text: text.to_string(),
            });
            state.last_failed = None;
            (thread, state.epoch, token)
        };
        self.emit(ChatEvent::SendStarted { token });

        if let Err(e) = self
            .inner
            .feed
            .append_message(&thread, text, Sender::User)
            .await
        {
            self.fail_pending(token, &e.to_string());
            return Err(e);
        }

        let sent = {
            let state = self.inner.state.borrow();
            match state.selection.as_ref() {
                Some(sel) if state.epoch == epoch => sel.link.send(text),
                _ => return Ok(SendOutcome::Abandoned),
            }
        };
        self.emit(ChatEvent::MessageRecorded {
            thread,
            text: text.to_string(),
        });
        match sent {
            Ok(()) => Ok(SendOutcome::Sent { token }),
            Err(e) => {
                self.fail_pending(token, &e.to_string());
                Err(e)
            }
        }
    }

    /// Send the text of the last failed or timed-out send again
    pub async fn retry(&self) -> Result<SendOutcome> {
        match self.last_failed() {
            Some(text) => self.send(&text).await,
            None => Ok(SendOutcome::Skipped(SkipReason::NothingToRetry)),
        }
    }

    /// Release the pending flag if `token` is still waiting for its reply.
    /// Returns whether anything was released.
    pub fn expire_pending(&self, token: u64) -> bool {
        let expired = {
            let mut state = self.inner.state.borrow_mut();
            match state.pending.take() {
                Some(p) if p.token == token => {
                    state.last_failed = Some(p.text.clone());
                    Some(p.text)
                }
                other => {
                    state.pending = other;
                    None
                }
            }
        };
        match expired {
            Some(text) => {
                log::warn!("No assistant reply within {}ms", self.reply_timeout_ms());
                self.emit(ChatEvent::ReplyTimedOut { text });
                true
            }
            None => false,
        }
    }

    // ─── Inbound ─────────────────────────────────────────────

    /// Record an inbound payload from the link opened under `epoch`
    pub async fn handle_inbound(&self, epoch: Epoch, payload: &str) {
        let thread = {
            let state = self.inner.state.borrow();
            match state.selection.as_ref() {
                Some(sel) if state.epoch == epoch => sel.thread.clone(),
                _ => {
                    log::debug!("Dropping reply from superseded link ({:?})", epoch);
                    return;
                }
            }
        };

        let reply = parse_reply(payload);
        if let Err(e) = self
            .inner
            .feed
            .append_message(&thread, &reply, Sender::Assistant)
            .await
        {
            log::error!("Failed to record assistant reply in {}: {}", thread, e);
            if let Some(token) = self.pending_token_if_current(epoch) {
                self.fail_pending(token, &e.to_string());
            }
            return;
        }

        let current = {
            let mut state = self.inner.state.borrow_mut();
            if state.epoch == epoch {
                state.pending = None;
                true
            } else {
                false
            }
        };
        // A reply that outlived its selection must not release a newer send
        if current {
            self.emit(ChatEvent::ReplyRecorded { thread });
        } else {
            log::debug!("Reply recorded in {} after it was deselected", thread);
        }
    }

    /// The link opened under `epoch` ended
    pub fn handle_link_closed(&self, epoch: Epoch, reason: Option<String>) {
        let thread = {
            let mut state = self.inner.state.borrow_mut();
            if state.epoch != epoch {
                return;
            }
            match state.selection.as_mut() {
                Some(sel) => {
                    sel.link.mark_closed();
                    sel.thread.clone()
                }
                None => return,
            }
        };
        let reason = reason.unwrap_or_else(|| "connection closed".to_string());
        log::warn!("Assistant link for {} closed: {}", thread, reason);
        self.emit(ChatEvent::LinkStateChanged {
            thread,
            state: LinkState::Closed,
        });
        if let Some(token) = self.pending_token_if_current(epoch) {
            self.fail_pending(token, &reason);
        }
    }

    // ─── Internals ───────────────────────────────────────────

    fn emit(&self, event: ChatEvent) {
        self.inner.event_bus.emit(event);
    }

    /// Bump the epoch and drop the current selection (unsubscribe + close).
    /// Returns the new epoch.
    fn teardown_selection(&self) -> Epoch {
        let (epoch, previous) = {
            let mut state = self.inner.state.borrow_mut();
            state.epoch = state.epoch.next();
            state.pending = None;
            state.messages.clear();
            (state.epoch, state.selection.take())
        };
        // Drop outside the borrow: unsubscribing calls back into the store
        if let Some(mut sel) = previous {
            if let Some(sub) = sel.subscription.take() {
                sub.unsubscribe();
            }
            sel.link.close();
            log::info!("Closed selection {}", sel.thread);
        }
        epoch
    }

    fn close_link_if_current(&self, epoch: Epoch, thread: &ThreadId) {
        let closed = {
            let mut state = self.inner.state.borrow_mut();
            let current = state.epoch == epoch;
            match state.selection.as_mut() {
                Some(sel) if current => {
                    sel.link.close();
                    true
                }
                _ => false,
            }
        };
        if closed {
            self.emit(ChatEvent::LinkStateChanged {
                thread: thread.clone(),
                state: LinkState::Closed,
            });
        }
    }

    fn pending_token_if_current(&self, epoch: Epoch) -> Option<u64> {
        let state = self.inner.state.borrow();
        if state.epoch != epoch {
            return None;
        }
        state.pending.as_ref().map(|p| p.token)
    }

    fn fail_pending(&self, token: u64, reason: &str) {
        let failed = {
            let mut state = self.inner.state.borrow_mut();
            match state.pending.take() {
                Some(p) if p.token == token => {
                    state.last_failed = Some(p.text.clone());
                    Some(p.text)
                }
                other => {
                    state.pending = other;
                    None
                }
            }
        };
        if let Some(text) = failed {
            self.emit(ChatEvent::SendFailed {
                text,
                reason: reason.to_string(),
            });
        }
    }

    fn snapshot_listener(&self, epoch: Epoch, thread: ThreadId) -> SnapshotListener {
        let weak: Weak<SessionInner> = Rc::downgrade(&self.inner);
        Rc::new(move |messages: Vec<ChatMessage>| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            {
                let mut state = inner.state.borrow_mut();
                if state.epoch != epoch {
                    log::debug!("Dropping snapshot for superseded {}", thread);
                    return;
                }
                state.messages = messages.clone();
            }
            inner.event_bus.emit(ChatEvent::FeedUpdated {
                thread: thread.clone(),
                messages,
            });
        })
    }
}

/// Drives one connection's inbound stream into the session.
/// Returned by selection; the caller spawns [`LinkPump::run`].
pub struct LinkPump {
    session: ChatSession,
    epoch: Epoch,
    inbound: InboundStream,
}

impl LinkPump {
    /// Runs until the connection ends or its selection is superseded
    pub async fn run(mut self) {
        while let Some(frame) = self.inbound.next().await {
            if !self.session.is_current(self.epoch) {
                log::debug!("Link pump for {:?} superseded", self.epoch);
                return;
            }
            match frame {
                LinkFrame::Text(payload) => {
                    self.session.handle_inbound(self.epoch, &payload).await;
                }
                LinkFrame::Closed { reason } => {
                    self.session.handle_link_closed(self.epoch, reason);
                    return;
                }
            }
        }
        self.session.handle_link_closed(self.epoch, None);
    }
}
