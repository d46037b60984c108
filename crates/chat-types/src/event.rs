use serde::{Deserialize, Serialize};
use crate::message::ChatMessage;
use crate::thread::{Thread, ThreadId};

/// Connection state of the assistant link for the selected thread
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkState {
    Disconnected,
    Connecting,
    Open,
    Closed,
}

impl LinkState {
    pub fn label(&self) -> &'static str {
        match self {
            LinkState::Disconnected => "Disconnected",
            LinkState::Connecting => "Connecting...",
            LinkState::Open => "Connected",
            LinkState::Closed => "Connection closed",
        }
    }
}

/// Selection generation. Bumped on every thread switch; work tagged with an
/// older epoch belongs to a torn-down selection and must be dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Epoch(pub u64);

impl Epoch {
    pub fn next(self) -> Self {
        Epoch(self.0 + 1)
    }
}

/// Events emitted by the chat session.
/// UI subscribes to these for reactive updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ChatEvent {
    /// Startup listing finished
    ThreadsLoaded { threads: Vec<Thread> },

    /// A new thread was written to the store
    ThreadCreated { thread: Thread },

    /// A thread and its messages were removed
    ThreadDeleted { id: ThreadId },

    /// Selected thread changed (None = nothing selected)
    SelectionChanged { selected: Option<ThreadId> },

    /// Full ordered snapshot of the selected thread's messages
    FeedUpdated { thread: ThreadId, messages: Vec<ChatMessage> },

    /// Assistant link moved to a new state
    LinkStateChanged { thread: ThreadId, state: LinkState },

    /// A send was accepted; sending is disabled until it settles
    SendStarted { token: u64 },

    /// The user message of the current send was written to `thread`
    MessageRecorded { thread: ThreadId, text: String },

    /// The assistant reply was recorded; sending is enabled again
    ReplyRecorded { thread: ThreadId },

    /// The in-flight send could not complete; `text` can be retried
    SendFailed { text: String, reason: String },

    /// No reply arrived in time; `text` can be retried
    ReplyTimedOut { text: String },

    /// An error occurred
    Error { message: String },
}
