//! UI-level state that drives rendering.
//! This is a read-only projection of the chat session, updated each frame
//! by draining the EventBus.

use chat_types::event::{ChatEvent, LinkState};
use chat_types::message::ChatMessage;
use chat_types::thread::{Thread, ThreadId};

/// State visible to UI panels
pub struct UiState {
    /// Sidebar entries, in the order the store listed them
    pub threads: Vec<Thread>,
    pub selected: Option<ThreadId>,
    /// Latest snapshot of the selected thread
    pub messages: Vec<ChatMessage>,
    /// Input field content
    pub input_text: String,
    pub link_state: LinkState,
    /// A message is awaiting its reply
    pub pending: bool,
    /// Text of a send that failed or timed out, offered for retry
    pub failed_send: Option<String>,
    /// Status line text
    pub status_text: String,
}

impl UiState {
    pub fn new() -> Self {
        Self {
            threads: Vec::new(),
            selected: None,
            messages: Vec::new(),
            input_text: String::new(),
            link_state: LinkState::Disconnected,
            pending: false,
            failed_send: None,
            status_text: "Ready".to_string(),
        }
    }

    /// Process events from the EventBus and update UI state
    pub fn process_events(&mut self, events: Vec<ChatEvent>) {
        for event in events {
            match event {
                ChatEvent::ThreadsLoaded { threads } => {
                    self.threads = threads;
                }
                ChatEvent::ThreadCreated { thread } => {
                    if !self.threads.iter().any(|t| t.id == thread.id) {
                        self.threads.push(thread);
                    }
                }
                ChatEvent::ThreadDeleted { id } => {
                    self.threads.retain(|t| t.id != id);
                    if self.selected.as_ref() == Some(&id) {
                        self.clear_selection();
                    }
                }
                ChatEvent::SelectionChanged { selected } => match selected {
                    Some(id) => {
                        self.selected = Some(id);
                        self.messages.clear();
                        self.pending = false;
                        self.failed_send = None;
                        self.link_state = LinkState::Disconnected;
                    }
                    None => self.clear_selection(),
                },
                ChatEvent::FeedUpdated { thread, messages } => {
                    if self.selected.as_ref() == Some(&thread) {
                        self.messages = messages;
                    }
                }
                ChatEvent::LinkStateChanged { thread, state } => {
                    if self.selected.as_ref() == Some(&thread) {
                        self.link_state = state;
                        self.status_text = state.label().to_string();
                    }
                }
                ChatEvent::SendStarted { .. } => {
                    self.pending = true;
                    self.failed_send = None;
                    self.status_text = "Waiting for reply...".to_string();
                }
                ChatEvent::MessageRecorded { thread, text } => {
                    // Keep anything typed since the submit
                    if self.is_selected(&thread) && self.input_text.trim() == text {
                        self.input_text.clear();
                    }
                }
                ChatEvent::ReplyRecorded { thread } => {
                    if self.is_selected(&thread) {
                        self.pending = false;
                        self.status_text = self.link_state.label().to_string();
                    }
                }
                ChatEvent::SendFailed { text, reason } => {
                    self.pending = false;
                    self.failed_send = Some(text);
                    self.status_text = format!("Send failed: {}", reason);
                }
                ChatEvent::ReplyTimedOut { text } => {
                    self.pending = false;
                    self.failed_send = Some(text);
                    self.status_text = "No reply from assistant".to_string();
                }
                ChatEvent::Error { message } => {
                    self.status_text = format!("Error: {}", message);
                }
            }
        }
    }

    fn clear_selection(&mut self) {
        self.selected = None;
        self.messages.clear();
        self.pending = false;
        self.failed_send = None;
        self.link_state = LinkState::Disconnected;
        self.status_text = "Ready".to_string();
    }

    pub fn is_selected(&self, id: &ThreadId) -> bool {
        self.selected.as_ref() == Some(id)
    }

    pub fn is_busy(&self) -> bool {
        self.pending
    }

    /// Whether the input may be submitted right now
    pub fn can_send(&self) -> bool {
        self.selected.is_some() && !self.pending && self.link_state == LinkState::Open
    }

    /// Trimmed input to submit, or `None` when blank. The field is cleared
    /// once the session reports the message as recorded.
    pub fn submission(&self) -> Option<String> {
        let text = self.input_text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }
}

impl Default for UiState {
    fn default() -> Self {
        Self::new()
    }
}
