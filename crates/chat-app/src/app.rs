//! Main egui application — composes the panels and drives the chat session.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use egui::{self, CentralPanel, SidePanel};
use gloo_timers::future::TimeoutFuture;
use wasm_bindgen_futures::spawn_local;

use chat_core::event_bus::EventBus;
use chat_core::render::ReplyRenderer;
use chat_core::session::{ChatSession, LinkPump, SendOutcome};
use chat_platform::socket::WsTransport;
use chat_platform::storage::auto_detect_storage;
use chat_platform::store::StorageDocumentStore;
use chat_types::config::ChatConfig;
use chat_types::event::ChatEvent;
use chat_types::thread::ThreadId;
use chat_types::{ChatError, Result};
use chat_ui::panels::chat::{chat_panel, ChatAction};
use chat_ui::panels::sidebar::{sidebar_panel, SidebarAction};
use chat_ui::state::UiState;
use chat_ui::theme;

/// Repaint cadence while a thread is open, so socket-driven updates show up
const IDLE_REPAINT: Duration = Duration::from_millis(250);

/// The main application state
pub struct ChatApp {
    ui_state: UiState,
    event_bus: EventBus,
    /// Filled once the storage backend has been opened
    session: Rc<RefCell<Option<ChatSession>>>,
    renderer: ReplyRenderer,
    first_frame: bool,
}

impl ChatApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let config = ChatConfig::default();
        if let Err(e) = config.assistant.validate() {
            log::error!("Invalid assistant config: {}", e);
        }

        let app = Self {
            ui_state: UiState::new(),
            event_bus: EventBus::new(),
            session: Rc::new(RefCell::new(None)),
            renderer: ReplyRenderer::new(),
            first_frame: true,
        };

        Self::start_session(
            config,
            app.event_bus.clone(),
            app.session.clone(),
            cc.egui_ctx.clone(),
        );
        app
    }

    /// Open storage, build the session and load the thread list (async)
    fn start_session(
        config: ChatConfig,
        event_bus: EventBus,
        slot: Rc<RefCell<Option<ChatSession>>>,
        ctx: egui::Context,
    ) {
        spawn_local(async move {
            let storage = match auto_detect_storage(&config.storage.backend).await {
                Ok(s) => s,
                Err(e) => {
                    log::error!("No storage backend available: {}", e);
                    event_bus.emit(ChatEvent::Error {
                        message: e.to_string(),
                    });
                    ctx.request_repaint();
                    return;
                }
            };
            let store = Rc::new(StorageDocumentStore::new(storage));
            let session = ChatSession::new(
                config.assistant,
                store,
                Rc::new(WsTransport::new()),
                event_bus.clone(),
            );
            *slot.borrow_mut() = Some(session.clone());

            if let Err(e) = session.load_threads().await {
                log::error!("Failed to load chats: {}", e);
                event_bus.emit(ChatEvent::Error {
                    message: e.to_string(),
                });
            }
            ctx.request_repaint();
        });
    }

    fn session(&self) -> Option<ChatSession> {
        self.session.borrow().clone()
    }

    fn handle_sidebar(&self, action: SidebarAction, ctx: &egui::Context) {
        let Some(session) = self.session() else {
            log::debug!("Session not ready, ignoring {:?}", action);
            return;
        };
        let ctx = ctx.clone();
        let bus = self.event_bus.clone();

        match action {
            SidebarAction::New => spawn_local(async move {
                match session.create_thread().await {
                    Ok((_, pump)) => spawn_pump(pump, ctx.clone()),
                    Err(e) => report(&bus, "Failed to create chat", e),
                }
                ctx.request_repaint();
            }),
            SidebarAction::Select(id) => {
                if self.ui_state.is_selected(&id) {
                    return;
                }
                spawn_local(async move {
                    select(&session, &bus, id, ctx).await;
                });
            }
            SidebarAction::Delete(id) => spawn_local(async move {
                // Failure is already logged and surfaced by the session
                let _ = session.delete_thread(&id).await;
                ctx.request_repaint();
            }),
        }
    }

    fn handle_chat(&self, action: ChatAction, ctx: &egui::Context) {
        let Some(session) = self.session() else {
            return;
        };
        let ctx = ctx.clone();

        spawn_local(async move {
            let outcome = match action {
                ChatAction::Send(text) => session.send(&text).await,
                ChatAction::Retry => session.retry().await,
            };
            on_send_outcome(&session, outcome, ctx);
        });
    }
}

async fn select(session: &ChatSession, bus: &EventBus, id: ThreadId, ctx: egui::Context) {
    match session.select_thread(Some(id.clone())).await {
        Ok(pump) => spawn_pump(pump, ctx.clone()),
        Err(e) => report(bus, &format!("Failed to open {}", id), e),
    }
    ctx.request_repaint();
}

/// Arm the reply timeout for a send that went out
fn on_send_outcome(session: &ChatSession, outcome: Result<SendOutcome>, ctx: egui::Context) {
    match outcome {
        Ok(SendOutcome::Sent { token }) => {
            let session = session.clone();
            let timeout_ms = u32::try_from(session.reply_timeout_ms()).unwrap_or(u32::MAX);
            spawn_local(async move {
                TimeoutFuture::new(timeout_ms).await;
                if session.expire_pending(token) {
                    ctx.request_repaint();
                }
            });
        }
        Ok(SendOutcome::Skipped(reason)) => {
            log::debug!("Send skipped: {:?}", reason);
        }
        Ok(SendOutcome::Abandoned) => {
            log::debug!("Send abandoned by thread switch");
        }
        Err(e) => {
            log::error!("Error sending message: {}", e);
            ctx.request_repaint();
        }
    }
}

fn spawn_pump(pump: Option<LinkPump>, ctx: egui::Context) {
    if let Some(pump) = pump {
        spawn_local(async move {
            pump.run().await;
            ctx.request_repaint();
        });
    }
}

fn report(bus: &EventBus, what: &str, e: ChatError) {
    log::error!("{}: {}", what, e);
    bus.emit(ChatEvent::Error {
        message: format!("{}: {}", what, e),
    });
}

impl eframe::App for ChatApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.first_frame {
            theme::apply_theme(ctx);
            self.first_frame = false;
        }

        // Drain events from the session
        let events = self.event_bus.drain();
        if !events.is_empty() {
            self.ui_state.process_events(events);
            ctx.request_repaint();
        }

        if self.ui_state.is_busy() {
            ctx.request_repaint();
        } else if self.ui_state.selected.is_some() {
            ctx.request_repaint_after(IDLE_REPAINT);
        }

        // ── Thread sidebar ───────────────────────────────────
        let sidebar_action = SidePanel::left("thread_sidebar")
            .resizable(false)
            .exact_width(240.0)
            .show(ctx, |ui| sidebar_panel(ui, &self.ui_state))
            .inner;
        if let Some(action) = sidebar_action {
            self.handle_sidebar(action, ctx);
        }

        // ── Message pane ─────────────────────────────────────
        let chat_action = CentralPanel::default()
            .show(ctx, |ui| chat_panel(ui, &mut self.ui_state, &self.renderer))
            .inner;
        if let Some(action) = chat_action {
            self.handle_chat(action, ctx);
        }
    }
}
