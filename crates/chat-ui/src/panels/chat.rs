//! Chat panel — the selected thread's messages, input field and send gate.

use egui::{self, Layout, RichText, ScrollArea, Vec2};
use chat_core::render::{Align as BubbleAlign, BillingCard, Bubble, ReplyRenderer, ReplyView, ReportExtractor};
use chat_types::event::LinkState;
use crate::state::UiState;
use crate::theme::*;

pub const PLACEHOLDER: &str = "Select a chat or create a new one";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatAction {
    /// Submit trimmed, non-empty input
    Send(String),
    /// Resend the last failed or timed-out message
    Retry,
}

/// Render the chat panel. Returns the action the user took this frame, if any.
pub fn chat_panel<E: ReportExtractor>(
    ui: &mut egui::Ui,
    state: &mut UiState,
    renderer: &ReplyRenderer<E>,
) -> Option<ChatAction> {
    let mut action = None;

    egui::Frame::default()
        .fill(BG_PRIMARY)
        .inner_margin(PANEL_PADDING)
        .show(ui, |ui| {
            let Some(thread) = state.selected.clone() else {
                ui.label(RichText::new(PLACEHOLDER).color(TEXT_SECONDARY));
                return;
            };

            ui.vertical(|ui| {
                // Header
                ui.horizontal(|ui| {
                    ui.heading(RichText::new(thread.as_str()).color(TEXT_PRIMARY).strong());
                    ui.with_layout(Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.label(
                            RichText::new(&state.status_text)
                                .color(status_color(state))
                                .small(),
                        );
                    });
                });

                ui.separator();

                // Messages area
                let available_height = ui.available_height() - 60.0;
                ScrollArea::vertical()
                    .max_height(available_height)
                    .auto_shrink([false, false])
                    .stick_to_bottom(true)
                    .show(ui, |ui| {
                        for msg in &state.messages {
                            match renderer.render_message(msg) {
                                ReplyView::Bubble(bubble) => render_bubble(ui, &bubble),
                                ReplyView::Cards(cards) => render_cards(ui, &cards),
                            }
                            ui.add_space(6.0);
                        }
                    });

                if let Some(failed) = state.failed_send.clone() {
                    ui.horizontal(|ui| {
                        ui.label(
                            RichText::new(format!("Not delivered: {}", failed))
                                .color(WARNING)
                                .small(),
                        );
                        if ui
                            .add_enabled(state.can_send(), egui::Button::new("Retry"))
                            .clicked()
                        {
                            action = Some(ChatAction::Retry);
                        }
                    });
                }

                ui.add_space(8.0);

                // Input area
                ui.horizontal(|ui| {
                    let input = egui::TextEdit::singleline(&mut state.input_text)
                        .hint_text("Type your message")
                        .desired_width(ui.available_width() - 90.0)
                        .font(egui::FontId::proportional(14.0));
                    let response = ui.add_enabled(!state.pending, input);

                    let send_enabled = state.can_send();
                    let label = if state.pending { "Sending..." } else { "Send" };
                    let send_btn = ui.add_enabled(
                        send_enabled,
                        egui::Button::new(RichText::new(label).color(TEXT_PRIMARY))
                            .fill(if send_enabled { ACCENT } else { BG_SURFACE })
                            .corner_radius(PANEL_ROUNDING)
                            .min_size(Vec2::new(80.0, 0.0)),
                    );

                    let enter = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                    if (enter || send_btn.clicked()) && send_enabled {
                        if let Some(text) = state.submission() {
                            action = Some(ChatAction::Send(text));
                        }
                        response.request_focus();
                    }
                });
            });
        });

    action
}

fn status_color(state: &UiState) -> egui::Color32 {
    if state.pending {
        return WARNING;
    }
    match state.link_state {
        LinkState::Open => SUCCESS,
        LinkState::Connecting => WARNING,
        LinkState::Closed => ERROR,
        LinkState::Disconnected => TEXT_SECONDARY,
    }
}

fn render_bubble(ui: &mut egui::Ui, bubble: &Bubble) {
    let (layout, fill) = match bubble.align {
        BubbleAlign::Right => (Layout::top_down(egui::Align::Max), USER_BUBBLE),
        BubbleAlign::Left => (Layout::top_down(egui::Align::Min), ASSISTANT_BUBBLE),
    };
    let max_width = ui.available_width() * BUBBLE_MAX_FRACTION;

    ui.with_layout(layout, |ui| {
        egui::Frame::default()
            .fill(fill)
            .corner_radius(PANEL_ROUNDING)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.set_max_width(max_width);
                ui.horizontal_wrapped(|ui| {
                    ui.label(
                        RichText::new(format!("{}:", bubble.label()))
                            .color(TEXT_PRIMARY)
                            .strong(),
                    );
                    ui.label(RichText::new(&bubble.text).color(TEXT_PRIMARY));
                });
            });
    });
}

fn render_cards(ui: &mut egui::Ui, cards: &[BillingCard]) {
    for card in cards {
        egui::Frame::default()
            .fill(if card.paid { PAID_BG } else { UNPAID_BG })
            .corner_radius(CARD_ROUNDING)
            .inner_margin(10.0)
            .show(ui, |ui| {
                ui.set_max_width(CARD_MAX_WIDTH);
                ui.label(RichText::new(card.header()).color(TEXT_PRIMARY).strong());
                for line in [&card.phone, &card.internet, &card.total] {
                    ui.label(RichText::new(line).color(TEXT_PRIMARY));
                }
                ui.horizontal(|ui| {
                    ui.label(RichText::new("Status:").color(TEXT_PRIMARY));
                    ui.label(
                        RichText::new(card.status_label())
                            .color(if card.paid { SUCCESS } else { ERROR })
                            .strong(),
                    );
                });
            });
        ui.add_space(10.0);
    }
}
