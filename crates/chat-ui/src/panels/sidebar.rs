//! Sidebar — thread list with new / select / delete controls.

use egui::{self, RichText, ScrollArea, Vec2};
use chat_types::thread::ThreadId;
use crate::state::UiState;
use crate::theme::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SidebarAction {
    New,
    Select(ThreadId),
    Delete(ThreadId),
}

/// Render the sidebar. Returns the action the user took this frame, if any.
pub fn sidebar_panel(ui: &mut egui::Ui, state: &UiState) -> Option<SidebarAction> {
    let mut action = None;

    egui::Frame::default()
        .fill(BG_SECONDARY)
        .inner_margin(PANEL_PADDING)
        .show(ui, |ui| {
            ui.heading(RichText::new("Chats").color(TEXT_PRIMARY).strong());
            ui.add_space(4.0);

            let new_btn = ui.add(
                egui::Button::new(RichText::new("+ New Chat").color(TEXT_PRIMARY))
                    .fill(ACCENT)
                    .corner_radius(PANEL_ROUNDING)
                    .min_size(Vec2::new(ui.available_width(), 28.0)),
            );
            if new_btn.clicked() {
                action = Some(SidebarAction::New);
            }

            ui.separator();

            ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    for thread in &state.threads {
                        let selected = state.is_selected(&thread.id);
                        ui.horizontal(|ui| {
                            let row = egui::Button::new(
                                RichText::new(thread.id.as_str()).color(if selected {
                                    TEXT_PRIMARY
                                } else {
                                    TEXT_SECONDARY
                                }),
                            )
                            .fill(if selected { SELECTED_ROW } else { BG_SECONDARY })
                            .min_size(Vec2::new(ui.available_width() - 28.0, 0.0));

                            if ui.add(row).clicked() {
                                action = Some(SidebarAction::Select(thread.id.clone()));
                            }

                            let delete = ui
                                .add(egui::Button::new(
                                    RichText::new("×").color(ERROR).strong(),
                                ).frame(false))
                                .on_hover_text("Delete Chat");
                            if delete.clicked() {
                                action = Some(SidebarAction::Delete(thread.id.clone()));
                            }
                        });
                    }
                });
        });

    action
}
