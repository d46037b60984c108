//! Chat UI — egui panels over a [`state::UiState`] projection of the
//! session's events.

pub mod state;
pub mod theme;
pub mod panels;
