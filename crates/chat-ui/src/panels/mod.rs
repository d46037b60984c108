pub mod sidebar;
pub mod chat;
