//! Chat core — thread directory, message feed, assistant link and the
//! session that drives them. Talks to the outside world only through the
//! traits in [`ports`].

pub mod ports;
pub mod event_bus;
pub mod directory;
pub mod feed;
pub mod link;
pub mod render;
pub mod session;
