//! Browser adapters for the chat-core ports.
//!
//! - [`storage`]: key-value backends (memory, IndexedDB)
//! - [`store`]: the chat document store on top of any key-value backend
//! - [`socket`]: websocket transport to the assistant

pub mod storage;
pub mod store;
pub mod socket;
