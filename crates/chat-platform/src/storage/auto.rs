//! Pick the storage backend named by the config.
//!
//! `Auto` tries IndexedDB first and falls back to memory.

use std::rc::Rc;
use chat_core::ports::StoragePort;
use chat_types::{Result, config::StorageBackendType};
use super::{IndexedDbStorage, MemoryStorage};

/// Open the configured backend as a trait object so callers stay
/// backend-agnostic. Only an explicit `IndexedDb` request can fail.
pub async fn auto_detect_storage(backend: &StorageBackendType) -> Result<Rc<dyn StoragePort>> {
    match backend {
        StorageBackendType::Memory => {
            log::info!("Storage backend: memory");
            Ok(Rc::new(MemoryStorage::new()))
        }
        StorageBackendType::IndexedDb => {
            let idb = IndexedDbStorage::open().await?;
            log::info!("Storage backend: IndexedDB");
            Ok(Rc::new(idb))
        }
        StorageBackendType::Auto => match IndexedDbStorage::open().await {
            Ok(idb) => {
                log::info!("Storage backend: IndexedDB");
                Ok(Rc::new(idb))
            }
            Err(e) => {
                log::warn!("IndexedDB unavailable ({}), falling back to memory", e);
                Ok(Rc::new(MemoryStorage::new()))
            }
        },
    }
}
