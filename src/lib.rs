pub mod auth;
pub mod codec;
pub mod config;
pub mod records;
pub mod rest;
pub mod storage;

use std::sync::Arc;

use config::DaemonConfig;
use records::RecordStore;
use storage::BlobStore;

/// Shared application state passed to every request handler.
///
/// Holds only the resolved config and the storage handle. Handlers keep no
/// state between requests: every cycle re-reads the record files from
/// storage.
pub struct AppContext {
    pub config: Arc<DaemonConfig>,
    pub store: Arc<dyn BlobStore>,
    pub started_at: std::time::Instant,
}

impl AppContext {
    pub fn new(config: DaemonConfig) -> Self {
        let store = storage::from_config(&config);
        Self {
            config: Arc::new(config),
            store,
            started_at: std::time::Instant::now(),
        }
    }

    /// The administrator list.
    pub fn admins(&self) -> RecordStore {
        RecordStore::admins(self.store.clone())
    }

    /// The scorer list.
    pub fn scorers(&self) -> RecordStore {
        RecordStore::scorers(self.store.clone())
    }
}
