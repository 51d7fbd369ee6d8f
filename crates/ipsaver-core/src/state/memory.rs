// # Memory Status Store
//
// In-memory implementation of StatusStore.
//
// ## Purpose
//
// Keeps the record in process memory only. Useful for tests and for
// embedding the monitor where persistence is handled elsewhere.
//
// ## Crash Behavior
//
// - The record is lost on restart
// - The first cycle after a restart runs immediately and always counts as
//   a change (the baseline is empty)

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

use crate::Error;
use crate::status::StatusRecord;
use crate::traits::status_store::StatusStore;

/// In-memory status store implementation
///
/// Clones share the same record, so a test can keep a handle and inspect
/// what the monitor saved.
#[derive(Debug, Clone, Default)]
pub struct MemoryStatusStore {
    inner: Arc<RwLock<StatusRecord>>,
    saves: Arc<AtomicUsize>,
}

impl MemoryStatusStore {
    /// Create a store holding an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-loaded with `record`
    pub fn with_record(record: StatusRecord) -> Self {
        Self {
            inner: Arc::new(RwLock::new(record)),
            saves: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Current stored record
    pub async fn snapshot(&self) -> StatusRecord {
        self.inner.read().await.clone()
    }

    /// Number of successful saves
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StatusStore for MemoryStatusStore {
    async fn load(&self) -> StatusRecord {
        self.inner.read().await.clone()
    }

    async fn save(&self, record: &StatusRecord) -> Result<(), Error> {
        *self.inner.write().await = record.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}
