// # Status Store Trait
//
// Defines the interface for persisting the status record.
//
// ## Purpose
//
// The store is read once when the monitor starts and overwritten after every
// successful cycle. Between cycles the monitor compares against its own
// in-memory baseline; it never re-reads the store.
//
// ## Implementations
//
// - File-based: pretty-printed JSON, written via temp file + rename
// - Memory: for tests and embedding
//
// ## Usage
//
// ```rust,ignore
// use ipsaver_core::StatusStore;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let store = /* StatusStore implementation */;
//
//     // Never fails: corrupt or missing content loads as an empty record
//     let baseline = store.load().await;
//
//     // Overwrite after a cycle
//     store.save(&baseline).await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::error::Result;
use crate::status::StatusRecord;

/// Trait for status store implementations
///
/// # Load Contract
///
/// `load()` has no error path. Missing, empty, unreadable or malformed
/// content must be logged by the implementation and reported as
/// [`StatusRecord::empty()`]; a corrupt file means "start fresh", never a
/// crash.
///
/// # Save Contract
///
/// `save()` replaces the entire stored content. A reader must never observe
/// a partially written record as valid.
#[async_trait]
pub trait StatusStore: Send + Sync {
    /// Load the persisted record, or an empty one
    async fn load(&self) -> StatusRecord;

    /// Overwrite the persisted record
    async fn save(&self, record: &StatusRecord) -> Result<()>;

    /// Describe where the record is kept (for logging)
    fn location(&self) -> String;
}
