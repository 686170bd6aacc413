//! Price Update Store
//!
//! The narrow write interface to the external append-only document store.
//! Submissions are appended as one document each and never read back,
//! updated or deleted.
//!
//! ## Backends
//!
//! - **FirestoreStore**: Firestore REST API (`documents:commit`)
//! - **FileStore**: append-only JSON-lines file for local development
//! - **MemoryStore**: in-process vector, used by tests and demos

mod error;
mod file;
mod firestore;
mod memory;
mod types;

pub use error::{StoreError, StoreResult};
pub use file::FileStore;
pub use firestore::{FirestoreConfig, FirestoreStore};
pub use memory::MemoryStore;
pub use types::{PriceUpdate, PriceUpdateRecord, StoredRecord};

use async_trait::async_trait;

/// Append-only destination for submitted price proposals
#[async_trait]
pub trait PriceStore: Send + Sync {
    /// Append one record as a single atomic document.
    ///
    /// The store assigns the document id and the submission timestamp.
    async fn append(&self, record: &PriceUpdateRecord) -> StoreResult<StoredRecord>;

    /// Short backend name for logs and health output
    fn backend(&self) -> &'static str;
}
