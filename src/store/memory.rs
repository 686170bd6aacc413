//! In-memory store

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::error::StoreResult;
use super::types::{PriceUpdateRecord, StoredRecord};
use super::PriceStore;

/// Keeps appended records in a vector
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<Vec<StoredRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All records appended so far, oldest first
    pub async fn records(&self) -> Vec<StoredRecord> {
        self.records.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl PriceStore for MemoryStore {
    async fn append(&self, record: &PriceUpdateRecord) -> StoreResult<StoredRecord> {
        let stored = StoredRecord {
            id: Uuid::new_v4().simple().to_string(),
            updates: record.updates.clone(),
            submitted_at: Utc::now(),
        };
        self.records.write().await.push(stored.clone());
        Ok(stored)
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
