//! Append-only JSON-lines store
//!
//! Each record is written as one line:
//! `{"id": ..., "updates": [{"codigo", "servicio", "monto_nuevo"}], "timestamp": ...}`

use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::error::StoreResult;
use super::types::{PriceUpdateRecord, StoredRecord};
use super::PriceStore;

/// Appends records to a local file, one JSON document per line
pub struct FileStore {
    path: PathBuf,
    /// Serializes writers so lines never interleave
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Create a store writing to `path`, creating parent directories
    pub async fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        tracing::info!(path = %path.display(), "Using file price store");
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl PriceStore for FileStore {
    async fn append(&self, record: &PriceUpdateRecord) -> StoreResult<StoredRecord> {
        let stored = StoredRecord {
            id: Uuid::new_v4().simple().to_string(),
            updates: record.updates.clone(),
            submitted_at: Utc::now(),
        };

        let mut line = serde_json::to_vec(&stored)?;
        line.push(b'\n');

        let _guard = self.write_lock.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&line).await?;
        file.sync_data().await?;

        Ok(stored)
    }

    fn backend(&self) -> &'static str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::PriceUpdate;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_appends_one_line_per_record() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path().join("nested").join("updates.jsonl"))
            .await
            .unwrap();

        let record = PriceUpdateRecord::new(vec![
            PriceUpdate::new("D0120", "Examen", 25000),
            PriceUpdate::new("D1110", "Limpieza dental adulto", 32000),
        ]);
        let stored = store.append(&record).await.unwrap();
        store
            .append(&PriceUpdateRecord::new(vec![PriceUpdate::new("D7140", "Extracción simple", 35000)]))
            .await
            .unwrap();

        let content = std::fs::read_to_string(store.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["id"], stored.id.as_str());
        assert_eq!(first["updates"][0]["codigo"], "D0120");
        assert_eq!(first["updates"][0]["monto_nuevo"], 25000);
        assert_eq!(first["updates"][1]["servicio"], "Limpieza dental adulto");
        assert!(first["timestamp"].is_string());
    }
}
