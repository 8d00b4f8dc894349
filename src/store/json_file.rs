//! Flat JSON file backend.

use super::{Document, DocumentStore, StoreError};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DocumentStore for JsonFileStore {
    async fn load(&self) -> Result<Document, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %self.path.display(), "Document not found, creating an empty one");
                let document = Document::default();
                self.save(&document).await?;
                Ok(document)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, document: &Document) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let body = serde_json::to_vec_pretty(document)?;
        tokio::fs::write(&self.path, body).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Snapshot;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_load_creates_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("vault.json");
        let store = JsonFileStore::new(&path);

        let doc = store.load().await.unwrap();
        assert_eq!(doc, Document::default());
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(temp_dir.path().join("vault.json"));

        let mut doc = Document::default();
        doc.available_tags.push("defi".to_string());
        doc.pnl_snapshots.push(
            Snapshot::compute(Utc::now(), Decimal::from(120), Decimal::from(100)).unwrap(),
        );
        store.save(&doc).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.available_tags, vec!["defi".to_string()]);
        assert_eq!(loaded.pnl_snapshots.len(), 1);
        assert_eq!(loaded.pnl_snapshots[0].p, Decimal::from(20));
    }

    #[tokio::test]
    async fn test_malformed_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("vault.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = JsonFileStore::new(&path).load().await.unwrap_err();
        assert!(matches!(err, StoreError::Serde(_)));
    }
}
