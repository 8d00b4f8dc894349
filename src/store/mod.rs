//! Persistence of the single vault document.
//!
//! This module provides:
//! - The `Document` holding every persisted entity
//! - The `DocumentStore` trait (load full document / save full document)
//! - A JSON file backend and a single-row SQLite backend
//! - `Repository`, which serializes read-modify-write cycles in-process

pub mod json_file;
pub mod repository;
pub mod sqlite;

use crate::config::{Config, StoreBackend};
use crate::domain::{LedgerEntry, Snapshot, VaultSettings, Wallet};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

pub use json_file::JsonFileStore;
pub use repository::{RepoError, Repository};
pub use sqlite::SqliteDocumentStore;

/// The whole persisted state. Missing fields load as their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default)]
    pub wallets: Vec<Wallet>,
    #[serde(default)]
    pub available_tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vault_settings: Option<VaultSettings>,
    #[serde(default)]
    pub vault_transactions: Vec<LedgerEntry>,
    #[serde(default)]
    pub pnl_snapshots: Vec<Snapshot>,
}

impl Document {
    /// The first vault wallet that has both network addresses.
    pub fn vault_wallet(&self) -> Option<&Wallet> {
        self.wallets.iter().find(|w| w.vault_addresses().is_some())
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed document: {0}")]
    Serde(#[from] serde_json::Error),
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// Backing storage for the document. No partial updates: every save
/// rewrites the whole document.
#[async_trait]
pub trait DocumentStore: Send + Sync + fmt::Debug {
    /// Load the full document, creating an empty one if none exists yet.
    async fn load(&self) -> Result<Document, StoreError>;

    /// Replace the stored document.
    async fn save(&self, document: &Document) -> Result<(), StoreError>;
}

/// Open the backend selected by configuration.
pub async fn open_store(config: &Config) -> Result<Arc<dyn DocumentStore>, StoreError> {
    let store: Arc<dyn DocumentStore> = match config.store_backend {
        StoreBackend::Json => Arc::new(JsonFileStore::new(&config.data_path)),
        StoreBackend::Sqlite => Arc::new(SqliteDocumentStore::open(&config.data_path).await?),
    };
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_tolerates_missing_fields() {
        let doc: Document = serde_json::from_str(r#"{"wallets": []}"#).unwrap();
        assert!(doc.vault_settings.is_none());
        assert!(doc.pnl_snapshots.is_empty());
        assert!(doc.available_tags.is_empty());
    }

    #[test]
    fn test_document_field_names() {
        let json = serde_json::to_value(Document::default()).unwrap();
        let obj = json.as_object().unwrap();
        assert!(obj.contains_key("wallets"));
        assert!(obj.contains_key("availableTags"));
        assert!(obj.contains_key("vaultTransactions"));
        assert!(obj.contains_key("pnlSnapshots"));
        assert!(!obj.contains_key("vaultSettings"));
    }
}
