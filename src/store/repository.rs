//! Repository layer over the document store.
//!
//! Every mutation is load → mutate → save of the whole document. The
//! write lock makes the scheduler and request handlers take turns, so
//! one process never interleaves two read-modify-write cycles.

use super::{Document, DocumentStore, StoreError};
use crate::domain::{LedgerEntry, Snapshot, VaultSettings, Wallet, WalletType, WalletUpdate};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
}

/// Repository for document operations.
#[derive(Debug)]
pub struct Repository {
    store: Arc<dyn DocumentStore>,
    write_lock: Mutex<()>,
}

impl Repository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Repository {
            store,
            write_lock: Mutex::new(()),
        }
    }

    /// Load the current document.
    pub async fn load(&self) -> Result<Document, StoreError> {
        self.store.load().await
    }

    /// Run one serialized read-modify-write cycle.
    ///
    /// The document is saved only when `mutate` returns `Ok`.
    pub async fn update<T, E, F>(&self, mutate: F) -> Result<T, E>
    where
        F: FnOnce(&mut Document) -> Result<T, E>,
        E: From<StoreError>,
    {
        let _guard = self.write_lock.lock().await;
        let mut document = self.store.load().await?;
        let out = mutate(&mut document)?;
        self.store.save(&document).await?;
        Ok(out)
    }

    // =========================================================================
    // Snapshots
    // =========================================================================

    pub async fn append_snapshot(&self, snapshot: Snapshot) -> Result<(), StoreError> {
        self.update(|doc| {
            doc.pnl_snapshots.push(snapshot);
            debug!(count = doc.pnl_snapshots.len(), "Appended PNL snapshot");
            Ok::<_, StoreError>(())
        })
        .await
    }

    pub async fn list_snapshots(&self) -> Result<Vec<Snapshot>, StoreError> {
        Ok(self.load().await?.pnl_snapshots)
    }

    // =========================================================================
    // Vault settings
    // =========================================================================

    /// Return the settings, persisting the defaults on first access.
    pub async fn vault_settings_or_init(
        &self,
        now: DateTime<Utc>,
    ) -> Result<VaultSettings, StoreError> {
        if let Some(settings) = self.load().await?.vault_settings {
            return Ok(settings);
        }
        self.update(|doc| {
            let settings = doc
                .vault_settings
                .get_or_insert_with(|| VaultSettings::default_at(now))
                .clone();
            Ok::<_, StoreError>(settings)
        })
        .await
    }

    pub async fn replace_vault_settings(
        &self,
        settings: VaultSettings,
    ) -> Result<VaultSettings, StoreError> {
        self.update(|doc| {
            doc.vault_settings = Some(settings.clone());
            Ok::<_, StoreError>(settings)
        })
        .await
    }

    // =========================================================================
    // Ledger
    // =========================================================================

    pub async fn add_ledger_entry(&self, entry: LedgerEntry) -> Result<LedgerEntry, StoreError> {
        self.update(|doc| {
            doc.vault_transactions.push(entry.clone());
            Ok::<_, StoreError>(entry)
        })
        .await
    }

    pub async fn delete_ledger_entry(&self, id: &str) -> Result<LedgerEntry, RepoError> {
        self.update(|doc| {
            let index = doc
                .vault_transactions
                .iter()
                .position(|e| e.id == id)
                .ok_or_else(|| RepoError::NotFound(format!("Transaction {}", id)))?;
            Ok(doc.vault_transactions.remove(index))
        })
        .await
    }

    // =========================================================================
    // Wallets and tags
    // =========================================================================

    /// Insert a wallet. Only one vault wallet may exist.
    pub async fn add_wallet(&self, wallet: Wallet) -> Result<Wallet, RepoError> {
        self.update(|doc| {
            if wallet.wallet_type == WalletType::Vault
                && doc.wallets.iter().any(|w| w.wallet_type == WalletType::Vault)
            {
                return Err(RepoError::Conflict("A vault wallet already exists".to_string()));
            }
            merge_tags_into(&mut doc.available_tags, &wallet.tags);
            doc.wallets.push(wallet.clone());
            Ok(wallet)
        })
        .await
    }

    pub async fn update_wallet(&self, id: &str, update: WalletUpdate) -> Result<Wallet, RepoError> {
        self.update(|doc| {
            let wallet = doc
                .wallets
                .iter_mut()
                .find(|w| w.id == id)
                .ok_or_else(|| RepoError::NotFound(format!("Wallet {}", id)))?;
            update.apply(wallet);
            let updated = wallet.clone();
            merge_tags_into(&mut doc.available_tags, &updated.tags);
            Ok(updated)
        })
        .await
    }

    pub async fn delete_wallet(&self, id: &str) -> Result<(), RepoError> {
        self.update(|doc| {
            let before = doc.wallets.len();
            doc.wallets.retain(|w| w.id != id);
            if doc.wallets.len() == before {
                return Err(RepoError::NotFound(format!("Wallet {}", id)));
            }
            Ok(())
        })
        .await
    }

    /// Merge tags into the global tag list, returning the full list.
    pub async fn merge_tags(&self, tags: Vec<String>) -> Result<Vec<String>, StoreError> {
        self.update(|doc| {
            merge_tags_into(&mut doc.available_tags, &tags);
            Ok::<_, StoreError>(doc.available_tags.clone())
        })
        .await
    }
}

fn merge_tags_into(available: &mut Vec<String>, tags: &[String]) {
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !available.iter().any(|t| t == tag) {
            available.push(tag.to_string());
        }
    }
}
