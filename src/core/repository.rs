//! Persistence abstractions

use crate::core::model::{Asset, RecordId, Transaction};
use anyhow::Result;
use async_trait::async_trait;

/// Durable storage for ledger records.
///
/// Writes are upserts keyed by record id. Implementations must leave
/// previously stored records intact when a write fails.
#[async_trait]
pub trait Repository: Send + Sync {
    async fn list_transactions(&self) -> Result<Vec<Transaction>>;

    async fn list_assets(&self) -> Result<Vec<Asset>>;

    async fn put_transaction(&self, transaction: &Transaction) -> Result<()>;

    async fn put_asset(&self, asset: &Asset) -> Result<()>;

    async fn delete_transaction(&self, id: &RecordId) -> Result<()>;

    async fn delete_asset(&self, id: &RecordId) -> Result<()>;
}
