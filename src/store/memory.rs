use crate::core::model::{Asset, Record, RecordId, Transaction};
use crate::core::repository::Repository;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Repository that keeps records only for the lifetime of the process.
#[derive(Default)]
pub struct MemoryRepository {
    transactions: Arc<Mutex<Vec<Transaction>>>,
    assets: Arc<Mutex<Vec<Asset>>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(transactions: Vec<Transaction>, assets: Vec<Asset>) -> Self {
        Self {
            transactions: Arc::new(Mutex::new(transactions)),
            assets: Arc::new(Mutex::new(assets)),
        }
    }
}

fn upsert<T: Record>(records: &mut Vec<T>, record: &T) {
    match records.iter_mut().find(|r| r.id() == record.id()) {
        Some(existing) => *existing = record.clone(),
        None => records.push(record.clone()),
    }
    debug!(collection = T::COLLECTION, id = %record.id(), "Memory PUT");
}

fn remove<T: Record>(records: &mut Vec<T>, id: &RecordId) {
    records.retain(|r| r.id() != id);
    debug!(collection = T::COLLECTION, %id, "Memory DELETE");
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn list_transactions(&self) -> Result<Vec<Transaction>> {
        Ok(self.transactions.lock().await.clone())
    }

    async fn list_assets(&self) -> Result<Vec<Asset>> {
        Ok(self.assets.lock().await.clone())
    }

    async fn put_transaction(&self, transaction: &Transaction) -> Result<()> {
        upsert(&mut *self.transactions.lock().await, transaction);
        Ok(())
    }

    async fn put_asset(&self, asset: &Asset) -> Result<()> {
        upsert(&mut *self.assets.lock().await, asset);
        Ok(())
    }

    async fn delete_transaction(&self, id: &RecordId) -> Result<()> {
        remove(&mut *self.transactions.lock().await, id);
        Ok(())
    }

    async fn delete_asset(&self, id: &RecordId) -> Result<()> {
        remove(&mut *self.assets.lock().await, id);
        Ok(())
    }
}
