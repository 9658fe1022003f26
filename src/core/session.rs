//! Validated, persisted mutations of the ledger

use crate::core::error::{Error, Result};
use crate::core::ledger::Ledger;
use crate::core::model::{Asset, AssetDraft, Record, RecordId, Transaction, TransactionDraft};
use crate::core::repository::Repository;
use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, warn};

/// Binds the in-memory ledger to a repository.
///
/// Every change is validated, applied to the ledger and then written to the
/// repository. When the write fails the change stays in memory and the
/// failure is returned as [`Error::Persistence`].
pub struct Session {
    ledger: Ledger,
    repository: Arc<dyn Repository>,
}

impl Session {
    pub async fn open(repository: Arc<dyn Repository>) -> anyhow::Result<Self> {
        let (transactions, assets) = futures::try_join!(
            async {
                repository
                    .list_transactions()
                    .await
                    .context("Failed to load transactions")
            },
            async {
                repository
                    .list_assets()
                    .await
                    .context("Failed to load assets")
            },
        )?;
        debug!(
            transactions = transactions.len(),
            assets = assets.len(),
            "Loaded ledger"
        );

        Ok(Session {
            ledger: Ledger::new(transactions, assets),
            repository,
        })
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub async fn add_transaction(&mut self, draft: TransactionDraft) -> Result<RecordId> {
        let transaction = draft.into_transaction(RecordId::generate(), Some(Utc::now()))?;
        let id = self.ledger.transactions.create(transaction.clone())?;
        let outcome = self.repository.put_transaction(&transaction).await;
        self.persist(&id, Transaction::COLLECTION, outcome)?;
        Ok(id)
    }

    pub async fn update_transaction(
        &mut self,
        id: &RecordId,
        draft: TransactionDraft,
    ) -> Result<()> {
        let created_at = self
            .ledger
            .transactions
            .get(id)
            .ok_or_else(|| Error::NotFound {
                collection: Transaction::COLLECTION,
                id: id.clone(),
            })?
            .created_at;
        let transaction = draft.into_transaction(id.clone(), created_at)?;
        self.ledger.transactions.update(id, transaction.clone())?;
        let outcome = self.repository.put_transaction(&transaction).await;
        self.persist(id, Transaction::COLLECTION, outcome)
    }

    pub async fn delete_transaction(&mut self, id: &RecordId) -> Result<()> {
        self.ledger.transactions.delete(id)?;
        let outcome = self.repository.delete_transaction(id).await;
        self.persist(id, Transaction::COLLECTION, outcome)
    }

    pub async fn add_asset(&mut self, draft: AssetDraft) -> Result<RecordId> {
        let asset = draft.into_asset(RecordId::generate())?;
        let id = self.ledger.assets.create(asset.clone())?;
        let outcome = self.repository.put_asset(&asset).await;
        self.persist(&id, Asset::COLLECTION, outcome)?;
        Ok(id)
    }

    pub async fn update_asset(&mut self, id: &RecordId, draft: AssetDraft) -> Result<()> {
        if self.ledger.assets.get(id).is_none() {
            return Err(Error::NotFound {
                collection: Asset::COLLECTION,
                id: id.clone(),
            });
        }
        let asset = draft.into_asset(id.clone())?;
        self.ledger.assets.update(id, asset.clone())?;
        let outcome = self.repository.put_asset(&asset).await;
        self.persist(id, Asset::COLLECTION, outcome)
    }

    pub async fn delete_asset(&mut self, id: &RecordId) -> Result<()> {
        self.ledger.assets.delete(id)?;
        let outcome = self.repository.delete_asset(id).await;
        self.persist(id, Asset::COLLECTION, outcome)
    }

    fn persist(
        &self,
        id: &RecordId,
        collection: &'static str,
        outcome: anyhow::Result<()>,
    ) -> Result<()> {
        outcome.map_err(|source| {
            warn!(collection, %id, "Write failed, keeping change in memory: {source:#}");
            Error::Persistence {
                collection,
                id: id.clone(),
                source,
            }
        })
    }
}
