//! In-memory record collections
//!
//! The ledger is the source of truth for every computation. Collections only
//! change by appending, replacing a record by id or removing it by id.

use crate::core::dashboard::{self, DashboardSnapshot};
use crate::core::error::{Error, Result, ValidationError};
use crate::core::model::{Asset, Record, RecordId, Transaction};
use crate::core::rates::RateTable;
use crate::core::valuation::{self, PortfolioValuation};
use tracing::{debug, warn};

/// An ordered collection of records with unique ids.
#[derive(Debug, Clone)]
pub struct Collection<T: Record> {
    records: Vec<T>,
}

impl<T: Record> Collection<T> {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Builds a collection from stored records, dropping duplicate ids and
    /// records that fail validation.
    pub fn from_records(records: Vec<T>) -> Self {
        let mut collection = Self::new();
        for record in records {
            if let Err(e) = collection.create(record) {
                warn!(collection = T::COLLECTION, "Dropping stored record: {e}");
            }
        }
        collection
    }

    pub fn create(&mut self, record: T) -> Result<RecordId> {
        record.check()?;
        if self.position(record.id()).is_some() {
            return Err(ValidationError::DuplicateId {
                collection: T::COLLECTION,
                id: record.id().clone(),
            }
            .into());
        }
        let id = record.id().clone();
        self.records.push(record);
        debug!(collection = T::COLLECTION, %id, "Created record");
        Ok(id)
    }

    pub fn update(&mut self, id: &RecordId, record: T) -> Result<()> {
        let index = self.position(id).ok_or_else(|| self.not_found(id))?;
        if record.id() != id {
            return Err(ValidationError::IdMismatch {
                expected: id.clone(),
                found: record.id().clone(),
            }
            .into());
        }
        record.check()?;
        self.records[index] = record;
        debug!(collection = T::COLLECTION, %id, "Replaced record");
        Ok(())
    }

    pub fn delete(&mut self, id: &RecordId) -> Result<T> {
        let index = self.position(id).ok_or_else(|| self.not_found(id))?;
        debug!(collection = T::COLLECTION, %id, "Deleted record");
        Ok(self.records.remove(index))
    }

    pub fn get(&self, id: &RecordId) -> Option<&T> {
        self.position(id).map(|index| &self.records[index])
    }

    pub fn list(&self) -> &[T] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn position(&self, id: &RecordId) -> Option<usize> {
        self.records.iter().position(|r| r.id() == id)
    }

    fn not_found(&self, id: &RecordId) -> Error {
        Error::NotFound {
            collection: T::COLLECTION,
            id: id.clone(),
        }
    }
}

impl<T: Record> Default for Collection<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Ledger {
    pub transactions: Collection<Transaction>,
    pub assets: Collection<Asset>,
}

impl Ledger {
    pub fn new(transactions: Vec<Transaction>, assets: Vec<Asset>) -> Self {
        Ledger {
            transactions: Collection::from_records(transactions),
            assets: Collection::from_records(assets),
        }
    }

    pub fn valuation(&self, rates: &RateTable) -> PortfolioValuation {
        valuation::valuate(self.assets.list(), rates)
    }

    pub fn dashboard(&self, rates: &RateTable, year: i32) -> DashboardSnapshot {
        dashboard::compose(self.assets.list(), rates, self.transactions.list(), year)
    }
}
