//! Error taxonomy for ledger operations

use crate::core::model::RecordId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for operations on the ledger and its collaborators.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("No {collection} record with id {id}")]
    NotFound {
        collection: &'static str,
        id: RecordId,
    },

    #[error("Market rates unavailable: {0}")]
    RateUnavailable(String),

    #[error("Failed to persist {collection} record {id}: {source:#}")]
    Persistence {
        collection: &'static str,
        id: RecordId,
        #[source]
        source: anyhow::Error,
    },
}

/// Input that never reaches a collection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{field} must be a number, got '{value}'")]
    NotNumeric { field: &'static str, value: String },

    #[error("{field} has more than {limit} significant digits")]
    TooPrecise { field: &'static str, limit: u32 },

    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),

    #[error("{0} must not be negative")]
    Negative(&'static str),

    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Unknown transaction type '{0}', expected income or expense")]
    UnknownTransactionType(String),

    #[error("Unknown asset kind '{0}'")]
    UnknownAssetKind(String),

    #[error("Record id {found} does not match {expected}")]
    IdMismatch { expected: RecordId, found: RecordId },

    #[error("A {collection} record with id {id} already exists")]
    DuplicateId {
        collection: &'static str,
        id: RecordId,
    },
}
