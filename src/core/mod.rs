//! Ledger model, valuation and aggregation

pub mod aggregation;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod feed;
pub mod ledger;
pub mod log;
pub mod model;
pub mod rates;
pub mod repository;
pub mod session;
pub mod valuation;

// Re-export main types for cleaner imports
pub use error::{Error, Result, ValidationError};
pub use ledger::Ledger;
pub use model::{Asset, AssetKind, RecordId, Transaction, TransactionType};
pub use rates::{RateSource, RateTable};
pub use repository::Repository;
pub use session::Session;
