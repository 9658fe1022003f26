//! Ledger records: transactions, assets and their identifiers

use crate::core::error::ValidationError;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Opaque, stable identifier of a stored record.
///
/// New identifiers are time-ordered UUIDs. Older data used millisecond
/// timestamps as numeric ids; those are accepted on load and kept as their
/// decimal string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn generate() -> Self {
        RecordId(uuid::Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        RecordId(s.to_string())
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        RecordId(s)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(u64),
        }

        match RawId::deserialize(deserializer)? {
            RawId::Text(s) if s.trim().is_empty() => Err(de::Error::custom("empty record id")),
            RawId::Text(s) => Ok(RecordId(s)),
            RawId::Number(n) => Ok(RecordId(n.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        })
    }
}

impl FromStr for TransactionType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            "" => Err(ValidationError::Missing("type")),
            other => Err(ValidationError::UnknownTransactionType(other.to_string())),
        }
    }
}

/// What an asset holding consists of. Determines the unit of `quantity` and
/// which market rate values it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    /// Cash in the base currency itself.
    #[serde(rename = "try", alias = "cash", alias = "cash-local")]
    CashLocal,
    Gold,
    Silver,
    Usd,
    Eur,
    Fund,
    Stock,
    Crypto,
    #[serde(other)]
    Other,
}

impl AssetKind {
    pub const ALL: [AssetKind; 9] = [
        AssetKind::CashLocal,
        AssetKind::Gold,
        AssetKind::Silver,
        AssetKind::Usd,
        AssetKind::Eur,
        AssetKind::Fund,
        AssetKind::Stock,
        AssetKind::Crypto,
        AssetKind::Other,
    ];

    /// Returns display name and unit label for the kind
    pub fn display_info(&self) -> (&'static str, &'static str) {
        match self {
            AssetKind::CashLocal => ("Cash", ""),
            AssetKind::Gold => ("Gold", "gr"),
            AssetKind::Silver => ("Silver", "gr"),
            AssetKind::Usd => ("US Dollar", "$"),
            AssetKind::Eur => ("Euro", "€"),
            AssetKind::Fund => ("Fund", "units"),
            AssetKind::Stock => ("Stock", "lots"),
            AssetKind::Crypto => ("Crypto", "units"),
            AssetKind::Other => ("Other", "units"),
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            AssetKind::CashLocal => "try",
            AssetKind::Gold => "gold",
            AssetKind::Silver => "silver",
            AssetKind::Usd => "usd",
            AssetKind::Eur => "eur",
            AssetKind::Fund => "fund",
            AssetKind::Stock => "stock",
            AssetKind::Crypto => "crypto",
            AssetKind::Other => "other",
        }
    }
}

impl Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for AssetKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "try" | "cash" | "cash-local" => Ok(AssetKind::CashLocal),
            "gold" => Ok(AssetKind::Gold),
            "silver" => Ok(AssetKind::Silver),
            "usd" => Ok(AssetKind::Usd),
            "eur" => Ok(AssetKind::Eur),
            "fund" => Ok(AssetKind::Fund),
            "stock" => Ok(AssetKind::Stock),
            "crypto" => Ok(AssetKind::Crypto),
            "other" => Ok(AssetKind::Other),
            "" => Err(ValidationError::Missing("kind")),
            other => Err(ValidationError::UnknownAssetKind(other.to_string())),
        }
    }
}

/// Human readable name for a custodian label. Unknown labels are shown as
/// entered.
pub fn custodian_name(label: &str) -> &str {
    match label {
        "hsbc" => "HSBC",
        "garanti" => "Garanti BBVA",
        "albaraka" => "Albaraka Türk",
        "other" => "Other",
        _ => label,
    }
}

/// A record that lives in a ledger collection.
pub trait Record: Clone + Send + Sync + Serialize + DeserializeOwned {
    const COLLECTION: &'static str;

    fn id(&self) -> &RecordId;

    /// Checks the economic fields of an already typed record.
    fn check(&self) -> Result<(), ValidationError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: RecordId,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub category: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Transaction {
    /// Amount with the sign of its effect on cash: income adds, expense
    /// subtracts.
    pub fn signed_amount(&self) -> Decimal {
        match self.kind {
            TransactionType::Income => self.amount,
            TransactionType::Expense => -self.amount,
        }
    }
}

impl Record for Transaction {
    const COLLECTION: &'static str = "transactions";

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn check(&self) -> Result<(), ValidationError> {
        if self.category.trim().is_empty() {
            return Err(ValidationError::Missing("category"));
        }
        if self.amount < Decimal::ZERO {
            return Err(ValidationError::Negative("amount"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: RecordId,
    #[serde(rename = "type")]
    pub kind: AssetKind,
    #[serde(rename = "bank", default, skip_serializing_if = "Option::is_none")]
    pub custodian: Option<String>,
    #[serde(rename = "amount")]
    pub quantity: Decimal,
    #[serde(rename = "price")]
    pub unit_cost: Decimal,
    #[serde(rename = "date")]
    pub acquisition_date: NaiveDate,
}

impl Record for Asset {
    const COLLECTION: &'static str = "assets";

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn check(&self) -> Result<(), ValidationError> {
        if self.quantity <= Decimal::ZERO {
            return Err(ValidationError::NotPositive("quantity"));
        }
        if self.unit_cost < Decimal::ZERO {
            return Err(ValidationError::Negative("unit cost"));
        }
        Ok(())
    }
}

/// Raw, unvalidated transaction fields as entered by a user.
#[derive(Debug, Clone, Default)]
pub struct TransactionDraft {
    pub kind: String,
    pub category: String,
    pub amount: String,
    pub date: String,
}

impl TransactionDraft {
    pub fn into_transaction(
        self,
        id: RecordId,
        created_at: Option<DateTime<Utc>>,
    ) -> Result<Transaction, ValidationError> {
        let kind = self.kind.parse::<TransactionType>()?;
        let category = required_text("category", &self.category)?;
        let amount = parse_decimal("amount", &self.amount)?;
        let date = parse_date(&self.date)?;

        let transaction = Transaction {
            id,
            kind,
            category,
            amount,
            date,
            created_at,
        };
        transaction.check()?;
        Ok(transaction)
    }
}

/// Raw, unvalidated asset fields as entered by a user.
#[derive(Debug, Clone, Default)]
pub struct AssetDraft {
    pub kind: String,
    pub custodian: Option<String>,
    pub quantity: String,
    pub unit_cost: Option<String>,
    pub date: String,
}

impl AssetDraft {
    pub fn into_asset(self, id: RecordId) -> Result<Asset, ValidationError> {
        let kind = self.kind.parse::<AssetKind>()?;
        let quantity = parse_decimal("quantity", &self.quantity)?;
        // Cash in the base currency is always held at 1:1.
        let unit_cost = if kind == AssetKind::CashLocal {
            Decimal::ONE
        } else {
            let raw = self.unit_cost.as_deref().unwrap_or_default();
            parse_decimal("unit cost", raw)?
        };
        let acquisition_date = parse_date(&self.date)?;
        let custodian = self
            .custodian
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty());

        let asset = Asset {
            id,
            kind,
            custodian,
            quantity,
            unit_cost,
            acquisition_date,
        };
        asset.check()?;
        Ok(asset)
    }
}

fn required_text(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Missing(field));
    }
    Ok(value.to_string())
}

/// Amounts are persisted as JSON floating point numbers, which hold this
/// many significant digits exactly.
pub const MAX_SIGNIFICANT_DIGITS: u32 = 15;

pub fn parse_decimal(field: &'static str, value: &str) -> Result<Decimal, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Missing(field));
    }
    let parsed = Decimal::from_str(value)
        .or_else(|_| Decimal::from_scientific(value))
        .map_err(|_| ValidationError::NotNumeric {
            field,
            value: value.to_string(),
        })?;

    let mantissa = parsed.normalize().mantissa().unsigned_abs();
    let digits = mantissa.checked_ilog10().map_or(1, |log| log + 1);
    if digits > MAX_SIGNIFICANT_DIGITS {
        return Err(ValidationError::TooPrecise {
            field,
            limit: MAX_SIGNIFICANT_DIGITS,
        });
    }
    Ok(parsed)
}

pub fn parse_date(value: &str) -> Result<NaiveDate, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Missing("date"));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| ValidationError::InvalidDate(value.to_string()))
}
