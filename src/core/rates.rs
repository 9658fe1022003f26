//! Market rate abstractions

use crate::core::model::AssetKind;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Current unit rates in the base currency, keyed by asset kind.
///
/// A missing entry, or one that is zero or negative, means no live rate is
/// known for that kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateTable {
    rates: BTreeMap<AssetKind, Decimal>,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl RateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rate(mut self, kind: AssetKind, rate: Decimal) -> Self {
        self.set(kind, rate);
        self
    }

    pub fn set(&mut self, kind: AssetKind, rate: Decimal) {
        self.rates.insert(kind, rate);
    }

    /// Returns the usable rate for `kind`. Cash in the base currency is
    /// always worth exactly one unit.
    pub fn live_rate(&self, kind: AssetKind) -> Option<Decimal> {
        if kind == AssetKind::CashLocal {
            return Some(Decimal::ONE);
        }
        self.rates
            .get(&kind)
            .copied()
            .filter(|rate| *rate > Decimal::ZERO)
    }

    /// Copies every entry of `other` over this table.
    pub fn overlay(&mut self, other: &RateTable) {
        for (kind, rate) in &other.rates {
            self.rates.insert(*kind, *rate);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (AssetKind, Decimal)> + '_ {
        self.rates.iter().map(|(kind, rate)| (*kind, *rate))
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

impl FromIterator<(AssetKind, Decimal)> for RateTable {
    fn from_iter<I: IntoIterator<Item = (AssetKind, Decimal)>>(iter: I) -> Self {
        RateTable {
            rates: iter.into_iter().collect(),
            fetched_at: None,
        }
    }
}

#[async_trait]
pub trait RateSource: Send + Sync {
    async fn fetch_rates(&self) -> Result<RateTable>;

    /// Rates that are known without fetching, used before the first
    /// successful fetch.
    fn fallback_rates(&self) -> RateTable {
        RateTable::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_live_rate_ignores_non_positive_entries() {
        let table = RateTable::new()
            .with_rate(AssetKind::Gold, dec!(2500))
            .with_rate(AssetKind::Silver, Decimal::ZERO)
            .with_rate(AssetKind::Usd, dec!(-1));

        assert_eq!(table.live_rate(AssetKind::Gold), Some(dec!(2500)));
        assert_eq!(table.live_rate(AssetKind::Silver), None);
        assert_eq!(table.live_rate(AssetKind::Usd), None);
        assert_eq!(table.live_rate(AssetKind::Stock), None);
        assert_eq!(table.live_rate(AssetKind::CashLocal), Some(Decimal::ONE));
    }

    #[test]
    fn test_overlay_replaces_entries() {
        let mut fetched: RateTable = [(AssetKind::Usd, dec!(32)), (AssetKind::Eur, dec!(35))]
            .into_iter()
            .collect();
        let manual = RateTable::new()
            .with_rate(AssetKind::Eur, dec!(36))
            .with_rate(AssetKind::Fund, dec!(1.5));

        fetched.overlay(&manual);

        assert_eq!(fetched.live_rate(AssetKind::Usd), Some(dec!(32)));
        assert_eq!(fetched.live_rate(AssetKind::Eur), Some(dec!(36)));
        assert_eq!(fetched.live_rate(AssetKind::Fund), Some(dec!(1.5)));
    }
}
