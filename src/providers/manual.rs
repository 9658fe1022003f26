use crate::core::model::AssetKind;
use crate::core::rates::{RateSource, RateTable};
use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::debug;

/// Serves a fixed table, typically the `rates.manual` config section.
pub struct StaticRateSource {
    table: RateTable,
}

impl StaticRateSource {
    pub fn new(table: RateTable) -> Self {
        StaticRateSource { table }
    }

    pub fn from_config(manual: &BTreeMap<AssetKind, Decimal>) -> Self {
        Self::new(manual.iter().map(|(kind, rate)| (*kind, *rate)).collect())
    }

    pub fn table(&self) -> &RateTable {
        &self.table
    }
}

#[async_trait]
impl RateSource for StaticRateSource {
    async fn fetch_rates(&self) -> Result<RateTable> {
        Ok(self.table.clone())
    }

    fn fallback_rates(&self) -> RateTable {
        self.table.clone()
    }
}

/// Fetched rates with fixed entries laid over them.
///
/// A failed fetch is passed on so that callers holding an earlier table keep
/// it. The fixed entries alone are available through `fallback_rates`.
pub struct LayeredRateSource {
    fetched: Box<dyn RateSource>,
    manual: StaticRateSource,
}

impl LayeredRateSource {
    pub fn new(fetched: Box<dyn RateSource>, manual: StaticRateSource) -> Self {
        LayeredRateSource { fetched, manual }
    }
}

#[async_trait]
impl RateSource for LayeredRateSource {
    async fn fetch_rates(&self) -> Result<RateTable> {
        let mut table = self.fetched.fetch_rates().await?;
        table.overlay(self.manual.table());
        debug!(manual = self.manual.table().iter().count(), "Applied manual rates");
        Ok(table)
    }

    fn fallback_rates(&self) -> RateTable {
        let mut table = self.fetched.fallback_rates();
        table.overlay(self.manual.table());
        table
    }
}
