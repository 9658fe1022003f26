pub mod assets;
pub mod dashboard;
pub mod setup;
pub mod transactions;
pub mod ui;
pub mod watch;

use crate::core::rates::{RateSource, RateTable};
use chrono::{Datelike, Local};
use tracing::warn;

/// Fetches current rates behind a spinner. A failed fetch yields the
/// source's fallback rates, so holdings without one are shown at cost.
pub async fn fetch_rates(source: &dyn RateSource) -> RateTable {
    let pb = ui::new_spinner("Fetching market rates...");
    let result = source.fetch_rates().await;
    pb.finish_and_clear();

    match result {
        Ok(table) => table,
        Err(e) => {
            warn!("Could not fetch market rates: {e:#}");
            source.fallback_rates()
        }
    }
}

pub(crate) fn today() -> String {
    Local::now().date_naive().format("%Y-%m-%d").to_string()
}

pub(crate) fn current_year() -> i32 {
    Local::now().year()
}
