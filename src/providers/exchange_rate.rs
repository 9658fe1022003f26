use crate::core::model::AssetKind;
use crate::core::rates::{RateSource, RateTable};
use crate::providers::util::{http_client, with_retry};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, instrument, warn};

/// Grams in one troy ounce.
pub const TROY_OUNCE_GRAMS: Decimal = Decimal::from_parts(311035, 0, 0, false, 4);

const RETRIES: usize = 3;
const RETRY_DELAY_MS: u64 = 500;

/// Rate source backed by an exchangerate-api style `latest` endpoint.
///
/// Quotes arrive relative to USD and are normalised into the base currency.
/// Precious metals are priced per gram from configured USD ounce prices.
pub struct ExchangeRateApiSource {
    base_url: String,
    base_currency: String,
    gold_ounce_usd: Decimal,
    silver_ounce_usd: Option<Decimal>,
    client: reqwest::Client,
}

impl ExchangeRateApiSource {
    pub fn new(
        base_url: &str,
        base_currency: &str,
        gold_ounce_usd: Decimal,
        silver_ounce_usd: Option<Decimal>,
    ) -> Result<Self> {
        Ok(ExchangeRateApiSource {
            base_url: base_url.trim_end_matches('/').to_string(),
            base_currency: base_currency.to_uppercase(),
            gold_ounce_usd,
            silver_ounce_usd,
            client: http_client()?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    rates: HashMap<String, Decimal>,
}

fn per_gram(ounce_usd: Decimal, usd_to_base: Decimal) -> Option<Decimal> {
    ounce_usd
        .checked_div(TROY_OUNCE_GRAMS)?
        .checked_mul(usd_to_base)
}

/// Converts USD-relative quotes into unit rates in `base_currency`.
fn normalise(
    quotes: &HashMap<String, Decimal>,
    base_currency: &str,
    gold_ounce_usd: Decimal,
    silver_ounce_usd: Option<Decimal>,
) -> Result<RateTable> {
    let usd_to_base = quotes
        .get(base_currency)
        .copied()
        .filter(|rate| *rate > Decimal::ZERO)
        .ok_or_else(|| anyhow!("No USD quote for base currency: {}", base_currency))?;

    let mut table = RateTable::new().with_rate(AssetKind::Usd, usd_to_base);

    match quotes.get("EUR").filter(|rate| **rate > Decimal::ZERO) {
        Some(usd_to_eur) => match usd_to_base.checked_div(*usd_to_eur) {
            Some(rate) => table.set(AssetKind::Eur, rate),
            None => warn!("EUR rate out of range"),
        },
        None => debug!("No EUR quote in response"),
    }

    if gold_ounce_usd > Decimal::ZERO {
        match per_gram(gold_ounce_usd, usd_to_base) {
            Some(rate) => table.set(AssetKind::Gold, rate),
            None => warn!("Gold rate out of range"),
        }
    }
    if let Some(ounce) = silver_ounce_usd.filter(|o| *o > Decimal::ZERO) {
        match per_gram(ounce, usd_to_base) {
            Some(rate) => table.set(AssetKind::Silver, rate),
            None => warn!("Silver rate out of range"),
        }
    }

    Ok(table)
}

#[async_trait]
impl RateSource for ExchangeRateApiSource {
    #[instrument(
        name = "ExchangeRateFetch",
        skip(self),
        fields(base_currency = %self.base_currency)
    )]
    async fn fetch_rates(&self) -> Result<RateTable> {
        let url = format!("{}/v4/latest/USD", self.base_url);
        debug!("Requesting exchange rates from {}", url);

        let response = with_retry(|| self.client.get(&url).send(), RETRIES, RETRY_DELAY_MS)
            .await
            .with_context(|| format!("Request error for URL: {url}"))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for exchange rates URL: {}",
                response.status(),
                url
            ));
        }

        let text = response.text().await?;
        let data: LatestRatesResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse exchange rate response: {}", e))?;

        let mut table = normalise(
            &data.rates,
            &self.base_currency,
            self.gold_ounce_usd,
            self.silver_ounce_usd,
        )?;
        table.fetched_at = Some(Utc::now());
        debug!(rates = ?table, "Normalised exchange rates");
        Ok(table)
    }
}
