pub mod exchange_rate;
pub mod manual;
pub mod util;

use crate::core::config::RatesConfig;
use crate::core::rates::RateSource;
use anyhow::Result;
use exchange_rate::ExchangeRateApiSource;
use manual::{LayeredRateSource, StaticRateSource};

/// Builds the rate source described by the `rates` config section.
pub fn build_rate_source(config: &RatesConfig, base_currency: &str) -> Result<Box<dyn RateSource>> {
    let manual = StaticRateSource::from_config(&config.manual);
    match &config.provider {
        Some(provider) => {
            let fetched = ExchangeRateApiSource::new(
                &provider.base_url,
                base_currency,
                config.gold_ounce_usd,
                config.silver_ounce_usd,
            )?;
            Ok(Box::new(LayeredRateSource::new(Box::new(fetched), manual)))
        }
        None => Ok(Box::new(manual)),
    }
}
