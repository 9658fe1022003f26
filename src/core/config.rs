use crate::core::model::AssetKind;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::{fs, path::PathBuf};
use tracing::debug;

pub const DEFAULT_RATES_URL: &str = "https://api.exchangerate-api.com";
pub const DEFAULT_DOCUMENT_STORE_URL: &str = "https://firestore.googleapis.com";

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct LocalStoreConfig {
    /// Ledger file; defaults to `ledger.json` in the data directory.
    pub path: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RemoteStoreConfig {
    #[serde(default = "default_document_store_url")]
    pub base_url: String,
    pub project_id: String,
    pub api_key: Option<String>,
}

/// Where records are kept. A `remote` section takes precedence over `local`.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct StorageConfig {
    pub local: Option<LocalStoreConfig>,
    pub remote: Option<RemoteStoreConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ExchangeRateProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RatesConfig {
    pub provider: Option<ExchangeRateProviderConfig>,
    #[serde(default = "default_refresh_secs")]
    pub refresh_secs: u64,
    /// Spot price of one troy ounce of gold in USD.
    #[serde(default = "default_gold_ounce_usd")]
    pub gold_ounce_usd: Decimal,
    pub silver_ounce_usd: Option<Decimal>,
    /// Fixed unit rates in the base currency, applied over fetched ones.
    #[serde(default)]
    pub manual: BTreeMap<AssetKind, Decimal>,
}

impl Default for RatesConfig {
    fn default() -> Self {
        RatesConfig {
            provider: Some(ExchangeRateProviderConfig {
                base_url: DEFAULT_RATES_URL.to_string(),
            }),
            refresh_secs: default_refresh_secs(),
            gold_ounce_usd: default_gold_ounce_usd(),
            silver_ounce_usd: None,
            manual: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// Base currency every value is expressed in.
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub rates: RatesConfig,
    pub data_path: Option<String>,
}

fn default_currency() -> String {
    "TRY".to_string()
}

fn default_document_store_url() -> String {
    DEFAULT_DOCUMENT_STORE_URL.to_string()
}

fn default_refresh_secs() -> u64 {
    60
}

fn default_gold_ounce_usd() -> Decimal {
    Decimal::from(2650)
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "kasa", "kasa")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("dev", "kasa", "kasa")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    /// Resolved path of the local ledger file.
    pub fn ledger_path(&self) -> Result<PathBuf> {
        match self.storage.local.as_ref().and_then(|l| l.path.as_ref()) {
            Some(path) => Ok(PathBuf::from(path)),
            None => Ok(self.default_data_path()?.join("ledger.json")),
        }
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_config_defaults() {
        let config: AppConfig = serde_yaml::from_str("data_path: /tmp/kasa").unwrap();

        assert_eq!(config.currency, "TRY");
        assert!(config.storage.local.is_none());
        assert!(config.storage.remote.is_none());
        assert_eq!(
            config.rates.provider.as_ref().unwrap().base_url,
            DEFAULT_RATES_URL
        );
        assert_eq!(config.rates.refresh_secs, 60);
        assert_eq!(config.rates.gold_ounce_usd, dec!(2650));
        assert!(config.rates.manual.is_empty());
        assert_eq!(
            config.ledger_path().unwrap(),
            PathBuf::from("/tmp/kasa").join("ledger.json")
        );
    }

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
currency: "TRY"
storage:
  local:
    path: "/var/lib/kasa/ledger.json"
  remote:
    project_id: "finance-demo"
    api_key: "abc123"
rates:
  provider:
    base_url: "http://example.com/rates"
  refresh_secs: 300
  gold_ounce_usd: 2700.5
  silver_ounce_usd: 31
  manual:
    fund: 1.25
    stock: 48
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(
            config.ledger_path().unwrap(),
            PathBuf::from("/var/lib/kasa/ledger.json")
        );
        let remote = config.storage.remote.unwrap();
        assert_eq!(remote.base_url, DEFAULT_DOCUMENT_STORE_URL);
        assert_eq!(remote.project_id, "finance-demo");
        assert_eq!(remote.api_key.as_deref(), Some("abc123"));
        assert_eq!(
            config.rates.provider.unwrap().base_url,
            "http://example.com/rates"
        );
        assert_eq!(config.rates.refresh_secs, 300);
        assert_eq!(config.rates.gold_ounce_usd, dec!(2700.5));
        assert_eq!(config.rates.silver_ounce_usd, Some(dec!(31)));
        assert_eq!(config.rates.manual.get(&AssetKind::Fund), Some(&dec!(1.25)));
        assert_eq!(config.rates.manual.get(&AssetKind::Stock), Some(&dec!(48)));
    }

    #[test]
    fn test_missing_config_file() {
        let err = AppConfig::load_from_path("/nonexistent/kasa/config.yaml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
