use kasa::AppCommand;
use kasa::cli::assets::{AssetCommand, AssetFields};
use kasa::cli::transactions::{TransactionCommand, TransactionFields};
use kasa::core::ledger::Ledger;
use kasa::core::model::AssetKind;
use kasa::core::rates::RateSource;
use kasa::core::repository::Repository;
use kasa::store::file::FileRepository;
use rust_decimal_macros::dec;
use std::fs;
use std::path::Path;
use tracing::info;

// Adds automatic logging to test
mod test_utils {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub async fn create_rates_mock_server(mock_response: &str) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v4/latest/USD"))
            .respond_with(ResponseTemplate::new(200).set_body_string(mock_response))
            .mount(&mock_server)
            .await;

        mock_server
    }

    pub fn write_config(dir: &std::path::Path, body: &str) -> std::path::PathBuf {
        let config_path = dir.join("config.yaml");
        std::fs::write(&config_path, body).expect("Failed to write config file");
        config_path
    }
}

async fn run(command: AppCommand, config_path: &Path) {
    let result = kasa::run_command(command, Some(config_path.to_str().unwrap())).await;
    assert!(result.is_ok(), "Command failed with: {:?}", result.err());
}

#[test_log::test(tokio::test)]
async fn test_full_app_flow_with_mock() {
    let mock_server = test_utils::create_rates_mock_server(
        r#"{"base": "USD", "rates": {"USD": 1, "TRY": 32, "EUR": 0.5}}"#,
    )
    .await;

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let ledger_path = dir.path().join("data").join("ledger.json");
    let config_path = test_utils::write_config(
        dir.path(),
        &format!(
            r#"
        currency: "TRY"
        storage:
          local:
            path: "{}"
        rates:
          provider:
            base_url: "{}"
          gold_ounce_usd: 3110.35
          manual:
            fund: 2
    "#,
            ledger_path.display(),
            mock_server.uri()
        ),
    );

    run(
        AppCommand::Transactions(TransactionCommand::Add(TransactionFields {
            kind: Some("income".to_string()),
            category: Some("Salary".to_string()),
            amount: Some("50000".to_string()),
            date: Some("2024-01-15".to_string()),
        })),
        &config_path,
    )
    .await;
    run(
        AppCommand::Transactions(TransactionCommand::Add(TransactionFields {
            kind: Some("expense".to_string()),
            category: Some("Rent".to_string()),
            amount: Some("15000".to_string()),
            date: Some("2024-01-20".to_string()),
        })),
        &config_path,
    )
    .await;
    run(
        AppCommand::Assets(AssetCommand::Add(AssetFields {
            kind: Some("gold".to_string()),
            custodian: Some("Albaraka".to_string()),
            quantity: Some("10".to_string()),
            unit_cost: Some("2000".to_string()),
            date: Some("2024-01-01".to_string()),
        })),
        &config_path,
    )
    .await;
    run(
        AppCommand::Assets(AssetCommand::Add(AssetFields {
            kind: Some("fund".to_string()),
            quantity: Some("100".to_string()),
            unit_cost: Some("1.5".to_string()),
            date: Some("2024-02-01".to_string()),
            ..Default::default()
        })),
        &config_path,
    )
    .await;

    run(AppCommand::Dashboard { year: Some(2024) }, &config_path).await;
    run(AppCommand::Assets(AssetCommand::List), &config_path).await;
    run(
        AppCommand::Transactions(TransactionCommand::List { year: None }),
        &config_path,
    )
    .await;

    let repository = FileRepository::new(&ledger_path);
    let transactions = repository.list_transactions().await.unwrap();
    let assets = repository.list_assets().await.unwrap();
    assert_eq!(transactions.len(), 2);
    assert_eq!(assets.len(), 2);
    assert_eq!(assets[0].custodian.as_deref(), Some("albaraka"));

    // The persisted layout keeps the short field names.
    let raw: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&ledger_path).unwrap()).unwrap();
    assert_eq!(raw["assets"][0]["type"], "gold");
    assert_eq!(raw["assets"][0]["bank"], "albaraka");
    assert!(raw["transactions"][0]["createdAt"].is_string());

    let config = kasa::core::config::AppConfig::load_from_path(&config_path).unwrap();
    let source = kasa::providers::build_rate_source(&config.rates, &config.currency).unwrap();
    let rates = source.fetch_rates().await.unwrap();
    info!(?rates, "Rates used for verification");

    let snapshot = Ledger::new(transactions, assets).dashboard(&rates, 2024);
    // gold: 10 gr at 3200, fund: 100 units at the manual rate of 2
    assert_eq!(rates.live_rate(AssetKind::Gold), Some(dec!(3200)));
    assert_eq!(snapshot.portfolio.totals.total_current_value, dec!(32200));
    assert_eq!(snapshot.portfolio.totals.total_cost, dec!(20150));
    assert_eq!(snapshot.portfolio_pl, dec!(12050));
    assert_eq!(snapshot.net_cash_flow, dec!(35000));
    assert_eq!(snapshot.total_wealth, dec!(67200));
    assert_eq!(snapshot.monthly[0].net, dec!(35000));

    let gold_id = snapshot
        .portfolio
        .per_asset
        .iter()
        .find(|v| v.kind == AssetKind::Gold)
        .map(|v| v.id.to_string())
        .unwrap();
    run(
        AppCommand::Assets(AssetCommand::Edit {
            id: gold_id.clone(),
            fields: AssetFields {
                quantity: Some("12".to_string()),
                ..Default::default()
            },
        }),
        &config_path,
    )
    .await;
    let edited = repository.list_assets().await.unwrap();
    let gold = edited.iter().find(|a| a.id.as_str() == gold_id).unwrap();
    assert_eq!(gold.quantity, dec!(12));
    assert_eq!(gold.unit_cost, dec!(2000));

    run(
        AppCommand::Assets(AssetCommand::Remove { id: gold_id }),
        &config_path,
    )
    .await;
    assert_eq!(repository.list_assets().await.unwrap().len(), 1);
}

#[test_log::test(tokio::test)]
async fn test_dashboard_survives_rate_outage() {
    let mock_server = wiremock::MockServer::start().await;
    wiremock::Mock::given(wiremock::matchers::method("GET"))
        .respond_with(wiremock::ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_path = test_utils::write_config(
        dir.path(),
        &format!(
            r#"
        data_path: "{}"
        rates:
          provider:
            base_url: "{}"
    "#,
            dir.path().display(),
            mock_server.uri()
        ),
    );

    run(AppCommand::Dashboard { year: None }, &config_path).await;
    assert!(!dir.path().join("ledger.json").exists());
}

#[test_log::test(tokio::test)]
async fn test_invalid_input_is_rejected() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_path = test_utils::write_config(
        dir.path(),
        &format!(
            r#"
        data_path: "{}"
    "#,
            dir.path().display()
        ),
    );

    let result = kasa::run_command(
        AppCommand::Transactions(TransactionCommand::Add(TransactionFields {
            kind: Some("income".to_string()),
            category: Some("Salary".to_string()),
            amount: Some("abc".to_string()),
            date: Some("2024-01-15".to_string()),
        })),
        Some(config_path.to_str().unwrap()),
    )
    .await;
    let err = result.unwrap_err();
    assert!(err.to_string().contains("must be a number"), "{err:#}");

    let result = kasa::run_command(
        AppCommand::Assets(AssetCommand::Remove {
            id: "missing".to_string(),
        }),
        Some(config_path.to_str().unwrap()),
    )
    .await;
    assert!(result.unwrap_err().to_string().contains("No assets record"));
    assert!(!dir.path().join("ledger.json").exists());
}

#[test_log::test(tokio::test)]
async fn test_remote_store_flow_with_mock() {
    use wiremock::matchers::{body_partial_json, method, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let store_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(
            r"^/v1/projects/demo/databases/\(default\)/documents/(assets|transactions)$",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .mount(&store_server)
        .await;
    Mock::given(method("PATCH"))
        .and(path_regex(
            r"^/v1/projects/demo/databases/\(default\)/documents/assets/.+$",
        ))
        .and(body_partial_json(serde_json::json!({
            "fields": {
                "type": {"stringValue": "usd"},
                "amount": {"doubleValue": 100.0}
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(1)
        .mount(&store_server)
        .await;

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_path = test_utils::write_config(
        dir.path(),
        &format!(
            r#"
        data_path: "{}"
        storage:
          remote:
            base_url: "{}"
            project_id: "demo"
    "#,
            dir.path().display(),
            store_server.uri()
        ),
    );

    run(
        AppCommand::Assets(AssetCommand::Add(AssetFields {
            kind: Some("usd".to_string()),
            quantity: Some("100".to_string()),
            unit_cost: Some("30".to_string()),
            date: Some("2024-03-01".to_string()),
            ..Default::default()
        })),
        &config_path,
    )
    .await;
    assert!(!dir.path().join("ledger.json").exists());
}
