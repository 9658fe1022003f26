pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::cli::assets::AssetCommand;
use crate::cli::transactions::TransactionCommand;
use crate::core::config::AppConfig;
use crate::core::session::Session;
use anyhow::Result;
use std::time::Duration;
use tracing::{debug, info};

pub enum AppCommand {
    Dashboard { year: Option<i32> },
    Watch { year: Option<i32> },
    Transactions(TransactionCommand),
    Assets(AssetCommand),
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("kasa starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let repository = store::open_repository(&config)?;
    let mut session = Session::open(repository).await?;
    let rate_source = || providers::build_rate_source(&config.rates, &config.currency);

    match command {
        AppCommand::Dashboard { year } => {
            let rates = cli::fetch_rates(rate_source()?.as_ref()).await;
            let year = year.unwrap_or_else(cli::current_year);
            cli::dashboard::run(session.ledger(), &rates, year, &config.currency);
        }
        AppCommand::Watch { year } => {
            let year = year.unwrap_or_else(cli::current_year);
            cli::watch::run(
                session.ledger(),
                rate_source()?,
                Duration::from_secs(config.rates.refresh_secs),
                year,
                &config.currency,
            )
            .await?;
        }
        AppCommand::Transactions(command) => {
            cli::transactions::run(&mut session, command).await?;
        }
        AppCommand::Assets(command) => {
            let rates = match command {
                AssetCommand::List => Some(cli::fetch_rates(rate_source()?.as_ref()).await),
                _ => None,
            };
            cli::assets::run(&mut session, command, rates.as_ref(), &config.currency).await?;
        }
    }
    Ok(())
}
