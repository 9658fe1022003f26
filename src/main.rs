use anyhow::Result;
use clap::{Args, CommandFactory, Parser, Subcommand};
use kasa::cli::assets::{AssetCommand, AssetFields};
use kasa::cli::transactions::{TransactionCommand, TransactionFields};
use kasa::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display wealth, portfolio P/L and the monthly breakdown
    Dashboard {
        /// Year of the income/expense breakdown (defaults to the current year)
        #[arg(short, long)]
        year: Option<i32>,
    },
    /// Keep the dashboard open, refreshing market rates periodically
    Watch {
        /// Year of the income/expense breakdown (defaults to the current year)
        #[arg(short, long)]
        year: Option<i32>,
    },
    /// Manage income and expense transactions
    #[command(subcommand)]
    Tx(TxCommands),
    /// Manage holdings
    #[command(subcommand)]
    Asset(AssetCommands),
}

#[derive(Args)]
struct TxArgs {
    /// income or expense
    #[arg(short = 't', long = "type")]
    kind: Option<String>,
    #[arg(long)]
    category: Option<String>,
    #[arg(short, long, allow_hyphen_values = true)]
    amount: Option<String>,
    /// YYYY-MM-DD (defaults to today when adding)
    #[arg(short, long)]
    date: Option<String>,
}

#[derive(Subcommand)]
enum TxCommands {
    /// Record a transaction
    Add(TxArgs),
    /// Change fields of a transaction
    Edit {
        id: String,
        #[command(flatten)]
        args: TxArgs,
    },
    /// Delete a transaction
    Rm { id: String },
    /// List transactions, newest first
    List {
        #[arg(short, long)]
        year: Option<i32>,
    },
}

#[derive(Args)]
struct AssetArgs {
    /// try, gold, silver, usd, eur, fund, stock, crypto or other
    #[arg(short = 't', long = "type")]
    kind: Option<String>,
    /// Custodian label, e.g. hsbc, garanti, albaraka
    #[arg(short, long)]
    bank: Option<String>,
    #[arg(short, long, allow_hyphen_values = true)]
    quantity: Option<String>,
    /// Unit cost in the base currency (ignored for cash)
    #[arg(short, long, allow_hyphen_values = true)]
    price: Option<String>,
    /// YYYY-MM-DD (defaults to today when adding)
    #[arg(short, long)]
    date: Option<String>,
}

#[derive(Subcommand)]
enum AssetCommands {
    /// Record a holding
    Add(AssetArgs),
    /// Change fields of a holding
    Edit {
        id: String,
        #[command(flatten)]
        args: AssetArgs,
    },
    /// Delete a holding
    Rm { id: String },
    /// List holdings with current valuation
    List,
}

impl From<TxArgs> for TransactionFields {
    fn from(args: TxArgs) -> TransactionFields {
        TransactionFields {
            kind: args.kind,
            category: args.category,
            amount: args.amount,
            date: args.date,
        }
    }
}

impl From<AssetArgs> for AssetFields {
    fn from(args: AssetArgs) -> AssetFields {
        AssetFields {
            kind: args.kind,
            custodian: args.bank,
            quantity: args.quantity,
            unit_cost: args.price,
            date: args.date,
        }
    }
}

impl From<Commands> for kasa::AppCommand {
    fn from(cmd: Commands) -> kasa::AppCommand {
        match cmd {
            Commands::Dashboard { year } => kasa::AppCommand::Dashboard { year },
            Commands::Watch { year } => kasa::AppCommand::Watch { year },
            Commands::Tx(tx) => kasa::AppCommand::Transactions(match tx {
                TxCommands::Add(args) => TransactionCommand::Add(args.into()),
                TxCommands::Edit { id, args } => TransactionCommand::Edit {
                    id,
                    fields: args.into(),
                },
                TxCommands::Rm { id } => TransactionCommand::Remove { id },
                TxCommands::List { year } => TransactionCommand::List { year },
            }),
            Commands::Asset(asset) => kasa::AppCommand::Assets(match asset {
                AssetCommands::Add(args) => AssetCommand::Add(args.into()),
                AssetCommands::Edit { id, args } => AssetCommand::Edit {
                    id,
                    fields: args.into(),
                },
                AssetCommands::Rm { id } => AssetCommand::Remove { id },
                AssetCommands::List => AssetCommand::List,
            }),
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => kasa::cli::setup::setup_at_path(path),
            None => kasa::cli::setup::setup(),
        },
        Some(cmd) => kasa::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
