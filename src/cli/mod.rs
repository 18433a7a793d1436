//! CLI interface for supdog-stats
//!
//! One subcommand per scheduled job:
//! - `bnb-price`, `token-price`, `supply`, `liquidity`, `holders`: acquire
//! - `daily-log`, `volume`, `dashboard`: period logs and derived series
//! - `status`: show persisted state
//! - `config`: show effective configuration

mod acquire;
mod logs;
mod status;

pub use status::StatusArgs;

use crate::app::App;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "supdog-stats")]
#[command(about = "Reconciled price, supply and liquidity stats for the SUPDOG token")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Acquire the BNB/USD price
    BnbPrice,
    /// Acquire the token price in BNB from the pair reserves
    TokenPrice,
    /// Acquire total supply, derive burned supply, update the hourly log
    Supply,
    /// Acquire pool liquidity in BNB and value it in USD
    Liquidity,
    /// Acquire the holder count
    Holders,
    /// Snapshot persisted values into the daily log
    DailyLog,
    /// Estimate volume from the latest daily burn
    Volume,
    /// Rebuild the dashboard series
    Dashboard,
    /// Show persisted state
    Status(StatusArgs),
    /// Show configuration
    Config,
}

impl Commands {
    /// Kebab-case name used in the run span
    pub fn name(&self) -> &'static str {
        match self {
            Commands::BnbPrice => "bnb-price",
            Commands::TokenPrice => "token-price",
            Commands::Supply => "supply",
            Commands::Liquidity => "liquidity",
            Commands::Holders => "holders",
            Commands::DailyLog => "daily-log",
            Commands::Volume => "volume",
            Commands::Dashboard => "dashboard",
            Commands::Status(_) => "status",
            Commands::Config => "config",
        }
    }

    pub async fn execute(&self, app: &App) -> anyhow::Result<()> {
        let now = chrono::Utc::now();
        match self {
            Commands::BnbPrice => acquire::bnb_price(app).await,
            Commands::TokenPrice => acquire::token_price(app).await,
            Commands::Supply => acquire::supply(app, now).await,
            Commands::Liquidity => acquire::liquidity(app).await,
            Commands::Holders => acquire::holders(app).await,
            Commands::DailyLog => logs::daily_log(app, now),
            Commands::Volume => logs::volume(app, now),
            Commands::Dashboard => logs::dashboard(app, now),
            Commands::Status(args) => args.execute(app),
            Commands::Config => status::print_config(app),
        }
    }
}
