//! Configuration types for supdog-stats

use crate::source::{BINANCE_API_URL, BSCSCAN_API_URL, BSC_RPC_URL, COINGECKO_API_URL};
use crate::telemetry::LogFormat;
use anyhow::{ensure, Context};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Configuration used when no config file exists
pub const BUILTIN_CONFIG: &str = include_str!("../config.toml.example");

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub token: TokenConfig,
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub reconcile: ReconcileConfig,
    #[serde(default)]
    pub period: PeriodConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

/// Tracked token and the on-chain contracts around it
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenConfig {
    /// Token contract address
    pub address: String,

    #[serde(default = "default_decimals")]
    pub decimals: u32,

    /// Supply at launch; burned = max_supply - current supply
    #[serde(default = "default_max_supply")]
    pub max_supply: Decimal,

    /// WBNB contract, the quote side of every pool
    pub wbnb_address: String,

    /// Token/WBNB pair used for the token price
    pub pair_address: String,

    /// Pools whose WBNB balance counts towards liquidity
    #[serde(default)]
    pub liquidity_pools: Vec<String>,
}

fn default_decimals() -> u32 {
    9
}
fn default_max_supply() -> Decimal {
    Decimal::new(1_000_000_000, 0)
}

/// External data source endpoints
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourcesConfig {
    #[serde(default = "default_binance_url")]
    pub binance_url: String,

    #[serde(default = "default_binance_symbol")]
    pub binance_symbol: String,

    #[serde(default = "default_coingecko_url")]
    pub coingecko_url: String,

    #[serde(default = "default_coingecko_id")]
    pub coingecko_id: String,

    /// BSC JSON-RPC node
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,

    #[serde(default = "default_bscscan_url")]
    pub bscscan_url: String,

    /// Environment variable holding the BscScan API key
    #[serde(default = "default_bscscan_key_env")]
    pub bscscan_key_env: String,
}

fn default_binance_url() -> String {
    BINANCE_API_URL.to_string()
}
fn default_binance_symbol() -> String {
    "BNBUSDT".to_string()
}
fn default_coingecko_url() -> String {
    COINGECKO_API_URL.to_string()
}
fn default_coingecko_id() -> String {
    "binancecoin".to_string()
}
fn default_rpc_url() -> String {
    BSC_RPC_URL.to_string()
}
fn default_bscscan_url() -> String {
    BSCSCAN_API_URL.to_string()
}
fn default_bscscan_key_env() -> String {
    "BSCSCAN_API_KEY".to_string()
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            binance_url: default_binance_url(),
            binance_symbol: default_binance_symbol(),
            coingecko_url: default_coingecko_url(),
            coingecko_id: default_coingecko_id(),
            rpc_url: default_rpc_url(),
            bscscan_url: default_bscscan_url(),
            bscscan_key_env: default_bscscan_key_env(),
        }
    }
}

/// Quorum reconciliation settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReconcileConfig {
    /// Maximum relative disagreement for sources to count as agreeing
    #[serde(default = "default_agreement_tolerance")]
    pub agreement_tolerance: Decimal,

    /// Per-source fetch timeout (seconds)
    #[serde(default = "default_source_timeout_secs")]
    pub source_timeout_secs: u64,
}

fn default_agreement_tolerance() -> Decimal {
    Decimal::new(2, 2) // 0.02 = 2%
}
fn default_source_timeout_secs() -> u64 {
    10
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            agreement_tolerance: default_agreement_tolerance(),
            source_timeout_secs: default_source_timeout_secs(),
        }
    }
}

/// Period log settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PeriodConfig {
    /// Reporting offset from UTC in hours
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,

    /// Fraction of each trade burned
    #[serde(default = "default_burn_rate_ratio")]
    pub burn_rate_ratio: Decimal,

    /// Hourly supply records kept
    #[serde(default = "default_hourly_retention")]
    pub hourly_retention: usize,
}

fn default_utc_offset_hours() -> i32 {
    -5 // EST
}
fn default_burn_rate_ratio() -> Decimal {
    Decimal::new(2, 2) // 0.02 = 2%
}
fn default_hourly_retention() -> usize {
    72
}

impl Default for PeriodConfig {
    fn default() -> Self {
        Self {
            utc_offset_hours: default_utc_offset_hours(),
            burn_rate_ratio: default_burn_rate_ratio(),
            hourly_retention: default_hourly_retention(),
        }
    }
}

/// What to do when persisted state cannot be read
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CorruptPolicy {
    /// Abort the job and leave the file untouched
    #[default]
    Fail,
    /// Treat as absent and carry on
    Ignore,
}

/// State store configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    #[serde(default = "default_stats_dir")]
    pub stats_dir: PathBuf,

    #[serde(default)]
    pub on_corrupt: CorruptPolicy,
}

fn default_stats_dir() -> PathBuf {
    PathBuf::from("./stats")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            stats_dir: default_stats_dir(),
            on_corrupt: CorruptPolicy::Fail,
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelemetryConfig {
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Prometheus text dump written when the run ends
    #[serde(default)]
    pub metrics_file: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        Self::load_optional(&path)?.with_context(|| {
            format!("Config file {} not found", path.as_ref().display())
        })
    }

    /// Like `load`, but `None` when the file does not exist.
    ///
    /// A file that exists but cannot be read, parsed or validated is an error.
    pub fn load_optional(path: impl AsRef<Path>) -> anyhow::Result<Option<Self>> {
        let path = path.as_ref();
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()))
            }
        };
        let config = Self::parse(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(Some(config))
    }

    /// The built-in configuration
    pub fn builtin() -> anyhow::Result<Self> {
        Self::parse(BUILTIN_CONFIG)
    }

    fn parse(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings no job can run with
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.reconcile.agreement_tolerance >= Decimal::ZERO,
            "reconcile.agreement_tolerance must not be negative"
        );
        ensure!(
            self.reconcile.source_timeout_secs > 0,
            "reconcile.source_timeout_secs must be positive"
        );
        ensure!(
            self.period.burn_rate_ratio > Decimal::ZERO,
            "period.burn_rate_ratio must be positive"
        );
        ensure!(
            (-23..=23).contains(&self.period.utc_offset_hours),
            "period.utc_offset_hours must be within -23..=23"
        );
        ensure!(
            self.token.max_supply > Decimal::ZERO,
            "token.max_supply must be positive"
        );
        Ok(())
    }
}
