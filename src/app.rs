//! Stats jobs
//!
//! Each job acquires or derives one group of quantities and leaves the stats
//! directory in the format the dashboard reads.

use crate::config::{Config, TokenConfig};
use crate::period::{
    build_dashboard, estimate_volume, AppendOutcome, DashboardRow, Granularity, PeriodAggregator,
    PeriodClock, PeriodLog, VolumeEstimate, DASHBOARD_DOCUMENT, VOLUME_ESTIMATE_DOCUMENT,
};
use crate::pipeline::Pipeline;
use crate::quantity::Quantity;
use crate::reconcile::ReconciledValue;
use crate::source::{
    BinanceTicker, BscScan, BscScanQuery, CoinGeckoPrice, PairPrice, PoolLiquidity, RpcClient,
    RpcTotalSupply, Source,
};
use crate::store::{FileStore, PersistedState, StateStore};
use alloy_primitives::Address;
use anyhow::{anyhow, bail, Context};
use chrono::{DateTime, Utc};
use reqwest::Client;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Result of the supply job
#[derive(Debug, Clone)]
pub struct SupplyReport {
    pub supply: ReconciledValue,
    pub burned: ReconciledValue,
    /// `None` when the supply was stale and the hourly log was left alone
    pub hourly: Option<AppendOutcome>,
}

/// Result of the liquidity job
#[derive(Debug, Clone)]
pub struct LiquidityReport {
    pub bnb: ReconciledValue,
    pub usd: ReconciledValue,
}

fn boxed(source: impl Source + 'static) -> Box<dyn Source> {
    Box::new(source)
}

fn parse_address(field: &str, value: &str) -> anyhow::Result<Address> {
    Address::from_str(value).with_context(|| format!("Invalid {}: {}", field, value))
}

/// On-chain addresses from the token config
#[derive(Debug, Clone)]
struct Contracts {
    token: Address,
    wbnb: Address,
    pair: Address,
    pools: Vec<Address>,
}

impl Contracts {
    fn from_config(token: &TokenConfig) -> anyhow::Result<Self> {
        let pools = token
            .liquidity_pools
            .iter()
            .map(|pool| parse_address("token.liquidity_pools", pool))
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(Self {
            token: parse_address("token.address", &token.address)?,
            wbnb: parse_address("token.wbnb_address", &token.wbnb_address)?,
            pair: parse_address("token.pair_address", &token.pair_address)?,
            pools,
        })
    }
}

/// Configured sources, pipeline and period logs for one run
pub struct App {
    config: Config,
    client: Client,
    rpc: RpcClient,
    contracts: Contracts,
    pipeline: Pipeline,
}

impl App {
    pub fn new(config: Config, store: Arc<dyn StateStore>) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.reconcile.source_timeout_secs))
            .user_agent(concat!("supdog-stats/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;
        let rpc = RpcClient::new(&config.sources.rpc_url).context("Failed to create RPC client")?;
        let contracts = Contracts::from_config(&config.token)?;
        let pipeline = Pipeline::from_config(store, &config);

        Ok(Self {
            config,
            client,
            rpc,
            contracts,
            pipeline,
        })
    }

    /// App writing to the configured stats directory
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let store = Arc::new(FileStore::new(config.store.stats_dir.clone()));
        Self::new(config, store)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn store(&self) -> &Arc<dyn StateStore> {
        self.pipeline.store()
    }

    fn bscscan(&self, query: BscScanQuery) -> BscScan {
        let sources = &self.config.sources;
        BscScan::new(
            self.client.clone(),
            sources.bscscan_url.clone(),
            sources.bscscan_key_env.clone(),
            self.config.token.address.clone(),
            self.config.token.decimals,
            query,
        )
    }

    /// Sources for a quantity in rank order. Derived quantities have none.
    pub fn sources(&self, quantity: Quantity) -> Vec<Box<dyn Source>> {
        let sources = &self.config.sources;
        let contracts = &self.contracts;

        match quantity {
            Quantity::BnbPrice => vec![
                boxed(BinanceTicker::new(
                    self.client.clone(),
                    sources.binance_url.clone(),
                    sources.binance_symbol.clone(),
                )),
                boxed(CoinGeckoPrice::new(
                    self.client.clone(),
                    sources.coingecko_url.clone(),
                    sources.coingecko_id.clone(),
                    "usd",
                )),
            ],
            Quantity::TokenPrice => vec![boxed(PairPrice::new(
                self.rpc.clone(),
                contracts.pair,
                contracts.token,
                self.config.token.decimals,
            ))],
            Quantity::TotalSupply => vec![
                boxed(RpcTotalSupply::new(
                    self.rpc.clone(),
                    contracts.token,
                    self.config.token.decimals,
                )),
                boxed(self.bscscan(BscScanQuery::TokenSupply)),
            ],
            Quantity::LiquidityBnb => vec![boxed(PoolLiquidity::new(
                self.rpc.clone(),
                contracts.wbnb,
                contracts.pools.clone(),
            ))],
            Quantity::Holders => vec![boxed(self.bscscan(BscScanQuery::HolderCount))],
            Quantity::TotalBurned | Quantity::LiquidityUsd => Vec::new(),
        }
    }

    fn clock(&self, granularity: Granularity) -> anyhow::Result<PeriodClock> {
        PeriodClock::from_hours(self.config.period.utc_offset_hours, granularity).ok_or_else(|| {
            anyhow!(
                "invalid utc offset: {} hours",
                self.config.period.utc_offset_hours
            )
        })
    }

    async fn acquire(&self, quantity: Quantity) -> anyhow::Result<ReconciledValue> {
        let value = self
            .pipeline
            .acquire(quantity, &self.sources(quantity))
            .await
            .with_context(|| format!("Failed to acquire {}", quantity))?;
        Ok(value)
    }

    pub async fn bnb_price(&self) -> anyhow::Result<ReconciledValue> {
        self.acquire(Quantity::BnbPrice).await
    }

    pub async fn token_price(&self) -> anyhow::Result<ReconciledValue> {
        self.acquire(Quantity::TokenPrice).await
    }

    pub async fn holders(&self) -> anyhow::Result<ReconciledValue> {
        self.acquire(Quantity::Holders).await
    }

    /// Total supply, burned supply and the hourly supply log
    pub async fn supply(&self, now: DateTime<Utc>) -> anyhow::Result<SupplyReport> {
        let supply = self.acquire(Quantity::TotalSupply).await?;
        let burned = self.pipeline.derive(
            Quantity::TotalBurned,
            self.config.token.max_supply - supply.value,
            &supply,
        )?;

        let hourly = if supply.is_stale() {
            tracing::info!("Supply is stale, hourly log unchanged");
            None
        } else {
            let aggregator = PeriodAggregator::new(self.clock(Granularity::Hour)?)
                .with_retention(self.config.period.hourly_retention);
            let mut log = self.store().load_log(PeriodLog::HourlySupply)?;
            aggregator.normalize_keys(&mut log);
            let snapshot = BTreeMap::from([(Quantity::TotalSupply.name().to_string(), supply.value)]);
            let outcome = aggregator.record(&mut log, snapshot, now);
            self.store().save_log(PeriodLog::HourlySupply, &log)?;
            Some(outcome)
        };

        Ok(SupplyReport {
            supply,
            burned,
            hourly,
        })
    }

    /// Pool liquidity in BNB, valued in USD at the persisted BNB price
    pub async fn liquidity(&self) -> anyhow::Result<LiquidityReport> {
        let bnb = self.acquire(Quantity::LiquidityBnb).await?;
        let bnb_price = self
            .pipeline
            .load_previous(Quantity::BnbPrice)?
            .ok_or_else(|| anyhow!("no {} persisted yet, run bnb-price first", Quantity::BnbPrice))?;

        let usd = self
            .pipeline
            .derive(Quantity::LiquidityUsd, bnb.value * bnb_price.value, &bnb)?;
        Ok(LiquidityReport { bnb, usd })
    }

    /// Snapshot every persisted quantity into the daily log
    pub fn daily_log(&self, now: DateTime<Utc>) -> anyhow::Result<AppendOutcome> {
        let mut snapshot = BTreeMap::new();
        for quantity in Quantity::ALL {
            if let Some(state) = self.pipeline.load_previous(quantity)? {
                snapshot.insert(quantity.name().to_string(), state.value);
            }
        }
        if !snapshot.contains_key(Quantity::TotalSupply.name()) {
            bail!("no {} persisted yet, run supply first", Quantity::TotalSupply);
        }

        let aggregator = PeriodAggregator::new(self.clock(Granularity::Day)?);
        let mut log = self.store().load_log(PeriodLog::Daily)?;
        let outcome = aggregator.record(&mut log, snapshot, now);
        self.store().save_log(PeriodLog::Daily, &log)?;
        Ok(outcome)
    }

    /// Estimate the latest day's volume, write it out and record it in the
    /// volume log
    pub fn volume(&self, now: DateTime<Utc>) -> anyhow::Result<VolumeEstimate> {
        let daily = self.store().load_log(PeriodLog::Daily)?;
        let estimate = estimate_volume(&daily, self.config.period.burn_rate_ratio)
            .context("Failed to estimate volume from the daily log")?;
        self.store()
            .write_document(VOLUME_ESTIMATE_DOCUMENT, &serde_json::to_value(&estimate)?)?;

        let aggregator = PeriodAggregator::new(self.clock(Granularity::Day)?);
        let mut log = self.store().load_log(PeriodLog::Volume)?;
        let outcome = aggregator.append_or_patch(&mut log, &estimate.date, estimate.snapshot(), now);
        if outcome != AppendOutcome::Unchanged {
            self.store().save_log(PeriodLog::Volume, &log)?;
        }
        Ok(estimate)
    }

    /// Rebuild the dashboard series
    pub fn dashboard(&self, now: DateTime<Utc>) -> anyhow::Result<Vec<DashboardRow>> {
        let daily = self.store().load_log(PeriodLog::Daily)?;
        let mut hourly = self.store().load_log(PeriodLog::HourlySupply)?;
        PeriodAggregator::new(self.clock(Granularity::Hour)?).normalize_keys(&mut hourly);
        let today = self.clock(Granularity::Day)?.key_for(now);

        let rows = build_dashboard(&daily, &hourly, self.config.period.burn_rate_ratio, &today)
            .context("Failed to build dashboard rows")?;
        self.store()
            .write_document(DASHBOARD_DOCUMENT, &serde_json::to_value(&rows)?)?;
        tracing::info!(rows = rows.len(), "Dashboard written");
        Ok(rows)
    }

    /// Persisted state of every quantity
    pub fn status(&self) -> anyhow::Result<Vec<(Quantity, Option<PersistedState>)>> {
        let mut status = Vec::with_capacity(Quantity::ALL.len());
        for quantity in Quantity::ALL {
            status.push((quantity, self.store().load(quantity)?));
        }
        Ok(status)
    }
}
