//! Source reading module
//!
//! Every external data source (exchange tickers, the chain explorer, raw
//! contract calls) is a `Source` returning a number or failing. `read` turns
//! that into a `Reading` that never propagates an error.

mod binance;
mod bscscan;
mod coingecko;
mod rpc;
mod types;

pub use binance::{BinanceTicker, BINANCE_API_URL};
pub use bscscan::{BscScan, BscScanQuery, BSCSCAN_API_URL};
pub use coingecko::{CoinGeckoPrice, COINGECKO_API_URL};
pub use rpc::{PairPrice, PoolLiquidity, RpcClient, RpcTotalSupply, BSC_RPC_URL};
pub use types::{Reading, SanityFilter, SourceError};

use crate::quantity::Quantity;
use crate::telemetry::{self, CounterMetric, LatencyMetric};
use async_trait::async_trait;
use futures_util::future::join_all;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;
use std::time::{Duration, Instant};

/// Trait for a single external data source
#[async_trait]
pub trait Source: Send + Sync {
    /// Stable identifier used in readings and logs
    fn id(&self) -> &str;
    /// Fetch one raw value
    async fn fetch(&self) -> Result<Decimal, SourceError>;
}

/// Read one source, capturing every failure as `ok = false`
pub async fn read(source: &dyn Source, filter: SanityFilter, timeout: Duration) -> Reading {
    let id = source.id();
    let started = Instant::now();
    let result = match tokio::time::timeout(timeout, source.fetch()).await {
        Ok(result) => result.and_then(|value| filter.check(value)),
        Err(_) => Err(SourceError::Timeout(timeout)),
    };
    telemetry::record_latency(LatencyMetric::SourceFetch, id, started.elapsed());

    match result {
        Ok(value) => {
            tracing::debug!(source = id, %value, "Source read ok");
            Reading::success(id, value)
        }
        Err(e) => {
            tracing::warn!(source = id, error = %e, "Source unavailable");
            telemetry::increment(CounterMetric::SourceFailure, id);
            Reading::failure(id)
        }
    }
}

/// Read all sources for a quantity concurrently.
///
/// Readings come back in source rank order; the first source is the primary.
pub async fn read_all(
    quantity: Quantity,
    sources: &[Box<dyn Source>],
    timeout: Duration,
) -> Vec<Reading> {
    let filter = SanityFilter::for_quantity(quantity);
    join_all(
        sources
            .iter()
            .map(|source| read(source.as_ref(), filter, timeout)),
    )
    .await
}

/// Parse a JSON number or numeric string
pub(crate) fn decimal_from_json(value: &Value) -> Result<Decimal, SourceError> {
    match value {
        Value::String(s) => Decimal::from_str(s.trim())
            .map_err(|e| SourceError::Malformed(format!("not a number: {:?} ({})", s, e))),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Decimal::from(i))
            } else if let Some(u) = n.as_u64() {
                Ok(Decimal::from(u))
            } else {
                let f = n
                    .as_f64()
                    .ok_or_else(|| SourceError::Malformed(format!("not a number: {}", n)))?;
                Decimal::try_from(f)
                    .map_err(|e| SourceError::Malformed(format!("not finite: {} ({})", f, e)))
            }
        }
        other => Err(SourceError::Malformed(format!(
            "expected number, got {}",
            other
        ))),
    }
}

/// Scale a raw integer token amount by its decimals
pub(crate) fn scale_raw(raw: u128, decimals: u32) -> Result<Decimal, SourceError> {
    let mantissa = i128::try_from(raw)
        .map_err(|_| SourceError::Malformed(format!("amount out of range: {}", raw)))?;
    Decimal::try_from_i128_with_scale(mantissa, decimals)
        .map(|d| d.normalize())
        .map_err(|e| SourceError::Malformed(format!("amount out of range: {} ({})", raw, e)))
}
