//! supdog-stats: reconciled price, supply and liquidity stats for a BSC token
//!
//! This library provides the core components for:
//! - Reading independent sources (exchange tickers, explorer API, contract calls)
//! - Quorum reconciliation with stale fallback
//! - Monotonic guards for supply and burn
//! - Durable last-known-good state in JSON files
//! - Daily and hourly period logs, volume estimates and the dashboard series

pub mod app;
pub mod cli;
pub mod config;
pub mod period;
pub mod pipeline;
pub mod quantity;
pub mod reconcile;
pub mod source;
pub mod store;
pub mod telemetry;
