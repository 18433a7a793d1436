//! Shared fixtures for integration tests

use httpmock::prelude::*;
use std::path::Path;
use supdog_stats::config::Config;

/// Example config with every endpoint pointed at `server` and state under `dir`
pub fn config_for(server: &MockServer, dir: &Path) -> Config {
    let mut config: Config = toml::from_str(include_str!("../../config.toml.example")).unwrap();
    config.sources.binance_url = server.base_url();
    config.sources.coingecko_url = server.base_url();
    config.sources.rpc_url = server.url("/rpc");
    config.sources.bscscan_url = server.url("/bscscan");
    config.sources.bscscan_key_env = "SUPDOG_STATS_IT_UNSET_KEY".to_string();
    config.reconcile.source_timeout_secs = 2;
    config.store.stats_dir = dir.to_path_buf();
    config
}

/// 32-byte hex word for an unsigned integer
pub fn uint_word(value: u128) -> String {
    format!("{:064x}", value)
}

pub fn rpc_result(word: String) -> serde_json::Value {
    serde_json::json!({ "jsonrpc": "2.0", "id": 0, "result": format!("0x{}", word) })
}

pub fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}
