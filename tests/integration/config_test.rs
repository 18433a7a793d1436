//! Configuration loading

use rust_decimal_macros::dec;
use supdog_stats::config::{Config, CorruptPolicy};
use supdog_stats::telemetry::LogFormat;
use tempfile::NamedTempFile;

#[test]
fn test_load_example_config() {
    let file = NamedTempFile::new().unwrap();
    std::fs::write(file.path(), include_str!("../../config.toml.example")).unwrap();

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.token.decimals, 9);
    assert_eq!(config.token.max_supply, dec!(1000000000));
    assert_eq!(config.sources.binance_symbol, "BNBUSDT");
    assert_eq!(config.reconcile.agreement_tolerance, dec!(0.02));
    assert_eq!(config.period.utc_offset_hours, -5);
    assert_eq!(config.store.on_corrupt, CorruptPolicy::Fail);
    assert_eq!(config.telemetry.log_format, LogFormat::Pretty);
}

#[test]
fn test_load_rejects_invalid_values() {
    let file = NamedTempFile::new().unwrap();
    let content = include_str!("../../config.toml.example")
        .replace("burn_rate_ratio = 0.02", "burn_rate_ratio = 0");
    std::fs::write(file.path(), content).unwrap();

    let err = Config::load(file.path()).unwrap_err();
    assert!(format!("{:#}", err).contains("burn_rate_ratio"));
}

#[test]
fn test_load_rejects_unknown_corrupt_policy() {
    let file = NamedTempFile::new().unwrap();
    let content = include_str!("../../config.toml.example")
        .replace("on_corrupt = \"fail\"", "on_corrupt = \"retry\"");
    std::fs::write(file.path(), content).unwrap();

    assert!(Config::load(file.path()).is_err());
}

#[test]
fn test_missing_file_is_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    assert!(Config::load_optional(&path).unwrap().is_none());
    assert!(Config::load(&path).is_err());
}

#[test]
fn test_invalid_file_does_not_fall_back() {
    let file = NamedTempFile::new().unwrap();
    let content = include_str!("../../config.toml.example")
        .replace("agreement_tolerance = 0.02", "agreement_tolerance = -1");
    std::fs::write(file.path(), content).unwrap();

    let err = Config::load_optional(file.path()).unwrap_err();
    assert!(format!("{:#}", err).contains("agreement_tolerance"));
}

#[test]
fn test_unparseable_file_does_not_fall_back() {
    let file = NamedTempFile::new().unwrap();
    std::fs::write(file.path(), "[token\naddress = ").unwrap();

    assert!(Config::load_optional(file.path()).is_err());
}
