//! End-to-end job runs against mocked sources and a file store

mod common;

use chrono::{TimeZone, Utc};
use common::{config_for, read_json, rpc_result, uint_word};
use httpmock::prelude::*;
use rust_decimal_macros::dec;
use serde_json::json;
use supdog_stats::app::App;
use supdog_stats::config::CorruptPolicy;
use supdog_stats::period::AppendOutcome;
use supdog_stats::reconcile::Basis;
use tempfile::TempDir;

async fn mock_bnb_price(server: &MockServer, binance: &str, coingecko: f64) {
    let binance = binance.to_string();
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v3/ticker/price");
            then.status(200)
                .json_body(json!({ "symbol": "BNBUSDT", "price": binance }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v3/simple/price");
            then.status(200)
                .json_body(json!({ "binancecoin": { "usd": coingecko } }));
        })
        .await;
}

#[tokio::test]
async fn test_bnb_price_agreed_and_persisted() {
    let server = MockServer::start_async().await;
    let dir = TempDir::new().unwrap();
    mock_bnb_price(&server, "600.00000000", 605.0).await;

    let app = App::from_config(config_for(&server, dir.path())).unwrap();
    let value = app.bnb_price().await.unwrap();

    assert_eq!(value.value, dec!(602.5));
    assert_eq!(value.basis, Basis::Agreed);

    let file = read_json(&dir.path().join("bnb-price.json"));
    assert_eq!(file["price"], json!(602.5));
    assert!(file["timestamp"].is_string());
}

#[tokio::test]
async fn test_bnb_price_disagreement_trusts_binance() {
    let server = MockServer::start_async().await;
    let dir = TempDir::new().unwrap();
    mock_bnb_price(&server, "600", 700.0).await;

    let app = App::from_config(config_for(&server, dir.path())).unwrap();
    let value = app.bnb_price().await.unwrap();

    assert_eq!(value.value, dec!(600));
    assert_eq!(value.basis, Basis::SingleSourceFallback);
}

#[tokio::test]
async fn test_outage_serves_stale_and_keeps_file() {
    let server = MockServer::start_async().await;
    let dir = TempDir::new().unwrap();
    let previous = r#"{ "price": 598.3, "timestamp": "2025-07-10T08:00:00.000Z" }"#;
    std::fs::write(dir.path().join("bnb-price.json"), previous).unwrap();
    server
        .mock_async(|when, then| {
            when.method(GET);
            then.status(503);
        })
        .await;

    let app = App::from_config(config_for(&server, dir.path())).unwrap();
    let value = app.bnb_price().await.unwrap();

    assert_eq!(value.value, dec!(598.3));
    assert_eq!(value.basis, Basis::StaleFallback);
    assert_eq!(
        std::fs::read_to_string(dir.path().join("bnb-price.json")).unwrap(),
        previous
    );
}

#[tokio::test]
async fn test_first_run_outage_is_fatal() {
    let server = MockServer::start_async().await;
    let dir = TempDir::new().unwrap();
    server
        .mock_async(|when, then| {
            when.method(GET);
            then.status(503);
        })
        .await;

    let app = App::from_config(config_for(&server, dir.path())).unwrap();
    let err = app.bnb_price().await.unwrap_err();

    assert!(format!("{:#}", err).contains("no data"));
    assert!(!dir.path().join("bnb-price.json").exists());
}

#[tokio::test]
async fn test_supply_derives_burned_and_logs_hour() {
    let server = MockServer::start_async().await;
    let dir = TempDir::new().unwrap();
    server
        .mock_async(|when, then| {
            when.method(POST).path("/rpc").body_contains("0x18160ddd");
            then.status(200)
                .json_body(rpc_result(uint_word(899_950_000 * 10u128.pow(9))));
        })
        .await;

    // explorer key is unset, so the explorer reading fails and rpc stands alone
    let app = App::from_config(config_for(&server, dir.path())).unwrap();
    let now = Utc.with_ymd_and_hms(2025, 7, 11, 19, 30, 0).unwrap();
    let report = app.supply(now).await.unwrap();

    assert_eq!(report.supply.value, dec!(899950000));
    assert_eq!(report.supply.basis, Basis::SingleSourceFallback);
    assert_eq!(report.burned.value, dec!(100050000));
    assert_eq!(report.hourly, Some(AppendOutcome::Appended));

    let file = read_json(&dir.path().join("total-supply.json"));
    assert_eq!(file["totalSupply"], json!(899950000.0));
    assert_eq!(file["totalBurned"], json!(100050000.0));

    let hourly = read_json(&dir.path().join("total-supply-log.json"));
    assert_eq!(hourly[0]["date"], "2025-07-11T14");
}

#[tokio::test]
async fn test_supply_increase_rejected() {
    let server = MockServer::start_async().await;
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("total-supply.json"),
        r#"{ "totalSupply": 900000000, "totalBurned": 100000000, "timestamp": "2025-07-10T08:00:00Z" }"#,
    )
    .unwrap();
    server
        .mock_async(|when, then| {
            when.method(POST).path("/rpc");
            then.status(200)
                .json_body(rpc_result(uint_word(905_000_000 * 10u128.pow(9))));
        })
        .await;

    let app = App::from_config(config_for(&server, dir.path())).unwrap();
    let report = app.supply(Utc::now()).await.unwrap();

    assert_eq!(report.supply.value, dec!(900000000));
    assert_eq!(report.supply.basis, Basis::StaleFallback);
    assert_eq!(report.burned.value, dec!(100000000));
    assert!(report.hourly.is_none());
    assert!(!dir.path().join("total-supply-log.json").exists());
}

#[tokio::test]
async fn test_corrupt_state_aborts_without_overwrite() {
    let server = MockServer::start_async().await;
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("bnb-price.json"), "{ not json").unwrap();
    mock_bnb_price(&server, "600", 605.0).await;

    let app = App::from_config(config_for(&server, dir.path())).unwrap();
    assert!(app.bnb_price().await.is_err());
    assert_eq!(
        std::fs::read_to_string(dir.path().join("bnb-price.json")).unwrap(),
        "{ not json"
    );
}

#[tokio::test]
async fn test_corrupt_state_ignored_by_policy() {
    let server = MockServer::start_async().await;
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("bnb-price.json"), "{ not json").unwrap();
    mock_bnb_price(&server, "600", 605.0).await;

    let mut config = config_for(&server, dir.path());
    config.store.on_corrupt = CorruptPolicy::Ignore;
    let app = App::from_config(config).unwrap();

    assert_eq!(app.bnb_price().await.unwrap().value, dec!(602.5));
    assert_eq!(read_json(&dir.path().join("bnb-price.json"))["price"], json!(602.5));
}

#[tokio::test]
async fn test_liquidity_valued_at_persisted_bnb_price() {
    let server = MockServer::start_async().await;
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("bnb-price.json"),
        r#"{ "price": 600, "timestamp": "2025-07-11T08:00:00Z" }"#,
    )
    .unwrap();
    server
        .mock_async(|when, then| {
            when.method(POST).path("/rpc").body_contains("0x70a08231");
            then.status(200)
                .json_body(rpc_result(uint_word(5 * 10u128.pow(18))));
        })
        .await;

    let app = App::from_config(config_for(&server, dir.path())).unwrap();
    let report = app.liquidity().await.unwrap();

    // three pools, 5 WBNB each, both sides counted
    assert_eq!(report.bnb.value, dec!(30));
    assert_eq!(report.usd.value, dec!(18000));

    let file = read_json(&dir.path().join("liquidity.json"));
    assert_eq!(file["totalBNB"], json!(30.0));
    assert_eq!(file["totalUSD"], json!(18000.0));
}
