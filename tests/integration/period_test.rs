//! Daily log, volume estimate and dashboard over a file store

use chrono::{TimeZone, Utc};
use rust_decimal_macros::dec;
use serde_json::json;
use std::sync::Arc;
use supdog_stats::app::App;
use supdog_stats::config::Config;
use supdog_stats::period::{AppendOutcome, PeriodLog};
use supdog_stats::store::{FileStore, StateStore};
use tempfile::TempDir;

fn app(dir: &TempDir) -> (App, Arc<FileStore>) {
    let mut config: Config = toml::from_str(include_str!("../../config.toml.example")).unwrap();
    config.store.stats_dir = dir.path().to_path_buf();
    let store = Arc::new(FileStore::new(dir.path()));
    (App::new(config, store.clone()).unwrap(), store)
}

fn read(dir: &TempDir, name: &str) -> serde_json::Value {
    serde_json::from_str(&std::fs::read_to_string(dir.path().join(name)).unwrap()).unwrap()
}

#[test]
fn test_daily_burn_to_volume() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("daily-log.json"),
        r#"[{ "date": "2025-07-10", "totalSupply": 900000000 }]"#,
    )
    .unwrap();
    std::fs::write(
        dir.path().join("total-supply.json"),
        r#"{ "totalSupply": 899950000, "totalBurned": 100050000, "timestamp": "2025-07-11T19:00:00Z" }"#,
    )
    .unwrap();

    let (app, store) = app(&dir);
    let evening = Utc.with_ymd_and_hms(2025, 7, 11, 23, 0, 0).unwrap();
    assert_eq!(app.daily_log(evening).unwrap(), AppendOutcome::Appended);

    let estimate = app.volume(evening).unwrap();
    assert_eq!(estimate.date, "2025-07-11");
    assert_eq!(estimate.burned, dec!(50000));
    assert_eq!(estimate.estimated_volume, dec!(2500000));

    assert_eq!(
        read(&dir, "volume-estimate.json"),
        json!({ "date": "2025-07-11", "burned": 50000.0, "estimatedVolume": 2500000.0 })
    );

    let volume_log = store.load_log(PeriodLog::Volume).unwrap();
    assert_eq!(volume_log.len(), 1);
    assert_eq!(volume_log[0].get("estimatedVolume"), Some(dec!(2500000)));

    // the earlier day is closed and stays as written
    let daily = read(&dir, "daily-log.json");
    assert_eq!(daily[0], json!({ "date": "2025-07-10", "totalSupply": 900000000.0 }));
    assert_eq!(daily[1]["date"], "2025-07-11");
}

#[test]
fn test_volume_needs_two_days() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("daily-log.json"),
        r#"[{ "date": "2025-07-11", "totalSupply": 899950000 }]"#,
    )
    .unwrap();

    let (app, _) = app(&dir);
    let err = app.volume(Utc::now()).unwrap_err();
    assert!(format!("{:#}", err).contains("at least 2"));
    assert!(!dir.path().join("volume-log.json").exists());
    assert!(!dir.path().join("volume-estimate.json").exists());
}

#[test]
fn test_dashboard_document() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("daily-log.json"),
        r#"[
            { "date": "2025-07-10", "totalSupply": 900000000 },
            { "date": "2025-07-11", "totalSupply": 899950000, "tokenPrice": 0.000002,
              "liquidityBnb": 30, "liquidityUsd": 18000 }
        ]"#,
    )
    .unwrap();
    std::fs::write(
        dir.path().join("total-supply-log.json"),
        r#"[
            { "date": "2025-07-12T08", "totalSupply": 899940000 },
            { "date": "2025-07-12T09", "totalSupply": 899930000 }
        ]"#,
    )
    .unwrap();

    let (app, _) = app(&dir);
    let now = Utc.with_ymd_and_hms(2025, 7, 12, 15, 0, 0).unwrap();
    let rows = app.dashboard(now).unwrap();
    assert_eq!(rows.len(), 2);

    let doc = read(&dir, "all-data.json");
    assert_eq!(doc[0]["date"], "2025-07-11");
    assert_eq!(doc[0]["burned"], json!(50000.0));
    assert_eq!(doc[0]["volume"], json!(2500000.0));
    assert_eq!(doc[0]["liquidityUSD"], json!(18000.0));
    assert_eq!(doc[1]["date"], "2025-07-12");
    assert_eq!(doc[1]["totalSupply"], json!(899930000.0));
    assert_eq!(doc[1]["burned"], json!(10000.0));
}

#[test]
fn test_dashboard_reads_legacy_hourly_keys() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("daily-log.json"),
        r#"[
            { "date": "2025-07-10", "totalSupply": 900000000 },
            { "date": "2025-07-11", "totalSupply": 899950000 }
        ]"#,
    )
    .unwrap();
    // 03:30 UTC on the 12th is still the evening of the 11th at UTC-5
    std::fs::write(
        dir.path().join("total-supply-log.json"),
        r#"[
            { "date": "2025-07-11T20:00:00.000Z", "totalSupply": 899948000 },
            { "date": "2025-07-12T03:30:00.000Z", "totalSupply": 899945000 }
        ]"#,
    )
    .unwrap();

    let (app, _) = app(&dir);
    let now = Utc.with_ymd_and_hms(2025, 7, 12, 15, 0, 0).unwrap();
    let rows = app.dashboard(now).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].date, "2025-07-11");

    // a later sample in the same local day becomes today's row
    std::fs::write(
        dir.path().join("total-supply-log.json"),
        r#"[
            { "date": "2025-07-12T03:30:00.000Z", "totalSupply": 899945000 },
            { "date": "2025-07-12T14:10:00.000Z", "totalSupply": 899930000 }
        ]"#,
    )
    .unwrap();
    let rows = app.dashboard(now).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].date, "2025-07-12");
    assert_eq!(rows[1].total_supply, dec!(899930000));
    assert_eq!(rows[1].burned, dec!(15000));
}
