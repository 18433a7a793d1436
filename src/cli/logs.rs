//! Period log commands

use crate::app::App;
use chrono::{DateTime, Utc};

pub fn daily_log(app: &App, now: DateTime<Utc>) -> anyhow::Result<()> {
    let outcome = app.daily_log(now)?;
    println!("daily log: {:?}", outcome);
    Ok(())
}

pub fn volume(app: &App, now: DateTime<Utc>) -> anyhow::Result<()> {
    let estimate = app.volume(now)?;
    println!(
        "{}: burned {}, estimated volume {}",
        estimate.date, estimate.burned, estimate.estimated_volume
    );
    Ok(())
}

pub fn dashboard(app: &App, now: DateTime<Utc>) -> anyhow::Result<()> {
    let rows = app.dashboard(now)?;
    match rows.last() {
        Some(last) => println!(
            "dashboard: {} rows, latest {} supply {} volume {}",
            rows.len(),
            last.date,
            last.total_supply,
            last.volume
        ),
        None => println!("dashboard: no rows yet"),
    }
    Ok(())
}
