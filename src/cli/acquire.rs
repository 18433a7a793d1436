//! Acquisition commands

use crate::app::App;
use crate::reconcile::ReconciledValue;
use chrono::{DateTime, Utc};

fn print_value(value: &ReconciledValue) {
    println!(
        "{}: {} ({:?}, {})",
        value.quantity,
        value.value,
        value.basis,
        value.timestamp.to_rfc3339()
    );
}

pub async fn bnb_price(app: &App) -> anyhow::Result<()> {
    print_value(&app.bnb_price().await?);
    Ok(())
}

pub async fn token_price(app: &App) -> anyhow::Result<()> {
    print_value(&app.token_price().await?);
    Ok(())
}

pub async fn holders(app: &App) -> anyhow::Result<()> {
    print_value(&app.holders().await?);
    Ok(())
}

pub async fn supply(app: &App, now: DateTime<Utc>) -> anyhow::Result<()> {
    let report = app.supply(now).await?;
    print_value(&report.supply);
    print_value(&report.burned);
    if let Some(outcome) = report.hourly {
        println!("hourly log: {:?}", outcome);
    }
    Ok(())
}

pub async fn liquidity(app: &App) -> anyhow::Result<()> {
    let report = app.liquidity().await?;
    print_value(&report.bnb);
    print_value(&report.usd);
    Ok(())
}
