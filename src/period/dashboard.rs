//! Consolidated series for the stats dashboard

use super::volume::{burned_between, volume_for};
use super::{AggregateError, PeriodRecord};
use crate::quantity::Quantity;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Name of the document the dashboard reads
pub const DASHBOARD_DOCUMENT: &str = "all-data.json";

/// One charted day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardRow {
    pub date: String,
    pub total_supply: Decimal,
    pub burned: Decimal,
    pub volume: Decimal,
    pub price: Option<Decimal>,
    #[serde(rename = "liquidityUSD")]
    pub liquidity_usd: Option<Decimal>,
    #[serde(rename = "liquidityBNB")]
    pub liquidity_bnb: Option<Decimal>,
}

fn round(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

impl DashboardRow {
    /// Row comparing `current` supply against `previous`, market fields from `market`
    fn between(
        date: &str,
        previous: &PeriodRecord,
        current: &PeriodRecord,
        market: Option<&PeriodRecord>,
        burn_rate_ratio: Decimal,
    ) -> Result<Self, AggregateError> {
        let burned = burned_between(previous, current)?;
        let field = |q: Quantity| market.and_then(|r| r.get(q.name()));

        Ok(Self {
            date: date.to_string(),
            total_supply: round(current.require(Quantity::TotalSupply.name())?, 2),
            burned: round(burned, 2),
            volume: round(volume_for(burned, burn_rate_ratio)?, 2),
            price: field(Quantity::TokenPrice).map(|v| round(v, 9)),
            liquidity_usd: field(Quantity::LiquidityUsd).map(|v| round(v, 2)),
            liquidity_bnb: field(Quantity::LiquidityBnb).map(|v| round(v, 5)),
        })
    }
}

/// Build dashboard rows from the daily log.
///
/// One row per adjacent pair of daily records. When the hourly supply log has
/// entries for `today`, today's row is rebuilt from the latest of them,
/// compared with the hourly entry before it (or the last earlier daily record
/// when there is none).
pub fn build_dashboard(
    daily: &[PeriodRecord],
    hourly: &[PeriodRecord],
    burn_rate_ratio: Decimal,
    today: &str,
) -> Result<Vec<DashboardRow>, AggregateError> {
    let mut rows = daily
        .windows(2)
        .map(|pair| {
            DashboardRow::between(
                &pair[1].period_key,
                &pair[0],
                &pair[1],
                Some(&pair[1]),
                burn_rate_ratio,
            )
        })
        .collect::<Result<Vec<_>, _>>()?;

    let latest_today = hourly
        .iter()
        .rposition(|r| r.period_key.starts_with(today));

    if let Some(index) = latest_today {
        let current = &hourly[index];
        let previous = index
            .checked_sub(1)
            .map(|i| &hourly[i])
            .or_else(|| daily.iter().rev().find(|r| r.period_key.as_str() < today));

        if let Some(previous) = previous {
            let market = daily
                .iter()
                .find(|r| r.period_key == today)
                .or_else(|| daily.last());
            let row = DashboardRow::between(today, previous, current, market, burn_rate_ratio)?;

            match rows.iter_mut().find(|r| r.date == today) {
                Some(existing) => *existing = row,
                None => rows.push(row),
            }
        } else {
            tracing::debug!(today, "No earlier supply to compare today's hourly entry with");
        }
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;

    fn record(key: &str, fields: &[(&str, Decimal)]) -> PeriodRecord {
        PeriodRecord::new(
            key,
            fields
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect::<BTreeMap<_, _>>(),
        )
    }

    #[test]
    fn test_rows_from_daily_pairs() {
        let daily = vec![
            record("2025-07-10", &[("totalSupply", dec!(900000000))]),
            record(
                "2025-07-11",
                &[
                    ("totalSupply", dec!(899950000)),
                    ("tokenPrice", dec!(0.0000012345678)),
                    ("liquidityUsd", dec!(123456.789)),
                    ("liquidityBnb", dec!(205.123456)),
                ],
            ),
        ];

        let rows = build_dashboard(&daily, &[], dec!(0.02), "2025-07-12").unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.date, "2025-07-11");
        assert_eq!(row.burned, dec!(50000));
        assert_eq!(row.volume, dec!(2500000));
        assert_eq!(row.price, Some(dec!(0.000001235)));
        assert_eq!(row.liquidity_usd, Some(dec!(123456.79)));
        assert_eq!(row.liquidity_bnb, Some(dec!(205.12346)));
    }

    #[test]
    fn test_today_patched_from_hourly() {
        let daily = vec![
            record("2025-07-10", &[("totalSupply", dec!(900000000))]),
            record(
                "2025-07-11",
                &[("totalSupply", dec!(899990000)), ("tokenPrice", dec!(0.000002))],
            ),
        ];
        let hourly = vec![
            record("2025-07-11T08", &[("totalSupply", dec!(899990000))]),
            record("2025-07-11T09", &[("totalSupply", dec!(899980000))]),
        ];

        let rows = build_dashboard(&daily, &hourly, dec!(0.02), "2025-07-11").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date, "2025-07-11");
        assert_eq!(rows[0].total_supply, dec!(899980000));
        assert_eq!(rows[0].burned, dec!(10000));
        assert_eq!(rows[0].volume, dec!(500000));
        assert_eq!(rows[0].price, Some(dec!(0.000002)));
    }

    #[test]
    fn test_today_appended_against_previous_day() {
        let daily = vec![record("2025-07-10", &[("totalSupply", dec!(900000000))])];
        let hourly = vec![record("2025-07-11T00", &[("totalSupply", dec!(899950000))])];

        let rows = build_dashboard(&daily, &hourly, dec!(0.02), "2025-07-11").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date, "2025-07-11");
        assert_eq!(rows[0].burned, dec!(50000));
        assert_eq!(rows[0].price, None);
    }

    #[test]
    fn test_empty_logs() {
        assert!(build_dashboard(&[], &[], dec!(0.02), "2025-07-11")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_serialized_field_names() {
        let row = DashboardRow {
            date: "2025-07-11".to_string(),
            total_supply: dec!(899950000),
            burned: dec!(50000),
            volume: dec!(2500000),
            price: None,
            liquidity_usd: Some(dec!(1.5)),
            liquidity_bnb: Some(dec!(0.5)),
        };
        let json = serde_json::to_value(&row).unwrap();
        assert!(json.get("totalSupply").is_some());
        assert!(json.get("liquidityUSD").is_some());
        assert!(json.get("liquidityBNB").is_some());
        assert!(json["price"].is_null());
    }
}
