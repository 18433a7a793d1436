//! Burn-rate volume estimate

use super::{AggregateError, PeriodRecord};
use crate::quantity::Quantity;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Latest estimate, as read by the dashboard
pub const VOLUME_ESTIMATE_DOCUMENT: &str = "volume-estimate.json";

/// Volume implied by one period's burn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeEstimate {
    pub date: String,
    pub burned: Decimal,
    pub estimated_volume: Decimal,
}

/// Supply burned between two records, floored at zero
pub fn burned_between(
    previous: &PeriodRecord,
    current: &PeriodRecord,
) -> Result<Decimal, AggregateError> {
    let field = Quantity::TotalSupply.name();
    let burned = previous.require(field)? - current.require(field)?;
    Ok(burned.max(Decimal::ZERO))
}

/// Traded volume needed to produce `burned` at `burn_rate_ratio`
pub fn volume_for(burned: Decimal, burn_rate_ratio: Decimal) -> Result<Decimal, AggregateError> {
    if burn_rate_ratio <= Decimal::ZERO {
        return Err(AggregateError::InvalidRatio(burn_rate_ratio));
    }
    Ok(burned / burn_rate_ratio)
}

/// Estimate volume for the newest period of a supply log.
///
/// Compares the last two records: the supply drop between them is the burn,
/// and volume is the burn divided by the fraction of each trade burned.
pub fn estimate_volume(
    log: &[PeriodRecord],
    burn_rate_ratio: Decimal,
) -> Result<VolumeEstimate, AggregateError> {
    let [.., previous, current] = log else {
        return Err(AggregateError::InsufficientHistory {
            needed: 2,
            found: log.len(),
        });
    };

    let burned = burned_between(previous, current)?;
    Ok(VolumeEstimate {
        date: current.period_key.clone(),
        burned,
        estimated_volume: volume_for(burned, burn_rate_ratio)?,
    })
}

impl VolumeEstimate {
    /// Volume log snapshot for this estimate
    pub fn snapshot(&self) -> std::collections::BTreeMap<String, Decimal> {
        std::collections::BTreeMap::from([
            ("burned".to_string(), self.burned),
            ("estimatedVolume".to_string(), self.estimated_volume),
        ])
    }
}
