//! Tracked quantities and their invariants

use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction a quantity is allowed to move across runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// No directional constraint
    Free,
    /// May only stay flat or decrease (circulating supply)
    NonIncreasing,
    /// May only stay flat or increase (cumulative burn)
    NonDecreasing,
}

/// A named metric tracked over time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Quantity {
    /// BNB price in USD
    BnbPrice,
    /// Token price in BNB, from the LP pair reserves
    TokenPrice,
    /// Circulating token supply
    TotalSupply,
    /// Cumulative burned amount
    TotalBurned,
    /// WBNB held across liquidity pools, both sides counted
    LiquidityBnb,
    /// Pool liquidity valued in USD
    LiquidityUsd,
    /// Holder count
    Holders,
}

impl Quantity {
    pub const ALL: [Quantity; 7] = [
        Quantity::BnbPrice,
        Quantity::TokenPrice,
        Quantity::TotalSupply,
        Quantity::TotalBurned,
        Quantity::LiquidityBnb,
        Quantity::LiquidityUsd,
        Quantity::Holders,
    ];

    /// Logical name used in logs and metrics
    pub fn name(&self) -> &'static str {
        match self {
            Quantity::BnbPrice => "bnbPrice",
            Quantity::TokenPrice => "tokenPrice",
            Quantity::TotalSupply => "totalSupply",
            Quantity::TotalBurned => "totalBurned",
            Quantity::LiquidityBnb => "liquidityBnb",
            Quantity::LiquidityUsd => "liquidityUsd",
            Quantity::Holders => "holders",
        }
    }

    /// Stats file holding this quantity's last accepted value.
    ///
    /// Quantities that are always produced together share a file; each one
    /// owns only its own field inside it.
    pub fn file_name(&self) -> &'static str {
        match self {
            Quantity::BnbPrice => "bnb-price.json",
            Quantity::TokenPrice => "token-price.json",
            Quantity::TotalSupply | Quantity::TotalBurned => "total-supply.json",
            Quantity::LiquidityBnb | Quantity::LiquidityUsd => "liquidity.json",
            Quantity::Holders => "holders.json",
        }
    }

    /// JSON field the dashboard reads this quantity from
    pub fn field(&self) -> &'static str {
        match self {
            Quantity::BnbPrice | Quantity::TokenPrice => "price",
            Quantity::TotalSupply => "totalSupply",
            Quantity::TotalBurned => "totalBurned",
            Quantity::LiquidityBnb => "totalBNB",
            Quantity::LiquidityUsd => "totalUSD",
            Quantity::Holders => "holders",
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            Quantity::TotalSupply => Direction::NonIncreasing,
            Quantity::TotalBurned => Direction::NonDecreasing,
            _ => Direction::Free,
        }
    }

    /// Whether a zero reading is a legitimate observation.
    ///
    /// A zero price, supply or pool reserve means the upstream read broke;
    /// a zero burn total is a real starting state.
    pub fn allows_zero(&self) -> bool {
        matches!(self, Quantity::TotalBurned)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supply_and_burn_directions() {
        assert_eq!(Quantity::TotalSupply.direction(), Direction::NonIncreasing);
        assert_eq!(Quantity::TotalBurned.direction(), Direction::NonDecreasing);
        assert_eq!(Quantity::BnbPrice.direction(), Direction::Free);
    }

    #[test]
    fn test_shared_files_use_distinct_fields() {
        assert_eq!(
            Quantity::TotalSupply.file_name(),
            Quantity::TotalBurned.file_name()
        );
        assert_ne!(Quantity::TotalSupply.field(), Quantity::TotalBurned.field());
        assert_eq!(Quantity::LiquidityBnb.field(), "totalBNB");
        assert_eq!(Quantity::LiquidityUsd.field(), "totalUSD");
    }

    #[test]
    fn test_serde_name_matches_display() {
        for quantity in Quantity::ALL {
            let json = serde_json::to_string(&quantity).unwrap();
            assert_eq!(json, format!("\"{}\"", quantity));
        }
    }

    #[test]
    fn test_only_burn_allows_zero() {
        let zero_ok: Vec<_> = Quantity::ALL
            .iter()
            .filter(|q| q.allows_zero())
            .collect();
        assert_eq!(zero_ok, vec![&Quantity::TotalBurned]);
    }
}
