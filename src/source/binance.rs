//! Binance REST ticker source

use super::{Source, SourceError};
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;

/// Binance REST base URL
pub const BINANCE_API_URL: &str = "https://api.binance.com";

/// Binance ticker price response
#[derive(Debug, Deserialize)]
struct BinanceTickerMessage {
    /// Symbol
    symbol: String,
    /// Last price, as a decimal string
    price: String,
}

/// Last traded price for one symbol from `/api/v3/ticker/price`
pub struct BinanceTicker {
    client: Client,
    base_url: String,
    symbol: String,
}

impl BinanceTicker {
    /// Create a ticker source for the given symbol
    pub fn new(client: Client, base_url: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            symbol: symbol.into().to_uppercase(),
        }
    }

    /// Build the ticker URL
    fn build_url(&self) -> String {
        format!("{}/api/v3/ticker/price", self.base_url)
    }

    /// Parse a ticker response body into a price
    fn parse_message(&self, body: &str) -> Result<Decimal, SourceError> {
        let ticker: BinanceTickerMessage = serde_json::from_str(body)
            .map_err(|e| SourceError::Malformed(format!("ticker: {}", e)))?;

        if ticker.symbol != self.symbol {
            return Err(SourceError::Malformed(format!(
                "ticker for {} instead of {}",
                ticker.symbol, self.symbol
            )));
        }

        Decimal::from_str(&ticker.price)
            .map_err(|e| SourceError::Malformed(format!("price {:?}: {}", ticker.price, e)))
    }
}

#[async_trait]
impl Source for BinanceTicker {
    fn id(&self) -> &str {
        "binance"
    }

    async fn fetch(&self) -> Result<Decimal, SourceError> {
        let response = self
            .client
            .get(self.build_url())
            .query(&[("symbol", self.symbol.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SourceError::Status(response.status().to_string()));
        }

        let body = response.text().await?;
        self.parse_message(&body)
    }
}
