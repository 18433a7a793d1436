//! CoinGecko simple price source

use super::{decimal_from_json, Source, SourceError};
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde_json::Value;

/// CoinGecko API base URL
pub const COINGECKO_API_URL: &str = "https://api.coingecko.com";

/// Spot price of one coin from `/api/v3/simple/price`
pub struct CoinGeckoPrice {
    client: Client,
    base_url: String,
    coin_id: String,
    vs_currency: String,
}

impl CoinGeckoPrice {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        coin_id: impl Into<String>,
        vs_currency: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            coin_id: coin_id.into(),
            vs_currency: vs_currency.into(),
        }
    }

    /// Extract `{coin_id: {vs_currency: price}}`
    fn parse_body(&self, body: &Value) -> Result<Decimal, SourceError> {
        let price = body
            .get(&self.coin_id)
            .and_then(|coin| coin.get(&self.vs_currency))
            .ok_or_else(|| {
                SourceError::Malformed(format!(
                    "missing {}.{} in response",
                    self.coin_id, self.vs_currency
                ))
            })?;
        decimal_from_json(price)
    }
}

#[async_trait]
impl Source for CoinGeckoPrice {
    fn id(&self) -> &str {
        "coingecko"
    }

    async fn fetch(&self) -> Result<Decimal, SourceError> {
        let url = format!("{}/api/v3/simple/price", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("ids", self.coin_id.as_str()),
                ("vs_currencies", self.vs_currency.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SourceError::Status(response.status().to_string()));
        }

        let body: Value = response.json().await?;
        self.parse_body(&body)
    }
}
