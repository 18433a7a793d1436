//! BscScan explorer API source

use super::{decimal_from_json, scale_raw, Source, SourceError};
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

/// BscScan API endpoint
pub const BSCSCAN_API_URL: &str = "https://api.bscscan.com/api";

/// Which explorer statistic to read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BscScanQuery {
    /// `stats/tokensupply`, raw integer scaled by token decimals
    TokenSupply,
    /// `token/tokenholdercount`
    HolderCount,
}

impl BscScanQuery {
    fn params(&self) -> [(&'static str, &'static str); 2] {
        match self {
            BscScanQuery::TokenSupply => [("module", "stats"), ("action", "tokensupply")],
            BscScanQuery::HolderCount => [("module", "token"), ("action", "tokenholdercount")],
        }
    }
}

/// Standard BscScan envelope
#[derive(Debug, Deserialize)]
struct BscScanResponse {
    status: String,
    #[serde(default)]
    message: String,
    result: Value,
}

/// A token statistic read from the BscScan API.
///
/// The API key is read from the environment on every fetch so that a
/// missing key fails only this source.
pub struct BscScan {
    client: Client,
    base_url: String,
    api_key_env: String,
    contract: String,
    decimals: u32,
    query: BscScanQuery,
}

impl BscScan {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        api_key_env: impl Into<String>,
        contract: impl Into<String>,
        decimals: u32,
        query: BscScanQuery,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key_env: api_key_env.into(),
            contract: contract.into(),
            decimals,
            query,
        }
    }

    fn api_key(&self) -> Result<String, SourceError> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| SourceError::MissingCredential(self.api_key_env.clone()))
    }

    fn parse_body(&self, body: BscScanResponse) -> Result<Decimal, SourceError> {
        if body.status != "1" {
            return Err(SourceError::Status(format!(
                "bscscan status {}: {}",
                body.status, body.message
            )));
        }

        match self.query {
            BscScanQuery::TokenSupply => {
                let raw = body
                    .result
                    .as_str()
                    .and_then(|s| s.trim().parse::<u128>().ok())
                    .ok_or_else(|| {
                        SourceError::Malformed(format!("token supply {}", body.result))
                    })?;
                scale_raw(raw, self.decimals)
            }
            BscScanQuery::HolderCount => decimal_from_json(&body.result),
        }
    }
}

#[async_trait]
impl Source for BscScan {
    fn id(&self) -> &str {
        "bscscan"
    }

    async fn fetch(&self) -> Result<Decimal, SourceError> {
        let api_key = self.api_key()?;
        let [module, action] = self.query.params();

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                module,
                action,
                ("contractaddress", self.contract.as_str()),
                ("apikey", api_key.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SourceError::Status(response.status().to_string()));
        }

        let body: BscScanResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Malformed(format!("bscscan: {}", e)))?;
        self.parse_body(body)
    }
}
