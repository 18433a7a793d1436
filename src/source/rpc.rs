//! Raw contract-call sources over BSC JSON-RPC
//!
//! Every call here is a view function with at most one address argument, so
//! calldata is a selector plus one left-padded word.

use super::{scale_raw, Source, SourceError};
use alloy_primitives::{Address, Bytes, U256};
use alloy_provider::{Provider, RootProvider};
use alloy_rpc_types::{BlockId, TransactionRequest};
use alloy_transport_http::{Client, Http};
use async_trait::async_trait;
use rust_decimal::Decimal;

/// Public BSC dataseed endpoint
pub const BSC_RPC_URL: &str = "https://bsc-dataseed.binance.org/";

/// `totalSupply()`
const SELECTOR_TOTAL_SUPPLY: [u8; 4] = [0x18, 0x16, 0x0d, 0xdd];
/// `balanceOf(address)`
const SELECTOR_BALANCE_OF: [u8; 4] = [0x70, 0xa0, 0x82, 0x31];
/// `getReserves()`
const SELECTOR_GET_RESERVES: [u8; 4] = [0x09, 0x02, 0xf1, 0xac];
/// `token0()`
const SELECTOR_TOKEN0: [u8; 4] = [0x0d, 0xfe, 0x16, 0x81];

/// WBNB uses 18 decimals
const WBNB_DECIMALS: u32 = 18;

/// View-call client over one BSC node
#[derive(Clone)]
pub struct RpcClient {
    provider: RootProvider<Http<Client>>,
}

impl RpcClient {
    pub fn new(url: &str) -> Result<Self, SourceError> {
        let url = url
            .parse::<reqwest::Url>()
            .map_err(|e| SourceError::Malformed(format!("bad rpc url {}: {}", url, e)))?;
        let client = alloy_rpc_client::RpcClient::new_http(url);
        Ok(Self {
            provider: RootProvider::new(client),
        })
    }

    /// Run `eth_call` against the latest block
    pub async fn eth_call(&self, to: Address, data: Vec<u8>) -> Result<Bytes, SourceError> {
        let tx = TransactionRequest::default().to(to).input(Bytes::from(data).into());
        self.provider
            .call(&tx)
            .block(BlockId::latest())
            .await
            .map_err(|e| SourceError::Rpc(e.to_string()))
    }
}

/// Calldata for a call taking a single address
fn call_with_address(selector: [u8; 4], address: Address) -> Vec<u8> {
    let mut data = selector.to_vec();
    data.extend_from_slice(address.into_word().as_slice());
    data
}

/// The `index`-th 32-byte word of the return data as a uint
fn uint_at(data: &[u8], index: usize) -> Result<U256, SourceError> {
    data.get(index * 32..(index + 1) * 32)
        .map(U256::from_be_slice)
        .ok_or_else(|| SourceError::Malformed(format!("return data of {} bytes", data.len())))
}

/// The `index`-th 32-byte word of the return data as an address
fn address_at(data: &[u8], index: usize) -> Result<Address, SourceError> {
    data.get(index * 32 + 12..(index + 1) * 32)
        .map(Address::from_slice)
        .ok_or_else(|| SourceError::Malformed(format!("return data of {} bytes", data.len())))
}

/// Scale an on-chain amount by its decimals
fn scale_uint(raw: U256, decimals: u32) -> Result<Decimal, SourceError> {
    let raw = u128::try_from(raw)
        .map_err(|_| SourceError::Malformed(format!("uint overflow {}", raw)))?;
    scale_raw(raw, decimals)
}

/// ERC-20 `totalSupply()` of the token contract
pub struct RpcTotalSupply {
    rpc: RpcClient,
    token: Address,
    decimals: u32,
}

impl RpcTotalSupply {
    pub fn new(rpc: RpcClient, token: Address, decimals: u32) -> Self {
        Self {
            rpc,
            token,
            decimals,
        }
    }
}

#[async_trait]
impl Source for RpcTotalSupply {
    fn id(&self) -> &str {
        "rpc"
    }

    async fn fetch(&self) -> Result<Decimal, SourceError> {
        let result = self
            .rpc
            .eth_call(self.token, SELECTOR_TOTAL_SUPPLY.to_vec())
            .await?;
        scale_uint(uint_at(&result, 0)?, self.decimals)
    }
}

/// WBNB held by every LP pool, doubled to count both sides of each pool
pub struct PoolLiquidity {
    rpc: RpcClient,
    wbnb: Address,
    pools: Vec<Address>,
}

impl PoolLiquidity {
    pub fn new(rpc: RpcClient, wbnb: Address, pools: Vec<Address>) -> Self {
        Self { rpc, wbnb, pools }
    }
}

#[async_trait]
impl Source for PoolLiquidity {
    fn id(&self) -> &str {
        "rpc-pools"
    }

    async fn fetch(&self) -> Result<Decimal, SourceError> {
        if self.pools.is_empty() {
            return Err(SourceError::Malformed("no liquidity pools configured".to_string()));
        }

        let mut total = Decimal::ZERO;
        for pool in &self.pools {
            let result = self
                .rpc
                .eth_call(self.wbnb, call_with_address(SELECTOR_BALANCE_OF, *pool))
                .await?;
            let balance = scale_uint(uint_at(&result, 0)?, WBNB_DECIMALS)?;
            tracing::debug!(pool = %pool, %balance, "Pool WBNB balance");
            total = balance
                .checked_mul(Decimal::TWO)
                .and_then(|doubled| total.checked_add(doubled))
                .ok_or_else(|| SourceError::Malformed("liquidity overflow".to_string()))?;
        }
        Ok(total)
    }
}

/// Token price in BNB from a token/WBNB pair's reserves
pub struct PairPrice {
    rpc: RpcClient,
    pair: Address,
    token: Address,
    token_decimals: u32,
}

impl PairPrice {
    pub fn new(rpc: RpcClient, pair: Address, token: Address, token_decimals: u32) -> Self {
        Self {
            rpc,
            pair,
            token,
            token_decimals,
        }
    }

    /// Price from `getReserves()` and `token0()` return data
    fn price_from_reserves(&self, reserves: &[u8], token0: &[u8]) -> Result<Decimal, SourceError> {
        let reserve0 = uint_at(reserves, 0)?;
        let reserve1 = uint_at(reserves, 1)?;

        let (token_raw, wbnb_raw) = if address_at(token0, 0)? == self.token {
            (reserve0, reserve1)
        } else {
            (reserve1, reserve0)
        };

        if token_raw.is_zero() || wbnb_raw.is_zero() {
            return Err(SourceError::Malformed("empty reserves".to_string()));
        }

        let token_reserve = scale_uint(token_raw, self.token_decimals)?;
        let wbnb_reserve = scale_uint(wbnb_raw, WBNB_DECIMALS)?;
        wbnb_reserve
            .checked_div(token_reserve)
            .ok_or_else(|| SourceError::Malformed("price overflow".to_string()))
    }
}

#[async_trait]
impl Source for PairPrice {
    fn id(&self) -> &str {
        "pancake-pair"
    }

    async fn fetch(&self) -> Result<Decimal, SourceError> {
        let reserves = self
            .rpc
            .eth_call(self.pair, SELECTOR_GET_RESERVES.to_vec())
            .await?;
        let token0 = self.rpc.eth_call(self.pair, SELECTOR_TOKEN0.to_vec()).await?;
        self.price_from_reserves(&reserves, &token0)
    }
}
