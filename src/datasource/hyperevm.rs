//! HyperEVM JSON-RPC client: native HYPE and ERC-20 balances.

use super::http::{build_client, post_json};
use super::tokens::{canonical_symbol, known_contract, KNOWN_CONTRACTS};
use super::{BalanceFetcher, FetchError};
use crate::domain::decimal::from_base_units;
use crate::domain::{merge_balances, Address, Network, NetworkBalance, TrackedToken};
use async_trait::async_trait;
use futures::future::try_join_all;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, warn};

const SELECTOR_BALANCE_OF: &str = "0x70a08231";
const SELECTOR_DECIMALS: &str = "0x313ce567";
const SELECTOR_SYMBOL: &str = "0x95d89b41";

const NATIVE_DECIMALS: u32 = 18;

/// Symbol and decimals of an ERC-20 contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMeta {
    pub symbol: String,
    pub decimals: u32,
}

/// HyperEVM client over a JSON-RPC endpoint.
#[derive(Debug)]
pub struct HyperEvmClient {
    client: Client,
    rpc_url: String,
    contracts: Vec<String>,
    metadata: RwLock<HashMap<String, TokenMeta>>,
    next_id: AtomicU64,
    retry_window: Duration,
}

impl HyperEvmClient {
    /// Create a client reading `contracts` (lowercase addresses).
    ///
    /// An empty contract list falls back to the known-contract table.
    pub fn new(rpc_url: String, contracts: Vec<String>, timeout: Duration) -> Self {
        let contracts = if contracts.is_empty() {
            KNOWN_CONTRACTS.iter().map(|c| c.address.to_string()).collect()
        } else {
            contracts.into_iter().map(|c| c.to_lowercase()).collect()
        };
        Self {
            client: build_client(timeout),
            rpc_url,
            contracts,
            metadata: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            retry_window: Duration::from_secs(30),
        }
    }

    /// Bound the total time spent retrying transient failures.
    pub fn with_retry_window(mut self, window: Duration) -> Self {
        self.retry_window = window;
        self
    }

    pub fn contracts(&self) -> &[String] {
        &self.contracts
    }

    async fn rpc(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, FetchError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        let response = post_json(&self.client, &self.rpc_url, &payload, self.retry_window).await?;

        if let Some(error) = response.get("error") {
            return Err(FetchError::RpcError {
                code: error.get("code").and_then(|c| c.as_i64()).unwrap_or(0),
                message: error
                    .get("message")
                    .and_then(|m| m.as_str())
                    .unwrap_or("unknown error")
                    .to_string(),
            });
        }
        response
            .get("result")
            .cloned()
            .ok_or_else(|| FetchError::ParseError(format!("{} returned no result", method)))
    }

    async fn eth_call(&self, to: &str, data: String) -> Result<String, FetchError> {
        let result = self
            .rpc(
                "eth_call",
                serde_json::json!([{ "to": to, "data": data }, "latest"]),
            )
            .await?;
        result
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| FetchError::ParseError("eth_call result is not a string".to_string()))
    }

    async fn native_balance(&self, owner: &Address) -> Result<NetworkBalance, FetchError> {
        let result = self
            .rpc(
                "eth_getBalance",
                serde_json::json!([owner.to_lowercase(), "latest"]),
            )
            .await?;
        let raw = result
            .as_str()
            .ok_or_else(|| FetchError::ParseError("eth_getBalance result is not a string".to_string()))
            .and_then(decode_uint)?;
        let amount = scale(raw, NATIVE_DECIMALS)?;
        Ok(NetworkBalance::new(
            TrackedToken::Hype.symbol(),
            amount,
            Network::Hyperevm,
        ))
    }

    /// Balance of one ERC-20 contract.
    ///
    /// `None` when an untracked token's balance does not fit into a decimal;
    /// such a contract never contributes to the valuation.
    async fn token_balance(
        &self,
        contract: &str,
        owner: &Address,
    ) -> Result<Option<NetworkBalance>, FetchError> {
        let raw = self
            .eth_call(contract, encode_address_call(SELECTOR_BALANCE_OF, owner))
            .await
            .and_then(|word| decode_uint(&word))?;
        let meta = self.token_meta(contract).await?;
        let symbol = canonical_symbol(&meta.symbol);
        match scale(raw, meta.decimals) {
            Ok(amount) => Ok(Some(NetworkBalance::new(symbol, amount, Network::Hyperevm))),
            Err(_) if TrackedToken::from_symbol(&symbol).is_none() => {
                warn!(contract, symbol = %symbol, "Skipping untracked token with out-of-range balance");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Metadata from the known table, else `symbol()`/`decimals()`, memoized.
    async fn token_meta(&self, contract: &str) -> Result<TokenMeta, FetchError> {
        if let Some(known) = known_contract(contract) {
            return Ok(TokenMeta {
                symbol: known.symbol.to_string(),
                decimals: known.decimals,
            });
        }
        if let Some(meta) = self.metadata.read().await.get(contract) {
            return Ok(meta.clone());
        }

        let (symbol_hex, decimals_hex) = futures::try_join!(
            self.eth_call(contract, SELECTOR_SYMBOL.to_string()),
            self.eth_call(contract, SELECTOR_DECIMALS.to_string()),
        )?;
        let decimals = decode_uint(&decimals_hex)?;
        if decimals > 77 {
            return Err(FetchError::ParseError(format!(
                "Unreasonable decimals {} for {}",
                decimals, contract
            )));
        }
        let meta = TokenMeta {
            symbol: decode_string(&symbol_hex)?,
            decimals: decimals as u32,
        };
        debug!(contract, symbol = %meta.symbol, decimals = meta.decimals, "Resolved token metadata");

        self.metadata
            .write()
            .await
            .insert(contract.to_string(), meta.clone());
        Ok(meta)
    }
}

#[async_trait]
impl BalanceFetcher for HyperEvmClient {
    fn network(&self) -> Network {
        Network::Hyperevm
    }

    async fn fetch_balances(&self, address: &Address) -> Result<Vec<NetworkBalance>, FetchError> {
        debug!(user = %address, contracts = self.contracts.len(), "Fetching HyperEVM balances");

        let native = self.native_balance(address);
        let tokens = try_join_all(
            self.contracts
                .iter()
                .map(|contract| self.token_balance(contract, address)),
        );
        let (native, tokens) = futures::try_join!(native, tokens)?;
        let mut balances: Vec<NetworkBalance> = tokens.into_iter().flatten().collect();
        balances.push(native);
        Ok(merge_balances(balances))
    }
}

/// Calldata for a single-address call such as `balanceOf(address)`.
fn encode_address_call(selector: &str, owner: &Address) -> String {
    let lower = owner.to_lowercase();
    let bare = lower.trim_start_matches("0x");
    format!("{}{:0>64}", selector, bare)
}

fn strip_hex(raw: &str) -> &str {
    raw.strip_prefix("0x").unwrap_or(raw)
}

/// Decode a hex quantity or a 32-byte ABI word into an integer.
///
/// An empty result (`0x`) decodes as zero.
fn decode_uint(raw: &str) -> Result<u128, FetchError> {
    let digits = strip_hex(raw.trim()).trim_start_matches('0');
    if digits.is_empty() {
        return Ok(0);
    }
    if digits.len() > 32 {
        return Err(FetchError::ParseError(format!("Integer overflow: {}", raw)));
    }
    u128::from_str_radix(digits, 16)
        .map_err(|e| FetchError::ParseError(format!("Invalid hex integer {}: {}", raw, e)))
}

/// Decode an ABI `string` return value, or a `bytes32` one for older tokens.
fn decode_string(raw: &str) -> Result<String, FetchError> {
    let bytes = hex::decode(strip_hex(raw.trim()))
        .map_err(|e| FetchError::ParseError(format!("Invalid hex string: {}", e)))?;

    let text = if bytes.len() >= 64 {
        let offset = word_to_usize(&bytes[0..32])?;
        let len_end = offset
            .checked_add(32)
            .filter(|end| *end <= bytes.len())
            .ok_or_else(|| FetchError::ParseError("String offset out of range".to_string()))?;
        let len = word_to_usize(&bytes[offset..len_end])?;
        let data = len_end
            .checked_add(len)
            .and_then(|end| bytes.get(len_end..end))
            .ok_or_else(|| FetchError::ParseError("String length out of range".to_string()))?;
        String::from_utf8_lossy(data).into_owned()
    } else if bytes.len() == 32 {
        let end = bytes.iter().position(|b| *b == 0).unwrap_or(32);
        String::from_utf8_lossy(&bytes[..end]).into_owned()
    } else {
        return Err(FetchError::ParseError(format!(
            "Unexpected string encoding of {} bytes",
            bytes.len()
        )));
    };

    let symbol = text.trim().to_string();
    if symbol.is_empty() {
        return Err(FetchError::ParseError("Empty token symbol".to_string()));
    }
    Ok(symbol)
}

fn word_to_usize(word: &[u8]) -> Result<usize, FetchError> {
    let (high, low) = word.split_at(word.len().saturating_sub(8));
    if high.iter().any(|b| *b != 0) {
        return Err(FetchError::ParseError("ABI word too large".to_string()));
    }
    let mut buf = [0u8; 8];
    buf[8 - low.len()..].copy_from_slice(low);
    usize::try_from(u64::from_be_bytes(buf))
        .map_err(|_| FetchError::ParseError("ABI word too large".to_string()))
}

fn scale(raw: u128, decimals: u32) -> Result<rust_decimal::Decimal, FetchError> {
    from_base_units(raw, decimals).ok_or_else(|| {
        warn!(raw = %raw, decimals, "Balance does not fit into a decimal");
        FetchError::ParseError(format!("Balance {} out of range", raw))
    })
}
