//! Read-only adapters for Hyperliquid and HyperEVM.

use crate::domain::{Activity, Address, Network, NetworkBalance};
use async_trait::async_trait;
use std::fmt;

pub mod http;
pub mod hyperevm;
pub mod hyperliquid;
pub mod mock;
pub mod tokens;

pub use hyperevm::HyperEvmClient;
pub use hyperliquid::HyperliquidClient;
pub use mock::{MockActivitySource, MockBalanceFetcher, MockPriceSource};

/// Fetches normalized balances for an address on one network.
///
/// Implementations merge duplicate symbols and drop dust before returning.
#[async_trait]
pub trait BalanceFetcher: Send + Sync + fmt::Debug {
    /// The network this fetcher reads from.
    fn network(&self) -> Network;

    /// Fetch the current balances held by `address`.
    async fn fetch_balances(&self, address: &Address) -> Result<Vec<NetworkBalance>, FetchError>;
}

/// Fetches the account activity feed (fills, funding, transfers).
#[async_trait]
pub trait ActivitySource: Send + Sync + fmt::Debug {
    /// Fetch activity for `address` since `from_ms` (inclusive).
    async fn fetch_activity(
        &self,
        address: &Address,
        from_ms: i64,
    ) -> Result<Vec<Activity>, FetchError>;
}

/// Error type for fetch operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Network error (e.g., connection timeout, DNS failure)
    NetworkError(String),
    /// HTTP error (e.g., 5xx server error after retries, 4xx)
    HttpError { status: u16, message: String },
    /// Parsing error (invalid JSON or malformed response)
    ParseError(String),
    /// Rate limit exceeded and retries exhausted
    RateLimited,
    /// JSON-RPC error object returned by the node
    RpcError { code: i64, message: String },
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            FetchError::HttpError { status, message } => {
                write!(f, "HTTP error {}: {}", status, message)
            }
            FetchError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            FetchError::RateLimited => write!(f, "Rate limited"),
            FetchError::RpcError { code, message } => {
                write!(f, "RPC error {}: {}", code, message)
            }
        }
    }
}

impl std::error::Error for FetchError {}
