//! USD price cache for tracked tokens.
//!
//! Prices are refreshed from a [`PriceSource`] at most once per TTL. A failed
//! refresh never surfaces as an error: the last good table is served, and
//! before any success a fixed default table is.

use crate::datasource::FetchError;
use crate::domain::TrackedToken;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Returns current USD quotes for a set of symbols.
///
/// Symbols the source has no quote for are absent from the result.
#[async_trait]
pub trait PriceSource: Send + Sync + fmt::Debug {
    async fn fetch_prices(&self, symbols: &[&str]) -> Result<HashMap<String, f64>, FetchError>;
}

/// Where the served prices came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceOrigin {
    /// Refreshed within the TTL.
    Fresh,
    /// Last good table, served because a refresh failed.
    Stale,
    /// Hardcoded table, no refresh has succeeded yet.
    Default,
}

/// Prices for every tracked token.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceTable {
    pub prices: BTreeMap<TrackedToken, f64>,
    pub origin: PriceOrigin,
    pub updated_at: Option<DateTime<Utc>>,
}

impl PriceTable {
    /// Price of `token`, 0 when unknown.
    pub fn price(&self, token: TrackedToken) -> f64 {
        self.prices.get(&token).copied().unwrap_or(0.0)
    }

    /// The hardcoded fallback table.
    pub fn defaults() -> Self {
        Self {
            prices: default_prices(),
            origin: PriceOrigin::Default,
            updated_at: None,
        }
    }
}

fn default_prices() -> BTreeMap<TrackedToken, f64> {
    TrackedToken::ALL
        .into_iter()
        .map(|t| {
            let price = match t {
                TrackedToken::Hype => 25.0,
                TrackedToken::Eth => 3000.0,
                TrackedToken::Btc => 90000.0,
                TrackedToken::Usdt | TrackedToken::Usdc => 1.0,
            };
            (t, price)
        })
        .collect()
}

#[derive(Debug)]
struct CachedPrices {
    prices: BTreeMap<TrackedToken, f64>,
    fetched_at: Instant,
    updated_at: DateTime<Utc>,
}

/// TTL cache in front of a [`PriceSource`].
#[derive(Debug)]
pub struct PriceCache {
    source: Arc<dyn PriceSource>,
    ttl: Duration,
    state: Mutex<Option<CachedPrices>>,
}

impl PriceCache {
    pub fn new(source: Arc<dyn PriceSource>, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            state: Mutex::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Current prices; refreshes when forced or older than the TTL.
    ///
    /// Concurrent callers wait on the same refresh instead of each
    /// querying the source.
    pub async fn get_prices(&self, force_refresh: bool) -> PriceTable {
        let mut state = self.state.lock().await;

        if !force_refresh {
            if let Some(cached) = state.as_ref() {
                if cached.fetched_at.elapsed() < self.ttl {
                    return table(cached, PriceOrigin::Fresh);
                }
            }
        }

        let symbols: Vec<&str> = TrackedToken::ALL.iter().map(|t| t.symbol()).collect();
        match self.source.fetch_prices(&symbols).await {
            Ok(quotes) => {
                let mut prices = state
                    .as_ref()
                    .map(|c| c.prices.clone())
                    .unwrap_or_else(default_prices);
                for token in TrackedToken::ALL {
                    let quoted = quotes
                        .get(token.symbol())
                        .copied()
                        .filter(|p| p.is_finite() && *p > 0.0);
                    match quoted {
                        Some(price) => {
                            prices.insert(token, price);
                        }
                        None if token.is_stable() => {
                            prices.insert(token, 1.0);
                        }
                        None => debug!(token = %token, "No quote, keeping previous price"),
                    }
                }
                let cached = CachedPrices {
                    prices,
                    fetched_at: Instant::now(),
                    updated_at: Utc::now(),
                };
                let out = table(&cached, PriceOrigin::Fresh);
                *state = Some(cached);
                out
            }
            Err(e) => match state.as_ref() {
                Some(cached) => {
                    warn!(error = %e, "Price refresh failed, serving stale prices");
                    table(cached, PriceOrigin::Stale)
                }
                None => {
                    warn!(error = %e, "Price refresh failed, serving default prices");
                    PriceTable::defaults()
                }
            },
        }
    }
}

fn table(cached: &CachedPrices, origin: PriceOrigin) -> PriceTable {
    PriceTable {
        prices: cached.prices.clone(),
        origin,
        updated_at: Some(cached.updated_at),
    }
}
