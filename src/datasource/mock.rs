//! Mock sources for testing without network calls.

use super::{ActivitySource, BalanceFetcher, FetchError};
use crate::domain::{Activity, Address, Network, NetworkBalance};
use crate::pricing::PriceSource;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Mock balance fetcher returning predefined balances for one network.
#[derive(Debug)]
pub struct MockBalanceFetcher {
    network: Network,
    balances: Mutex<Vec<NetworkBalance>>,
    failure: Mutex<Option<FetchError>>,
    calls: AtomicUsize,
}

impl MockBalanceFetcher {
    /// Create a new mock with no balances.
    pub fn new(network: Network) -> Self {
        Self {
            network,
            balances: Mutex::new(Vec::new()),
            failure: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    /// Add a balance for `token` on this mock's network.
    pub fn with_balance(self, token: &str, amount: rust_decimal::Decimal) -> Self {
        let balance = NetworkBalance::new(token, amount, self.network);
        if let Ok(mut balances) = self.balances.lock() {
            balances.push(balance);
        }
        self
    }

    /// Make every fetch fail with `error`.
    pub fn failing(self, error: FetchError) -> Self {
        self.set_failure(Some(error));
        self
    }

    /// Change the failure mode between calls.
    pub fn set_failure(&self, error: Option<FetchError>) {
        if let Ok(mut failure) = self.failure.lock() {
            *failure = error;
        }
    }

    /// Replace the balances returned by later fetches.
    pub fn set_balances(&self, balances: Vec<NetworkBalance>) {
        if let Ok(mut current) = self.balances.lock() {
            *current = balances;
        }
    }

    /// Number of fetches performed so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BalanceFetcher for MockBalanceFetcher {
    fn network(&self) -> Network {
        self.network
    }

    async fn fetch_balances(&self, _address: &Address) -> Result<Vec<NetworkBalance>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.failure.lock().ok().and_then(|f| f.clone()) {
            return Err(error);
        }
        Ok(self
            .balances
            .lock()
            .map(|b| b.clone())
            .unwrap_or_default())
    }
}

/// Mock price source with a settable quote table.
#[derive(Debug, Default)]
pub struct MockPriceSource {
    prices: Mutex<HashMap<String, f64>>,
    failure: Mutex<Option<FetchError>>,
    calls: AtomicUsize,
}

impl MockPriceSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(self, symbol: &str, price: f64) -> Self {
        self.set_price(symbol, price);
        self
    }

    pub fn set_price(&self, symbol: &str, price: f64) {
        if let Ok(mut prices) = self.prices.lock() {
            prices.insert(symbol.to_string(), price);
        }
    }

    pub fn set_failure(&self, error: Option<FetchError>) {
        if let Ok(mut failure) = self.failure.lock() {
            *failure = error;
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceSource for MockPriceSource {
    async fn fetch_prices(&self, symbols: &[&str]) -> Result<HashMap<String, f64>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.failure.lock().ok().and_then(|f| f.clone()) {
            return Err(error);
        }
        let prices = self.prices.lock().map(|p| p.clone()).unwrap_or_default();
        Ok(symbols
            .iter()
            .filter_map(|s| prices.get(*s).map(|p| (s.to_string(), *p)))
            .collect())
    }
}

/// Mock activity source returning predefined records.
#[derive(Debug, Clone, Default)]
pub struct MockActivitySource {
    activities: Vec<Activity>,
    failure: Option<FetchError>,
}

impl MockActivitySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_activity(mut self, activity: Activity) -> Self {
        self.activities.push(activity);
        self
    }

    pub fn failing(mut self, error: FetchError) -> Self {
        self.failure = Some(error);
        self
    }
}

#[async_trait]
impl ActivitySource for MockActivitySource {
    async fn fetch_activity(
        &self,
        _address: &Address,
        from_ms: i64,
    ) -> Result<Vec<Activity>, FetchError> {
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        Ok(self
            .activities
            .iter()
            .filter(|a| a.timestamp.timestamp_millis() >= from_ms)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn addr() -> Address {
        Address::from_str("0x1111111111111111111111111111111111111111").unwrap()
    }

    #[tokio::test]
    async fn test_mock_fetcher_returns_balances() {
        let mock = MockBalanceFetcher::new(Network::Hyperevm).with_balance("HYPE", Decimal::from(3));
        let balances = mock.fetch_balances(&addr()).await.unwrap();
        assert_eq!(balances.len(), 1);
        assert_eq!(balances[0].network, Network::Hyperevm);
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_fetcher_failure_toggle() {
        let mock = MockBalanceFetcher::new(Network::Hyperliquid).failing(FetchError::RateLimited);
        assert_eq!(
            mock.fetch_balances(&addr()).await.unwrap_err(),
            FetchError::RateLimited
        );
        mock.set_failure(None);
        tokio_test::assert_ok!(mock.fetch_balances(&addr()).await);
        assert_eq!(mock.call_count(), 2);
    }

    #[test]
    fn test_mock_activity_source_filters_by_time() {
        let deposit = |id: &str, ms: i64| Activity {
            id: id.to_string(),
            timestamp: chrono::DateTime::from_timestamp_millis(ms).unwrap(),
            category: crate::domain::ActivityCategory::Transfer,
            kind: "deposit".to_string(),
            asset: "USDC".to_string(),
            network: "hyperliquid".to_string(),
            amount: Decimal::from(100),
            price: None,
            value: Decimal::from(100),
            fee: None,
            tx_hash: None,
        };
        let mock = MockActivitySource::new()
            .with_activity(deposit("old", 1_000))
            .with_activity(deposit("new", 5_000));
        let result = tokio_test::block_on(mock.fetch_activity(&addr(), 5_000));
        let activities = tokio_test::assert_ok!(result);
        assert_eq!(activities.len(), 1);
        assert_eq!(activities[0].id, "new");
    }

    #[tokio::test]
    async fn test_mock_price_source_filters_symbols() {
        let mock = MockPriceSource::new()
            .with_price("HYPE", 30.0)
            .with_price("SOL", 150.0);
        let prices = mock.fetch_prices(&["HYPE", "ETH"]).await.unwrap();
        assert_eq!(prices.len(), 1);
        assert_eq!(prices.get("HYPE"), Some(&30.0));
    }
}
