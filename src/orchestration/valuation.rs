use crate::datasource::{BalanceFetcher, FetchError};
use crate::domain::{Address, Network, NetworkBalance, VaultAddresses};
use crate::engine::{compute_valuation, Valuation};
use crate::pricing::{PriceCache, PriceTable};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

/// Result of fetching one network during a valuation.
#[derive(Debug, Clone, PartialEq)]
pub enum NetworkOutcome {
    Ok(Vec<NetworkBalance>),
    Failed(String),
}

impl NetworkOutcome {
    fn from_result(network: Network, result: Result<Vec<NetworkBalance>, FetchError>) -> Self {
        match result {
            Ok(balances) => NetworkOutcome::Ok(balances),
            Err(e) => {
                warn!(network = %network, error = %e, "Balance fetch failed, counting network as zero");
                NetworkOutcome::Failed(e.to_string())
            }
        }
    }

    /// Balances to aggregate; empty when the fetch failed.
    pub fn balances(&self) -> &[NetworkBalance] {
        match self {
            NetworkOutcome::Ok(balances) => balances,
            NetworkOutcome::Failed(_) => &[],
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, NetworkOutcome::Failed(_))
    }
}

/// A vault valuation together with what it was computed from.
#[derive(Debug, Clone)]
pub struct VaultValuation {
    pub valuation: Valuation,
    pub prices: PriceTable,
    pub hyperliquid: NetworkOutcome,
    pub hyperevm: NetworkOutcome,
    pub computed_at: DateTime<Utc>,
}

impl VaultValuation {
    /// Networks whose fetch failed and contributed zero.
    pub fn degraded_networks(&self) -> Vec<Network> {
        let mut failed = Vec::new();
        if self.hyperliquid.is_failed() {
            failed.push(Network::Hyperliquid);
        }
        if self.hyperevm.is_failed() {
            failed.push(Network::Hyperevm);
        }
        failed
    }

    pub fn is_degraded(&self) -> bool {
        self.hyperliquid.is_failed() || self.hyperevm.is_failed()
    }
}

/// Fetches both networks and prices, then values the vault.
#[derive(Debug, Clone)]
pub struct ValuationService {
    hyperliquid: Arc<dyn BalanceFetcher>,
    hyperevm: Arc<dyn BalanceFetcher>,
    prices: Arc<PriceCache>,
}

impl ValuationService {
    pub fn new(
        hyperliquid: Arc<dyn BalanceFetcher>,
        hyperevm: Arc<dyn BalanceFetcher>,
        prices: Arc<PriceCache>,
    ) -> Self {
        Self {
            hyperliquid,
            hyperevm,
            prices,
        }
    }

    pub fn price_cache(&self) -> &Arc<PriceCache> {
        &self.prices
    }

    /// The fetcher reading `network`.
    pub fn fetcher(&self, network: Network) -> &Arc<dyn BalanceFetcher> {
        match network {
            Network::Hyperliquid => &self.hyperliquid,
            Network::Hyperevm => &self.hyperevm,
        }
    }

    /// Fetch raw balances of `address` on one network.
    pub async fn fetch_balances(
        &self,
        network: Network,
        address: &Address,
    ) -> Result<Vec<NetworkBalance>, FetchError> {
        self.fetcher(network).fetch_balances(address).await
    }

    /// Value the vault. Never fails: a network that cannot be fetched
    /// counts as zero and is reported through the outcome.
    pub async fn valuate(&self, addresses: &VaultAddresses) -> VaultValuation {
        let (hyperliquid, hyperevm, prices) = futures::join!(
            self.hyperliquid.fetch_balances(&addresses.hyperliquid),
            self.hyperevm.fetch_balances(&addresses.hyperevm),
            self.prices.get_prices(false),
        );
        let hyperliquid = NetworkOutcome::from_result(Network::Hyperliquid, hyperliquid);
        let hyperevm = NetworkOutcome::from_result(Network::Hyperevm, hyperevm);

        let valuation = compute_valuation(hyperliquid.balances(), hyperevm.balances(), &prices);
        debug!(
            total_usd = %valuation.total_usd,
            degraded = hyperliquid.is_failed() || hyperevm.is_failed(),
            "Computed vault valuation"
        );

        VaultValuation {
            valuation,
            prices,
            hyperliquid,
            hyperevm,
            computed_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::{MockBalanceFetcher, MockPriceSource};
    use rust_decimal::Decimal;
    use std::time::Duration;

    fn addresses() -> VaultAddresses {
        VaultAddresses {
            hyperliquid: "0x1111111111111111111111111111111111111111".parse().unwrap(),
            hyperevm: "0x2222222222222222222222222222222222222222".parse().unwrap(),
        }
    }

    fn service(hl: MockBalanceFetcher, evm: MockBalanceFetcher) -> ValuationService {
        let source = Arc::new(MockPriceSource::new().with_price("HYPE", 20.0));
        ValuationService::new(
            Arc::new(hl),
            Arc::new(evm),
            Arc::new(PriceCache::new(source, Duration::from_secs(300))),
        )
    }

    #[tokio::test]
    async fn test_valuate_both_networks() {
        let svc = service(
            MockBalanceFetcher::new(Network::Hyperliquid)
                .with_balance("HYPE", Decimal::from(10))
                .with_balance("USDC", Decimal::from(100)),
            MockBalanceFetcher::new(Network::Hyperevm).with_balance("HYPE", Decimal::from(5)),
        );

        let result = svc.valuate(&addresses()).await;
        assert!(!result.is_degraded());
        // 15 HYPE at 20 + 100 USDC
        assert_eq!(result.valuation.total_usd, Decimal::from(400));
    }

    #[tokio::test]
    async fn test_one_network_failing_is_isolated() {
        let svc = service(
            MockBalanceFetcher::new(Network::Hyperliquid)
                .with_balance("USDC", Decimal::from(250))
                .failing(FetchError::NetworkError("timeout".to_string())),
            MockBalanceFetcher::new(Network::Hyperevm).with_balance("HYPE", Decimal::from(5)),
        );

        let result = svc.valuate(&addresses()).await;
        assert!(result.is_degraded());
        assert_eq!(result.degraded_networks(), vec![Network::Hyperliquid]);
        assert_eq!(result.valuation.total_usd, Decimal::from(100));
    }
}
