//! Per-network and combined token balances.

use crate::domain::decimal::is_material;
use crate::domain::Network;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A token balance on one network, normalized to a canonical symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkBalance {
    pub token: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
    pub network: Network,
}

impl NetworkBalance {
    pub fn new(token: impl Into<String>, balance: Decimal, network: Network) -> Self {
        Self {
            token: token.into(),
            balance,
            network,
        }
    }
}

/// Merge balances sharing a symbol and drop dust.
///
/// Output is sorted by token symbol so fetch results are stable.
pub fn merge_balances(balances: Vec<NetworkBalance>) -> Vec<NetworkBalance> {
    let mut merged: Vec<NetworkBalance> = Vec::with_capacity(balances.len());
    for b in balances {
        if b.balance.is_sign_negative() {
            continue;
        }
        match merged
            .iter_mut()
            .find(|m| m.token == b.token && m.network == b.network)
        {
            Some(existing) => existing.balance += b.balance,
            None => merged.push(b),
        }
    }
    merged.retain(|b| is_material(b.balance));
    merged.sort_by(|a, b| a.token.cmp(&b.token));
    merged
}

/// A tracked token's amount across both networks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinedBalance {
    #[serde(with = "rust_decimal::serde::float")]
    pub hyperliquid: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub hyperevm: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

impl CombinedBalance {
    pub fn new(hyperliquid: Decimal, hyperevm: Decimal) -> Self {
        Self {
            hyperliquid,
            hyperevm,
            total: hyperliquid.saturating_add(hyperevm),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_merge_sums_duplicates_and_drops_dust() {
        let merged = merge_balances(vec![
            NetworkBalance::new("USDC", dec("10"), Network::Hyperliquid),
            NetworkBalance::new("HYPE", dec("0.0000001"), Network::Hyperliquid),
            NetworkBalance::new("USDC", dec("5.5"), Network::Hyperliquid),
            NetworkBalance::new("BTC", dec("0.1"), Network::Hyperliquid),
        ]);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].token, "BTC");
        assert_eq!(merged[1].token, "USDC");
        assert_eq!(merged[1].balance, dec("15.5"));
    }

    #[test]
    fn test_merge_drops_negative_amounts() {
        let merged = merge_balances(vec![NetworkBalance::new(
            "ETH",
            dec("-1"),
            Network::Hyperevm,
        )]);
        assert!(merged.is_empty());
    }

    #[test]
    fn test_combined_total() {
        let combined = CombinedBalance::new(dec("1.25"), dec("2"));
        assert_eq!(combined.total, dec("3.25"));
    }
}
