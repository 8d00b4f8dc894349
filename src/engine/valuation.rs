use crate::domain::decimal::from_price;
use crate::domain::{CombinedBalance, NetworkBalance, TrackedToken};
use crate::pricing::PriceTable;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

/// Portfolio value of the tracked tokens across both networks.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Valuation {
    pub per_token: BTreeMap<TrackedToken, CombinedBalance>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_usd: Decimal,
}

impl Valuation {
    /// USD value of one token's combined balance.
    pub fn token_value(&self, token: TrackedToken, prices: &PriceTable) -> Decimal {
        self.per_token
            .get(&token)
            .map_or(Decimal::ZERO, |b| {
                b.total.saturating_mul(from_price(prices.price(token)))
            })
    }
}

/// Sum tracked tokens per network and value them at `prices`.
///
/// Untracked symbols are ignored; a token absent from a network counts as 0.
pub fn compute_valuation(
    hyperliquid: &[NetworkBalance],
    hyperevm: &[NetworkBalance],
    prices: &PriceTable,
) -> Valuation {
    let mut per_token = BTreeMap::new();
    let mut total_usd = Decimal::ZERO;

    for token in TrackedToken::ALL {
        let combined = CombinedBalance::new(sum_token(hyperliquid, token), sum_token(hyperevm, token));
        total_usd = total_usd
            .saturating_add(combined.total.saturating_mul(from_price(prices.price(token))));
        per_token.insert(token, combined);
    }

    Valuation {
        per_token,
        total_usd,
    }
}

fn sum_token(balances: &[NetworkBalance], token: TrackedToken) -> Decimal {
    balances
        .iter()
        .filter(|b| TrackedToken::from_symbol(&b.token) == Some(token))
        .fold(Decimal::ZERO, |acc, b| acc.saturating_add(b.balance))
}
