//! Compact PNL snapshot record persisted in the time series.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One immutable valuation + PNL point.
///
/// Field names are kept short because the series is unbounded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Time the snapshot was taken.
    pub t: DateTime<Utc>,
    /// Total vault value in USD.
    #[serde(with = "rust_decimal::serde::float")]
    pub v: Decimal,
    /// Investment basis at `t`.
    #[serde(with = "rust_decimal::serde::float")]
    pub i: Decimal,
    /// PNL percentage.
    #[serde(with = "rust_decimal::serde::float")]
    pub p: Decimal,
}

impl Snapshot {
    /// Build a snapshot, or `None` if `basis` is not positive or too small
    /// for the PNL percentage to be represented.
    pub fn compute(t: DateTime<Utc>, value: Decimal, basis: Decimal) -> Option<Self> {
        let p = pnl_percent(value, basis)?;
        Some(Self {
            t,
            v: value,
            i: basis,
            p,
        })
    }

    /// Absolute PNL in USD.
    pub fn pnl_amount(&self) -> Decimal {
        self.v - self.i
    }
}

/// `(value - basis) / basis * 100`, or `None` when `basis <= 0` or the
/// ratio does not fit into a Decimal.
pub fn pnl_percent(value: Decimal, basis: Decimal) -> Option<Decimal> {
    if basis <= Decimal::ZERO {
        return None;
    }
    value
        .checked_sub(basis)?
        .checked_div(basis)?
        .checked_mul(Decimal::ONE_HUNDRED)
        .map(|p| p.round_dp(4))
}
