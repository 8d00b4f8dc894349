//! Decimal helpers for USD amounts and on-chain integer balances.
//!
//! Amounts are carried as `rust_decimal::Decimal`; prices arrive as `f64`
//! and are converted at the valuation boundary.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Balances strictly below this are dust and never shown or valued.
pub fn dust_threshold() -> Decimal {
    Decimal::new(1, 6)
}

/// Returns true if `amount` is worth keeping (non-dust, positive).
pub fn is_material(amount: Decimal) -> bool {
    amount >= dust_threshold()
}

/// Convert an `f64` price to a Decimal, mapping NaN/inf to zero.
pub fn from_price(price: f64) -> Decimal {
    Decimal::from_f64(price).unwrap_or(Decimal::ZERO)
}

/// Parse a decimal string as returned by the Hyperliquid API (e.g. `"12.5"`).
pub fn parse_amount(s: &str) -> Result<Decimal, rust_decimal::Error> {
    Decimal::from_str(s.trim())
}

/// Round a USD value to cents.
pub fn round_usd(value: Decimal) -> Decimal {
    value.round_dp(2)
}

/// Scale a raw integer token amount by `decimals`.
///
/// Returns `None` when the result does not fit into a Decimal
/// (28 significant digits).
pub fn from_base_units(raw: u128, decimals: u32) -> Option<Decimal> {
    let mut value = Decimal::from_u128(raw)?;
    // Decimal supports at most 28 fractional digits; divide the remainder out.
    let scale = decimals.min(28);
    value.set_scale(scale).ok()?;
    let mut remaining = decimals - scale;
    while remaining > 0 {
        value /= Decimal::TEN;
        remaining -= 1;
    }
    Some(value.normalize())
}
