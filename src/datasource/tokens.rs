//! Token identifier normalization shared by both networks.
//!
//! Hyperliquid reports some spot balances by pair index (`@107`) and
//! bridged assets under wrapped names (`UBTC`, `USDT0`); HyperEVM exposes
//! wrapped ERC-20s (`WHYPE`). Everything is mapped to one canonical symbol
//! so balances from both networks line up.

/// Spot pair index → token name.
const SPOT_INDEX_TOKENS: &[(u32, &str)] = &[
    (0, "PURR"),
    (1, "HFUN"),
    (27, "HBOOST"),
    (107, "HYPE"),
    (142, "UBTC"),
    (150, "USDE"),
    (151, "UETH"),
    (156, "USOL"),
    (162, "UFART"),
    (166, "USDT0"),
    (188, "UPUMP"),
    (194, "UBONK"),
    (206, "UENA"),
    (210, "UXPL"),
    (224, "UWLD"),
    (243, "UMON"),
];

/// Wrapped/bridged name → canonical symbol.
const WRAPPED_ALIASES: &[(&str, &str)] = &[
    ("UBTC", "BTC"),
    ("UETH", "ETH"),
    ("USOL", "SOL"),
    ("UFART", "FART"),
    ("UPUMP", "PUMP"),
    ("UBONK", "BONK"),
    ("UENA", "ENA"),
    ("UXPL", "XPL"),
    ("UWLD", "WLD"),
    ("UMON", "MON"),
    ("USDT0", "USDT"),
    ("WHYPE", "HYPE"),
];

/// A known HyperEVM ERC-20 contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownContract {
    /// Lowercase contract address.
    pub address: &'static str,
    pub symbol: &'static str,
    pub decimals: u32,
}

/// Contracts whose metadata does not need an on-chain lookup.
pub const KNOWN_CONTRACTS: &[KnownContract] = &[
    KnownContract {
        address: "0x5555555555555555555555555555555555555555",
        symbol: "WHYPE",
        decimals: 18,
    },
    KnownContract {
        address: "0xb8ce59fc3717ada4c02eadf9682a9e934f625ebb",
        symbol: "USDT0",
        decimals: 6,
    },
    KnownContract {
        address: "0x9fdbda0a5e284c32744d2f17ee5c74b284993463",
        symbol: "UBTC",
        decimals: 8,
    },
    KnownContract {
        address: "0xbe6727b535545c67d5caa73dea54865b92cf7907",
        symbol: "UETH",
        decimals: 18,
    },
];

pub fn known_contract(address: &str) -> Option<&'static KnownContract> {
    let lower = address.to_lowercase();
    KNOWN_CONTRACTS.iter().find(|c| c.address == lower)
}

/// Resolve a Hyperliquid coin identifier; `@N` goes through the index table.
///
/// Unknown indices are returned unchanged.
pub fn spot_token_name(coin: &str) -> String {
    if let Some(index) = coin.strip_prefix('@').and_then(|s| s.parse::<u32>().ok()) {
        return SPOT_INDEX_TOKENS
            .iter()
            .find(|(i, _)| *i == index)
            .map(|(_, name)| name.to_string())
            .unwrap_or_else(|| coin.to_string());
    }
    coin.to_string()
}

/// Map a raw token name to its canonical symbol.
pub fn canonical_symbol(raw: &str) -> String {
    let name = spot_token_name(raw.trim());
    let upper = name.to_uppercase();
    WRAPPED_ALIASES
        .iter()
        .find(|(wrapped, _)| *wrapped == upper)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or(upper)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spot_index_resolution() {
        assert_eq!(spot_token_name("@107"), "HYPE");
        assert_eq!(spot_token_name("@142"), "UBTC");
        assert_eq!(spot_token_name("@99999"), "@99999");
        assert_eq!(spot_token_name("PURR"), "PURR");
    }

    #[test]
    fn test_canonical_symbol_unwraps() {
        assert_eq!(canonical_symbol("@107"), "HYPE");
        assert_eq!(canonical_symbol("@142"), "BTC");
        assert_eq!(canonical_symbol("UETH"), "ETH");
        assert_eq!(canonical_symbol("USDT0"), "USDT");
        assert_eq!(canonical_symbol("WHYPE"), "HYPE");
        assert_eq!(canonical_symbol("usdc"), "USDC");
        // Names that merely start with U are not wrapped tokens.
        assert_eq!(canonical_symbol("UP"), "UP");
    }

    #[test]
    fn test_known_contract_lookup_is_case_insensitive() {
        let c = known_contract("0xB8CE59FC3717ada4C02eaDF9682A9e934F625ebb").unwrap();
        assert_eq!(c.symbol, "USDT0");
        assert_eq!(c.decimals, 6);
        assert!(known_contract("0x0000000000000000000000000000000000000001").is_none());
    }
}
