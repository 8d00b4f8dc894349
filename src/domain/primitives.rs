//! Domain primitives: Address, Network, TrackedToken.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// EVM-style wallet address (`0x` followed by 40 hex characters).
///
/// The same address format is used on Hyperliquid and HyperEVM.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid address: {0}")]
pub struct AddressParseError(pub String);

impl Address {
    /// Create an Address without validation.
    pub fn new_unchecked(addr: String) -> Self {
        Address(addr)
    }

    /// Get the address as a string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lowercase form, used for comparisons and RPC payloads.
    pub fn to_lowercase(&self) -> String {
        self.0.to_lowercase()
    }
}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let Some(hex) = trimmed.strip_prefix("0x") else {
            return Err(AddressParseError(s.to_string()));
        };
        if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(AddressParseError(s.to_string()));
        }
        Ok(Address(trimmed.to_string()))
    }
}

impl TryFrom<String> for Address {
    type Error = AddressParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Address::from_str(&value)
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The two networks a vault holds balances on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Hyperliquid exchange (spot + perp margin).
    Hyperliquid,
    /// HyperEVM execution layer.
    Hyperevm,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Hyperliquid => "hyperliquid",
            Network::Hyperevm => "hyperevm",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hyperliquid" => Ok(Network::Hyperliquid),
            "hyperevm" => Ok(Network::Hyperevm),
            other => Err(format!("unsupported blockchain: {}", other)),
        }
    }
}

/// Tokens that contribute to the vault valuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TrackedToken {
    Hype,
    Eth,
    Btc,
    Usdt,
    Usdc,
}

impl TrackedToken {
    pub const ALL: [TrackedToken; 5] = [
        TrackedToken::Hype,
        TrackedToken::Eth,
        TrackedToken::Btc,
        TrackedToken::Usdt,
        TrackedToken::Usdc,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            TrackedToken::Hype => "HYPE",
            TrackedToken::Eth => "ETH",
            TrackedToken::Btc => "BTC",
            TrackedToken::Usdt => "USDT",
            TrackedToken::Usdc => "USDC",
        }
    }

    /// Returns true for USD-pegged tokens.
    pub fn is_stable(&self) -> bool {
        matches!(self, TrackedToken::Usdt | TrackedToken::Usdc)
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        TrackedToken::ALL
            .into_iter()
            .find(|t| t.symbol().eq_ignore_ascii_case(symbol))
    }
}

impl fmt::Display for TrackedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_parse_valid() {
        let addr = Address::from_str("0x89FA38FEEc2C00d6B3CFd8e16C7948975C6C34bf").unwrap();
        assert_eq!(addr.as_str(), "0x89FA38FEEc2C00d6B3CFd8e16C7948975C6C34bf");
        assert_eq!(
            addr.to_lowercase(),
            "0x89fa38feec2c00d6b3cfd8e16c7948975c6c34bf"
        );
    }

    #[test]
    fn test_address_parse_rejects_bad_input() {
        assert!(Address::from_str("89FA38FEEc2C00d6B3CFd8e16C7948975C6C34bf").is_err());
        assert!(Address::from_str("0x123").is_err());
        assert!(Address::from_str("0xZZFA38FEEc2C00d6B3CFd8e16C7948975C6C34bf").is_err());
    }

    #[test]
    fn test_address_deserialize_validates() {
        let ok: Result<Address, _> =
            serde_json::from_str("\"0x1111111111111111111111111111111111111111\"");
        assert!(ok.is_ok());
        let bad: Result<Address, _> = serde_json::from_str("\"0x1\"");
        assert!(bad.is_err());
    }

    #[test]
    fn test_network_roundtrip() {
        assert_eq!(Network::from_str("HyperEVM").unwrap(), Network::Hyperevm);
        assert_eq!(
            serde_json::to_string(&Network::Hyperliquid).unwrap(),
            "\"hyperliquid\""
        );
        assert!(Network::from_str("ethereum").is_err());
    }

    #[test]
    fn test_tracked_token_symbols() {
        assert_eq!(TrackedToken::from_symbol("hype"), Some(TrackedToken::Hype));
        assert_eq!(TrackedToken::from_symbol("SOL"), None);
        assert!(TrackedToken::Usdc.is_stable());
        assert!(!TrackedToken::Btc.is_stable());
    }
}
