//! Wallet records and vault settings kept in the document.

use crate::domain::{Address, Network};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletType {
    /// Main wallet holding funds on both networks.
    Vault,
    /// Single-network wallet used by trading bots.
    Executor,
}

/// Vault addresses on both networks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultAddresses {
    pub hyperliquid: Address,
    pub hyperevm: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    pub id: String,
    pub wallet_type: WalletType,
    pub nickname: String,
    /// Set for vault wallets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub addresses: Option<VaultAddresses>,
    /// Set for executor wallets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blockchain: Option<Network>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Wallet {
    /// Returns the vault addresses when this wallet can be valued on both networks.
    pub fn vault_addresses(&self) -> Option<&VaultAddresses> {
        match self.wallet_type {
            WalletType::Vault => self.addresses.as_ref(),
            WalletType::Executor => None,
        }
    }
}

/// Partial update of a wallet; absent fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletUpdate {
    pub nickname: Option<String>,
    pub addresses: Option<VaultAddresses>,
    pub address: Option<Address>,
    pub tags: Option<Vec<String>>,
}

impl WalletUpdate {
    pub fn apply(self, wallet: &mut Wallet) {
        if let Some(nickname) = self.nickname {
            wallet.nickname = nickname;
        }
        match wallet.wallet_type {
            WalletType::Vault => {
                if let Some(addresses) = self.addresses {
                    wallet.addresses = Some(addresses);
                }
            }
            WalletType::Executor => {
                if let Some(address) = self.address {
                    wallet.address = Some(address);
                }
            }
        }
        if let Some(tags) = self.tags {
            wallet.tags = tags;
        }
    }
}

/// Fallback investment basis and tracking start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultSettings {
    #[serde(rename = "initialInvestmentUSD", with = "rust_decimal::serde::float")]
    pub initial_investment_usd: Decimal,
    pub initial_date: DateTime<Utc>,
}

impl VaultSettings {
    pub const DEFAULT_INITIAL_INVESTMENT: i64 = 5000;

    pub fn default_at(now: DateTime<Utc>) -> Self {
        Self {
            initial_investment_usd: Decimal::from(Self::DEFAULT_INITIAL_INVESTMENT),
            initial_date: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_vault_wallet_json_shape() {
        let json = serde_json::json!({
            "id": "1",
            "walletType": "vault",
            "nickname": "Main",
            "addresses": {
                "hyperliquid": "0x1111111111111111111111111111111111111111",
                "hyperevm": "0x2222222222222222222222222222222222222222"
            },
            "createdAt": "2025-01-01T00:00:00Z"
        });
        let wallet: Wallet = serde_json::from_value(json).unwrap();
        let addrs = wallet.vault_addresses().unwrap();
        assert_eq!(
            addrs.hyperevm,
            Address::from_str("0x2222222222222222222222222222222222222222").unwrap()
        );
        assert!(wallet.tags.is_empty());
    }

    #[test]
    fn test_executor_has_no_vault_addresses() {
        let json = serde_json::json!({
            "id": "2",
            "walletType": "executor",
            "nickname": "Bot",
            "address": "0x3333333333333333333333333333333333333333",
            "blockchain": "hyperevm",
            "createdAt": "2025-01-01T00:00:00Z"
        });
        let wallet: Wallet = serde_json::from_value(json).unwrap();
        assert!(wallet.vault_addresses().is_none());
        assert_eq!(wallet.blockchain, Some(Network::Hyperevm));
    }

    #[test]
    fn test_update_ignores_address_kind_mismatch() {
        let mut wallet: Wallet = serde_json::from_value(serde_json::json!({
            "id": "2",
            "walletType": "executor",
            "nickname": "Bot",
            "address": "0x3333333333333333333333333333333333333333",
            "blockchain": "hyperevm",
            "createdAt": "2025-01-01T00:00:00Z"
        }))
        .unwrap();

        let update: WalletUpdate = serde_json::from_value(serde_json::json!({
            "nickname": "Arb bot",
            "addresses": {
                "hyperliquid": "0x1111111111111111111111111111111111111111",
                "hyperevm": "0x2222222222222222222222222222222222222222"
            },
            "tags": ["bots"]
        }))
        .unwrap();
        update.apply(&mut wallet);

        assert_eq!(wallet.nickname, "Arb bot");
        assert!(wallet.addresses.is_none());
        assert_eq!(wallet.tags, vec!["bots".to_string()]);
    }

    #[test]
    fn test_settings_field_names() {
        let settings = VaultSettings::default_at(Utc::now());
        let json = serde_json::to_value(&settings).unwrap();
        assert_eq!(json["initialInvestmentUSD"], 5000.0);
        assert!(json["initialDate"].is_string());
    }
}
