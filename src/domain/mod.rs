//! Domain types for the vault dashboard.
//!
//! This module provides:
//! - Primitives: Address, Network, TrackedToken
//! - Balances per network and combined per tracked token
//! - Ledger entries, snapshots, wallets and vault settings
//! - Activity feed records

pub mod activity;
pub mod balance;
pub mod decimal;
pub mod ledger;
pub mod primitives;
pub mod snapshot;
pub mod wallet;

pub use activity::{Activity, ActivityCategory, ActivityFilter};
pub use balance::{merge_balances, CombinedBalance, NetworkBalance};
pub use ledger::{parse_entry_date, LedgerEntry, LedgerEntryError, LedgerKind};
pub use primitives::{Address, AddressParseError, Network, TrackedToken};
pub use snapshot::{pnl_percent, Snapshot};
pub use wallet::{VaultAddresses, VaultSettings, Wallet, WalletType, WalletUpdate};
