pub mod api;
pub mod config;
pub mod datasource;
pub mod domain;
pub mod engine;
pub mod error;
pub mod orchestration;
pub mod pricing;
pub mod store;

pub use config::Config;
pub use datasource::{
    ActivitySource, BalanceFetcher, FetchError, HyperEvmClient, HyperliquidClient,
};
pub use domain::{
    Address, CombinedBalance, LedgerEntry, LedgerKind, Network, NetworkBalance, Snapshot,
    TrackedToken, VaultSettings, Wallet,
};
pub use error::AppError;
pub use orchestration::{SnapshotScheduler, TickOutcome, ValuationService};
pub use pricing::{PriceCache, PriceSource, PriceTable};
pub use store::{open_store, Document, DocumentStore, Repository};
