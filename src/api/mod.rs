pub mod health;
pub mod prices;
pub mod vault;
pub mod wallets;

use crate::config::Config;
use crate::datasource::ActivitySource;
use crate::orchestration::{SchedulerState, ValuationService};
use crate::store::Repository;
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub config: Config,
    pub valuation: Arc<ValuationService>,
    pub activity: Arc<dyn ActivitySource>,
    pub scheduler_state: Option<watch::Receiver<SchedulerState>>,
}

impl AppState {
    pub fn new(
        repo: Arc<Repository>,
        config: Config,
        valuation: Arc<ValuationService>,
        activity: Arc<dyn ActivitySource>,
    ) -> Self {
        Self {
            repo,
            config,
            valuation,
            activity,
            scheduler_state: None,
        }
    }

    /// Expose the scheduler state on `/ready`.
    pub fn with_scheduler_state(mut self, state: watch::Receiver<SchedulerState>) -> Self {
        self.scheduler_state = Some(state);
        self
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route(
            "/api/wallets",
            get(wallets::list_wallets).post(wallets::create_wallet),
        )
        .route(
            "/api/wallets/:id",
            put(wallets::update_wallet).delete(wallets::delete_wallet),
        )
        .route("/api/tags", post(wallets::add_tags))
        .route(
            "/api/wallets/:id/balances",
            get(wallets::get_balances),
        )
        .route("/api/prices", get(prices::get_prices))
        .route(
            "/api/vault/settings",
            get(vault::get_settings).put(vault::put_settings),
        )
        .route(
            "/api/vault/transactions",
            get(vault::list_transactions).post(vault::add_transaction),
        )
        .route(
            "/api/vault/transactions/:id",
            delete(vault::delete_transaction),
        )
        .route("/api/vault/valuation", get(vault::get_valuation))
        .route("/api/vault/pnl-history", get(vault::get_pnl_history))
        .route("/api/vault/activity", get(vault::get_activity))
        .layer(cors)
        .with_state(state)
}
