use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::api::AppState;
use crate::domain::decimal::{from_price, round_usd};
use crate::domain::{
    parse_entry_date, pnl_percent, Activity, ActivityCategory, ActivityFilter, LedgerEntry,
    LedgerKind, Network, Snapshot, TrackedToken, VaultAddresses, VaultSettings,
};
use crate::engine::{investment_basis_at, query_history, resolve_basis, HistoryPeriod};
use crate::error::AppError;
use crate::pricing::PriceTable;

const DEFAULT_ACTIVITY_LIMIT: usize = 100;
const MAX_ACTIVITY_LIMIT: usize = 2000;

// =============================================================================
// Settings
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsRequest {
    #[serde(rename = "initialInvestmentUSD", with = "rust_decimal::serde::float")]
    pub initial_investment_usd: Decimal,
    pub initial_date: Option<String>,
}

pub async fn get_settings(State(state): State<AppState>) -> Result<Json<VaultSettings>, AppError> {
    Ok(Json(state.repo.vault_settings_or_init(Utc::now()).await?))
}

pub async fn put_settings(
    State(state): State<AppState>,
    Json(req): Json<SettingsRequest>,
) -> Result<Json<VaultSettings>, AppError> {
    if req.initial_investment_usd <= Decimal::ZERO {
        return Err(AppError::BadRequest(
            "initialInvestmentUSD must be greater than zero".into(),
        ));
    }
    let initial_date = match req.initial_date.as_deref() {
        Some(raw) => parse_entry_date(raw).map_err(|e| AppError::BadRequest(e.to_string()))?,
        None => state
            .repo
            .load()
            .await?
            .vault_settings
            .map_or_else(Utc::now, |s| s.initial_date),
    };

    let settings = VaultSettings {
        initial_investment_usd: req.initial_investment_usd,
        initial_date,
    };
    Ok(Json(state.repo.replace_vault_settings(settings).await?))
}

// =============================================================================
// Ledger
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub date: Option<String>,
    #[serde(default)]
    pub note: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionsResponse {
    pub transactions: Vec<LedgerEntry>,
    /// Deposits minus withdrawals dated up to now.
    #[serde(with = "rust_decimal::serde::float")]
    pub net_basis: Decimal,
    /// Basis used for PNL (ledger, else initial investment).
    #[serde(with = "rust_decimal::serde::float_option")]
    pub effective_basis: Option<Decimal>,
}

pub async fn list_transactions(
    State(state): State<AppState>,
) -> Result<Json<TransactionsResponse>, AppError> {
    let document = state.repo.load().await?;
    let now = Utc::now();
    let net_basis = investment_basis_at(&document.vault_transactions, now);
    let effective_basis = resolve_basis(
        &document.vault_transactions,
        document.vault_settings.as_ref(),
        now,
    );

    let mut transactions = document.vault_transactions;
    transactions.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.created_at.cmp(&a.created_at)));

    Ok(Json(TransactionsResponse {
        transactions,
        net_basis,
        effective_basis,
    }))
}

pub async fn add_transaction(
    State(state): State<AppState>,
    Json(req): Json<TransactionRequest>,
) -> Result<(StatusCode, Json<LedgerEntry>), AppError> {
    let kind = match req.kind.to_ascii_lowercase().as_str() {
        "deposit" => LedgerKind::Deposit,
        "withdrawal" => LedgerKind::Withdrawal,
        other => {
            return Err(AppError::BadRequest(format!(
                "Unknown transaction type: {}",
                other
            )))
        }
    };
    let date = match req.date.as_deref() {
        Some(raw) => parse_entry_date(raw).map_err(|e| AppError::BadRequest(e.to_string()))?,
        None => Utc::now(),
    };
    let entry = LedgerEntry::new(kind, req.amount, date, req.note.trim().to_string())
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let entry = state.repo.add_ledger_entry(entry).await?;
    tracing::info!(id = %entry.id, kind = ?entry.kind, amount = %entry.amount, "Recorded ledger entry");
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn delete_transaction(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<LedgerEntry>, AppError> {
    let removed = state.repo.delete_ledger_entry(&id).await?;
    tracing::info!(id = %removed.id, "Deleted ledger entry");
    Ok(Json(removed))
}

// =============================================================================
// Valuation
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenValuation {
    pub token: TrackedToken,
    #[serde(with = "rust_decimal::serde::float")]
    pub hyperliquid: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub hyperevm: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub price: f64,
    #[serde(rename = "valueUSD", with = "rust_decimal::serde::float")]
    pub value_usd: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuationResponse {
    pub configured: bool,
    pub wallet_id: String,
    pub addresses: VaultAddresses,
    #[serde(rename = "totalValueUSD", with = "rust_decimal::serde::float")]
    pub total_value_usd: Decimal,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub investment_basis: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub pnl: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub pnl_percent: Option<Decimal>,
    pub tokens: Vec<TokenValuation>,
    pub prices: PriceTable,
    pub degraded: bool,
    pub degraded_networks: Vec<Network>,
    pub computed_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ValuationBody {
    NotConfigured { configured: bool },
    Configured(Box<ValuationResponse>),
}

pub async fn get_valuation(State(state): State<AppState>) -> Result<Json<ValuationBody>, AppError> {
    let document = state.repo.load().await?;
    let Some((wallet_id, addresses)) = document
        .vault_wallet()
        .and_then(|w| w.vault_addresses().map(|a| (w.id.clone(), a.clone())))
    else {
        return Ok(Json(ValuationBody::NotConfigured { configured: false }));
    };

    let result = state.valuation.valuate(&addresses).await;
    let total = round_usd(result.valuation.total_usd);
    let basis = resolve_basis(
        &document.vault_transactions,
        document.vault_settings.as_ref(),
        result.computed_at,
    );
    let pnl_pct = basis.and_then(|b| pnl_percent(total, b));
    let pnl = basis
        .filter(|_| pnl_pct.is_some())
        .and_then(|b| total.checked_sub(b));

    let tokens = result
        .valuation
        .per_token
        .iter()
        .map(|(token, balance)| {
            let price = result.prices.price(*token);
            TokenValuation {
                token: *token,
                hyperliquid: balance.hyperliquid,
                hyperevm: balance.hyperevm,
                total: balance.total,
                price,
                value_usd: round_usd(balance.total.saturating_mul(from_price(price))),
            }
        })
        .collect();

    Ok(Json(ValuationBody::Configured(Box::new(ValuationResponse {
        configured: true,
        wallet_id,
        addresses,
        total_value_usd: total,
        investment_basis: basis,
        pnl,
        pnl_percent: pnl_pct,
        tokens,
        degraded: result.is_degraded(),
        degraded_networks: result.degraded_networks(),
        prices: result.prices,
        computed_at: result.computed_at,
    }))))
}

// =============================================================================
// History
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub period: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    pub period: HistoryPeriod,
    pub count: usize,
    pub total_count: usize,
    pub snapshots: Vec<Snapshot>,
}

pub async fn get_pnl_history(
    Query(params): Query<HistoryQuery>,
    State(state): State<AppState>,
) -> Result<Json<HistoryResponse>, AppError> {
    let period = match params.period.as_deref() {
        Some(raw) => HistoryPeriod::from_str(raw).map_err(AppError::BadRequest)?,
        None => HistoryPeriod::default(),
    };

    let all = state.repo.list_snapshots().await?;
    let snapshots = query_history(&all, period, Utc::now(), state.config.history_max_points);
    Ok(Json(HistoryResponse {
        period,
        count: snapshots.len(),
        total_count: all.len(),
        snapshots,
    }))
}

// =============================================================================
// Activity
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityQuery {
    pub category: Option<String>,
    pub start_date: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityResponse {
    pub configured: bool,
    pub total: usize,
    pub filtered: usize,
    pub activities: Vec<Activity>,
}

pub async fn get_activity(
    Query(params): Query<ActivityQuery>,
    State(state): State<AppState>,
) -> Result<Json<ActivityResponse>, AppError> {
    let category = match params.category.as_deref() {
        None | Some("all") | Some("") => None,
        Some(raw) => Some(ActivityCategory::from_str(raw).map_err(AppError::BadRequest)?),
    };
    let start = params
        .start_date
        .as_deref()
        .map(parse_entry_date)
        .transpose()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let limit = params
        .limit
        .unwrap_or(DEFAULT_ACTIVITY_LIMIT)
        .clamp(1, MAX_ACTIVITY_LIMIT);

    let document = state.repo.load().await?;
    let Some(addresses) = document
        .vault_wallet()
        .and_then(|w| w.vault_addresses())
        .cloned()
    else {
        return Ok(Json(ActivityResponse {
            configured: false,
            total: 0,
            filtered: 0,
            activities: Vec::new(),
        }));
    };

    // Without a start date, read from the vault's tracking start (or a year back).
    let from = start.unwrap_or_else(|| {
        document
            .vault_settings
            .as_ref()
            .map_or_else(|| Utc::now() - Duration::days(365), |s| s.initial_date)
    });
    let activities = state
        .activity
        .fetch_activity(&addresses.hyperliquid, from.timestamp_millis())
        .await?;

    let total = activities.len();
    let filter = ActivityFilter {
        category,
        start,
        limit: None,
    };
    let mut activities = filter.apply(activities);
    let filtered = activities.len();
    activities.truncate(limit);

    Ok(Json(ActivityResponse {
        configured: true,
        total,
        filtered,
        activities,
    }))
}
