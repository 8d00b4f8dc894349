//! Recurring snapshot job.
//!
//! One cycle loads the vault configuration, values the vault, resolves the
//! investment basis and appends a snapshot. Cycles run inline in the timer
//! loop, so two of them never overlap; ticks missed while a cycle runs are
//! skipped rather than queued.

use super::valuation::ValuationService;
use crate::domain::decimal::round_usd;
use crate::domain::Snapshot;
use crate::engine::resolve_basis;
use crate::store::{Repository, StoreError};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerState {
    Idle,
    Computing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No vault wallet with both addresses.
    NoVault,
    /// Neither settings nor ledger entries exist.
    NoBasis,
    /// The resolved basis is not positive, or too small to divide by.
    InvalidBasis(Decimal),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoVault => write!(f, "no vault wallet configured"),
            SkipReason::NoBasis => write!(f, "no investment basis configured"),
            SkipReason::InvalidBasis(basis) => write!(f, "invalid investment basis {}", basis),
        }
    }
}

/// What one cycle did.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Appended(Snapshot),
    Skipped(SkipReason),
    Failed(String),
}

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug)]
pub struct SnapshotScheduler {
    repo: Arc<Repository>,
    valuation: Arc<ValuationService>,
    interval: Duration,
    warmup: Duration,
    state: watch::Sender<SchedulerState>,
}

impl SnapshotScheduler {
    pub fn new(
        repo: Arc<Repository>,
        valuation: Arc<ValuationService>,
        interval: Duration,
        warmup: Duration,
    ) -> Self {
        let (state, _) = watch::channel(SchedulerState::Idle);
        Self {
            repo,
            valuation,
            interval,
            warmup,
            state,
        }
    }

    pub fn state(&self) -> SchedulerState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<SchedulerState> {
        self.state.subscribe()
    }

    /// Run cycles until `shutdown` flips to `true` (or its sender is dropped).
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let start = Instant::now() + self.warmup;
        let mut ticker = interval_at(start, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(
            interval_secs = self.interval.as_secs(),
            warmup_secs = self.warmup.as_secs(),
            "Snapshot scheduler started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.run_cycle().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!("Snapshot scheduler stopped");
    }

    /// Run one cycle now.
    pub async fn run_cycle(&self) -> TickOutcome {
        self.state.send_replace(SchedulerState::Computing);
        let outcome = match self.try_cycle(Utc::now()).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(error = %e, "Snapshot cycle failed");
                TickOutcome::Failed(e.to_string())
            }
        };
        self.state.send_replace(SchedulerState::Idle);
        outcome
    }

    async fn try_cycle(&self, now: DateTime<Utc>) -> Result<TickOutcome, SchedulerError> {
        let document = self.repo.load().await?;
        let Some(addresses) = document
            .vault_wallet()
            .and_then(|w| w.vault_addresses())
            .cloned()
        else {
            debug!("Skipping snapshot: {}", SkipReason::NoVault);
            return Ok(TickOutcome::Skipped(SkipReason::NoVault));
        };
        if document.vault_settings.is_none() && document.vault_transactions.is_empty() {
            debug!("Skipping snapshot: {}", SkipReason::NoBasis);
            return Ok(TickOutcome::Skipped(SkipReason::NoBasis));
        }

        let result = self.valuation.valuate(&addresses).await;
        if result.is_degraded() {
            warn!(
                networks = ?result.degraded_networks(),
                "Snapshot computed with degraded networks"
            );
        }

        // Ledger edits made while the valuation was in flight still count.
        let document = self.repo.load().await?;
        let Some(basis) = resolve_basis(
            &document.vault_transactions,
            document.vault_settings.as_ref(),
            now,
        ) else {
            debug!("Skipping snapshot: {}", SkipReason::NoBasis);
            return Ok(TickOutcome::Skipped(SkipReason::NoBasis));
        };

        let value = round_usd(result.valuation.total_usd);
        let Some(snapshot) = Snapshot::compute(now, value, basis) else {
            info!(basis = %basis, "Skipping snapshot: {}", SkipReason::InvalidBasis(basis));
            return Ok(TickOutcome::Skipped(SkipReason::InvalidBasis(basis)));
        };

        self.repo.append_snapshot(snapshot.clone()).await?;
        info!(
            value = %snapshot.v,
            basis = %snapshot.i,
            pnl_percent = %snapshot.p,
            "Appended PNL snapshot"
        );
        Ok(TickOutcome::Appended(snapshot))
    }
}
