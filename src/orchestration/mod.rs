pub mod scheduler;
pub mod valuation;

pub use scheduler::{SchedulerError, SchedulerState, SkipReason, SnapshotScheduler, TickOutcome};
pub use valuation::{NetworkOutcome, ValuationService, VaultValuation};
