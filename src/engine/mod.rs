//! Pure computations: valuation, investment basis and history sampling.

pub mod basis;
pub mod history;
pub mod valuation;

pub use basis::{investment_basis_at, resolve_basis};
pub use history::{query_history, HistoryPeriod, DEFAULT_MAX_POINTS};
pub use valuation::{compute_valuation, Valuation};
