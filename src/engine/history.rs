//! Period filtering and downsampling of the snapshot series.

use crate::domain::Snapshot;
use chrono::{DateTime, Duration, Utc};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Default upper bound on returned points.
pub const DEFAULT_MAX_POINTS: usize = 2000;

/// Lookback window for a history query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryPeriod {
    OneDay,
    OneWeek,
    #[default]
    OneMonth,
    ThreeMonths,
    SixMonths,
    OneYear,
    All,
}

impl HistoryPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryPeriod::OneDay => "1D",
            HistoryPeriod::OneWeek => "1W",
            HistoryPeriod::OneMonth => "1M",
            HistoryPeriod::ThreeMonths => "3M",
            HistoryPeriod::SixMonths => "6M",
            HistoryPeriod::OneYear => "1Y",
            HistoryPeriod::All => "ALL",
        }
    }

    /// Window length; `None` for all-time.
    pub fn window(&self) -> Option<Duration> {
        match self {
            HistoryPeriod::OneDay => Some(Duration::days(1)),
            HistoryPeriod::OneWeek => Some(Duration::days(7)),
            HistoryPeriod::OneMonth => Some(Duration::days(30)),
            HistoryPeriod::ThreeMonths => Some(Duration::days(90)),
            HistoryPeriod::SixMonths => Some(Duration::days(180)),
            HistoryPeriod::OneYear => Some(Duration::days(365)),
            HistoryPeriod::All => None,
        }
    }
}

impl FromStr for HistoryPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "1D" => Ok(HistoryPeriod::OneDay),
            "1W" => Ok(HistoryPeriod::OneWeek),
            "1M" => Ok(HistoryPeriod::OneMonth),
            "3M" => Ok(HistoryPeriod::ThreeMonths),
            "6M" => Ok(HistoryPeriod::SixMonths),
            "1Y" => Ok(HistoryPeriod::OneYear),
            "ALL" => Ok(HistoryPeriod::All),
            other => Err(format!("unknown period: {}", other)),
        }
    }
}

impl fmt::Display for HistoryPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for HistoryPeriod {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Snapshots inside `period` (relative to `now`), in stored order, at most
/// `max_points` of them.
///
/// Above the budget every Nth point is kept with `N = ceil(count / max_points)`.
/// The first and last points in the window always survive.
pub fn query_history(
    snapshots: &[Snapshot],
    period: HistoryPeriod,
    now: DateTime<Utc>,
    max_points: usize,
) -> Vec<Snapshot> {
    let in_window: Vec<&Snapshot> = match period.window() {
        Some(window) => {
            let cutoff = now - window;
            snapshots.iter().filter(|s| s.t >= cutoff).collect()
        }
        None => snapshots.iter().collect(),
    };

    let max_points = max_points.max(2);
    let count = in_window.len();
    if count <= max_points {
        return in_window.into_iter().cloned().collect();
    }

    let stride = count.div_ceil(max_points);
    let mut sampled: Vec<Snapshot> = in_window
        .iter()
        .step_by(stride)
        .map(|s| (*s).clone())
        .collect();

    if (count - 1) % stride != 0 {
        let last = in_window[count - 1].clone();
        if sampled.len() < max_points {
            sampled.push(last);
        } else if let Some(tail) = sampled.last_mut() {
            *tail = last;
        }
    }
    sampled
}
