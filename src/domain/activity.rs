//! Account activity (trades, funding, transfers) from Hyperliquid.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityCategory {
    Trade,
    Funding,
    Transfer,
}

impl FromStr for ActivityCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trade" => Ok(ActivityCategory::Trade),
            "funding" => Ok(ActivityCategory::Funding),
            "transfer" => Ok(ActivityCategory::Transfer),
            other => Err(format!("unknown category: {}", other)),
        }
    }
}

/// One entry of the activity feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub category: ActivityCategory,
    /// Source-specific type, e.g. `buy`, `sell`, `deposit`, `funding`.
    #[serde(rename = "type")]
    pub kind: String,
    pub asset: String,
    pub network: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    /// USD value (signed for funding and transfers).
    #[serde(with = "rust_decimal::serde::float")]
    pub value: Decimal,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub fee: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
}

/// Filter applied to the activity feed.
#[derive(Debug, Clone, Default)]
pub struct ActivityFilter {
    pub category: Option<ActivityCategory>,
    pub start: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

impl ActivityFilter {
    /// Keep matching activities, newest first, truncated to `limit`.
    pub fn apply(&self, mut activities: Vec<Activity>) -> Vec<Activity> {
        activities.retain(|a| {
            self.category.map_or(true, |c| a.category == c)
                && self.start.map_or(true, |s| a.timestamp >= s)
        });
        activities.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| a.id.cmp(&b.id)));
        if let Some(limit) = self.limit {
            activities.truncate(limit);
        }
        activities
    }
}
