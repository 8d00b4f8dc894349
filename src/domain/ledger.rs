//! Manual deposit/withdrawal ledger entries.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Direction of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerKind {
    Deposit,
    Withdrawal,
}

impl LedgerKind {
    /// Signed contribution of `amount` to the investment basis.
    pub fn signed(&self, amount: Decimal) -> Decimal {
        match self {
            LedgerKind::Deposit => amount,
            LedgerKind::Withdrawal => -amount,
        }
    }
}

/// A user-recorded deposit or withdrawal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: LedgerKind,
    /// Always > 0; the sign comes from `kind`.
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    /// Effective date used for basis folding.
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub note: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerEntryError {
    #[error("amount must be greater than zero")]
    NonPositiveAmount,
    #[error("invalid date: {0}")]
    InvalidDate(String),
}

impl LedgerEntry {
    /// Build a new entry, validating the amount.
    pub fn new(
        kind: LedgerKind,
        amount: Decimal,
        date: DateTime<Utc>,
        note: String,
    ) -> Result<Self, LedgerEntryError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerEntryError::NonPositiveAmount);
        }
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            kind,
            amount,
            date,
            note,
            created_at: Utc::now(),
        })
    }

    pub fn signed_amount(&self) -> Decimal {
        self.kind.signed(self.amount)
    }
}

/// Parse a user-supplied date: RFC 3339, or `YYYY-MM-DD` meaning midnight UTC.
pub fn parse_entry_date(input: &str) -> Result<DateTime<Utc>, LedgerEntryError> {
    let trimmed = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| LedgerEntryError::InvalidDate(input.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_new_rejects_non_positive_amount() {
        let err = LedgerEntry::new(LedgerKind::Deposit, Decimal::ZERO, Utc::now(), String::new())
            .unwrap_err();
        assert_eq!(err, LedgerEntryError::NonPositiveAmount);

        let err = LedgerEntry::new(
            LedgerKind::Withdrawal,
            Decimal::from(-5),
            Utc::now(),
            String::new(),
        )
        .unwrap_err();
        assert_eq!(err, LedgerEntryError::NonPositiveAmount);
    }

    #[test]
    fn test_signed_amount() {
        let dep =
            LedgerEntry::new(LedgerKind::Deposit, Decimal::from(100), Utc::now(), String::new())
                .unwrap();
        let wd = LedgerEntry::new(
            LedgerKind::Withdrawal,
            Decimal::from(40),
            Utc::now(),
            String::new(),
        )
        .unwrap();
        assert_eq!(dep.signed_amount(), Decimal::from(100));
        assert_eq!(wd.signed_amount(), Decimal::from(-40));
    }

    #[test]
    fn test_parse_entry_date_formats() {
        let day = parse_entry_date("2025-01-15").unwrap();
        assert_eq!(day, Utc.with_ymd_and_hms(2025, 1, 15, 0, 0, 0).unwrap());

        let full = parse_entry_date("2025-01-15T12:30:00Z").unwrap();
        assert_eq!(full, Utc.with_ymd_and_hms(2025, 1, 15, 12, 30, 0).unwrap());

        assert!(parse_entry_date("15/01/2025").is_err());
    }

    #[test]
    fn test_entry_json_shape() {
        let entry = LedgerEntry::new(
            LedgerKind::Withdrawal,
            Decimal::from(250),
            Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap(),
            "rebalance".to_string(),
        )
        .unwrap();
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["type"], "withdrawal");
        assert_eq!(json["amount"], 250.0);
        assert_eq!(json["note"], "rebalance");
        assert!(json["createdAt"].is_string());
    }
}
