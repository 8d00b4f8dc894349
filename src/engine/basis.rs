use crate::domain::{LedgerEntry, VaultSettings};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Net invested amount at `as_of`: deposits minus withdrawals dated on or before it.
pub fn investment_basis_at(entries: &[LedgerEntry], as_of: DateTime<Utc>) -> Decimal {
    entries
        .iter()
        .filter(|e| e.date <= as_of)
        .map(LedgerEntry::signed_amount)
        .fold(Decimal::ZERO, Decimal::saturating_add)
}

/// Basis used for PNL at `as_of`.
///
/// The ledger wins when it nets to a non-zero amount; otherwise the
/// configured initial investment applies. `None` means nothing is configured.
/// The result may be negative, which callers treat as an invalid basis.
pub fn resolve_basis(
    entries: &[LedgerEntry],
    settings: Option<&VaultSettings>,
    as_of: DateTime<Utc>,
) -> Option<Decimal> {
    let ledger = investment_basis_at(entries, as_of);
    if !ledger.is_zero() {
        return Some(ledger);
    }
    match settings {
        Some(s) => Some(s.initial_investment_usd),
        None if entries.is_empty() => None,
        None => Some(ledger),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LedgerKind;
    use chrono::TimeZone;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, d, 0, 0, 0).unwrap()
    }

    fn entry(kind: LedgerKind, amount: i64, date: DateTime<Utc>) -> LedgerEntry {
        LedgerEntry::new(kind, Decimal::from(amount), date, String::new()).unwrap()
    }

    #[test]
    fn test_basis_over_time() {
        let entries = vec![
            entry(LedgerKind::Deposit, 5000, day(1)),
            entry(LedgerKind::Withdrawal, 1000, day(10)),
        ];
        assert_eq!(investment_basis_at(&entries, day(5)), Decimal::from(5000));
        assert_eq!(investment_basis_at(&entries, day(15)), Decimal::from(4000));
    }

    #[test]
    fn test_entry_at_as_of_is_included() {
        let entries = vec![
            entry(LedgerKind::Deposit, 300, day(2)),
            entry(LedgerKind::Deposit, 700, day(3)),
        ];
        assert_eq!(investment_basis_at(&entries, day(2)), Decimal::from(300));
        assert_eq!(investment_basis_at(&entries, day(1)), Decimal::ZERO);
    }

    #[test]
    fn test_resolve_falls_back_to_settings() {
        let settings = VaultSettings::default_at(day(1));
        assert_eq!(
            resolve_basis(&[], Some(&settings), day(5)),
            Some(Decimal::from(5000))
        );

        // Entries all after as_of net to zero: settings apply.
        let later = vec![entry(LedgerKind::Deposit, 200, day(20))];
        assert_eq!(
            resolve_basis(&later, Some(&settings), day(5)),
            Some(Decimal::from(5000))
        );

        let ledger = vec![entry(LedgerKind::Deposit, 1200, day(2))];
        assert_eq!(
            resolve_basis(&ledger, Some(&settings), day(5)),
            Some(Decimal::from(1200))
        );
    }

    #[test]
    fn test_resolve_without_configuration() {
        assert_eq!(resolve_basis(&[], None, day(5)), None);

        let netted = vec![
            entry(LedgerKind::Deposit, 100, day(1)),
            entry(LedgerKind::Withdrawal, 300, day(2)),
        ];
        assert_eq!(resolve_basis(&netted, None, day(5)), Some(Decimal::from(-200)));
    }
}
