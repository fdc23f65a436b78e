// 🧹 Record Cleaner - silent row filtering before aggregation

use serde::Serialize;
use tracing::debug;

use crate::record::TransactionRecord;

/// Counts of what the cleaner kept and dropped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleaningStats {
    pub kept: usize,
    pub missing_customer: usize,
    pub cancelled: usize,
}

impl CleaningStats {
    pub fn dropped(&self) -> usize {
        self.missing_customer + self.cancelled
    }

    pub fn summary(&self) -> String {
        format!(
            "{} kept, {} dropped ({} without customer id, {} cancelled)",
            self.kept,
            self.dropped(),
            self.missing_customer,
            self.cancelled
        )
    }
}

/// Drop anonymous and cancelled rows.
///
/// Rules, in order:
/// 1. no customer id → dropped
/// 2. invoice id contains `C` → dropped (substring, case-sensitive)
///
/// Quantity and price are passed through untouched.
pub fn clean(records: Vec<TransactionRecord>) -> Vec<TransactionRecord> {
    clean_with_stats(records).0
}

/// Same as [`clean`], also reporting how many rows each rule removed
pub fn clean_with_stats(records: Vec<TransactionRecord>) -> (Vec<TransactionRecord>, CleaningStats) {
    let mut stats = CleaningStats::default();

    let kept: Vec<TransactionRecord> = records
        .into_iter()
        .filter(|record| {
            if record.customer_id.is_none() {
                stats.missing_customer += 1;
                false
            } else if record.is_cancelled() {
                stats.cancelled += 1;
                false
            } else {
                true
            }
        })
        .collect();

    stats.kept = kept.len();
    debug!(
        kept = stats.kept,
        missing_customer = stats.missing_customer,
        cancelled = stats.cancelled,
        "cleaned transaction records"
    );

    (kept, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use rust_decimal::Decimal;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2011, 1, 5)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    fn record(invoice: &str, customer: Option<u64>, quantity: i64) -> TransactionRecord {
        TransactionRecord::new(invoice, customer, quantity, Decimal::new(199, 2), ts())
    }

    #[test]
    fn test_drops_missing_customer_and_cancelled() {
        let records = vec![
            record("536365", Some(17850), 6),
            record("536366", None, 6),
            record("C536379", Some(17850), -1),
            record("536367", Some(13047), 8),
        ];

        let (kept, stats) = clean_with_stats(records);

        assert_eq!(kept.len(), 2);
        assert_eq!(stats.kept, 2);
        assert_eq!(stats.missing_customer, 1);
        assert_eq!(stats.cancelled, 1);
        assert_eq!(stats.dropped(), 2);
        assert!(kept.iter().all(|r| !r.invoice_id.contains('C')));
    }

    #[test]
    fn test_missing_customer_checked_first() {
        // Anonymous AND cancelled counts once, as missing customer
        let (_, stats) = clean_with_stats(vec![record("C1", None, 1)]);
        assert_eq!(stats.missing_customer, 1);
        assert_eq!(stats.cancelled, 0);
    }

    #[test]
    fn test_substring_not_prefix() {
        let kept = clean(vec![record("53C365", Some(1), 1), record("A53365", Some(1), 1)]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].invoice_id, "A53365");
    }

    #[test]
    fn test_negative_quantity_passes_through() {
        let kept = clean(vec![record("536400", Some(42), -12)]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].quantity, -12);
        assert_eq!(kept[0].unit_price, Decimal::new(199, 2));
    }

    #[test]
    fn test_preserves_order() {
        let kept = clean(vec![
            record("3", Some(3), 1),
            record("1", Some(1), 1),
            record("2", Some(2), 1),
        ]);
        let ids: Vec<&str> = kept.iter().map(|r| r.invoice_id.as_str()).collect();
        assert_eq!(ids, vec!["3", "1", "2"]);
    }
}
