// 📊 Metric Aggregator - per-customer recency / frequency / monetary

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};

use crate::error::{Result, ScoringError};
use crate::record::{CustomerId, TransactionRecord};

/// Raw RFM metrics for one customer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerAggregate {
    pub customer_id: CustomerId,
    /// Whole days between the reference date and the latest purchase
    pub recency: i64,
    /// Distinct invoices
    pub frequency: u64,
    /// Net spend, sum of quantity * unit price
    pub monetary: Decimal,
}

/// Running state for one customer while records stream in
struct Accumulator {
    latest: NaiveDateTime,
    invoices: HashSet<String>,
    monetary: Decimal,
}

impl Accumulator {
    fn new(record: &TransactionRecord) -> Self {
        Accumulator {
            latest: record.invoice_timestamp,
            invoices: HashSet::new(),
            monetary: Decimal::ZERO,
        }
    }

    fn add(&mut self, customer_id: CustomerId, record: TransactionRecord) -> Result<()> {
        self.monetary = record
            .line_total()
            .and_then(|total| self.monetary.checked_add(total))
            .ok_or(ScoringError::MonetaryOverflow { customer_id })?;
        if record.invoice_timestamp > self.latest {
            self.latest = record.invoice_timestamp;
        }
        self.invoices.insert(record.invoice_id);
        Ok(())
    }
}

/// Group cleaned records by customer and compute raw metrics.
///
/// Customers whose net spend is zero or negative are dropped. Output is
/// ordered by customer id. Fails when `reference_date` is earlier than any
/// customer's latest purchase, since recency would go negative, and when a
/// customer's net spend leaves Decimal's range.
///
/// Records without a customer id are skipped; run [`crate::cleaner::clean`] first.
pub fn aggregate(
    records: Vec<TransactionRecord>,
    reference_date: NaiveDateTime,
) -> Result<Vec<CustomerAggregate>> {
    let mut groups: BTreeMap<CustomerId, Accumulator> = BTreeMap::new();

    for record in records {
        let Some(customer_id) = record.customer_id else {
            continue;
        };
        groups
            .entry(customer_id)
            .or_insert_with(|| Accumulator::new(&record))
            .add(customer_id, record)?;
    }

    let customers = groups.len();
    let mut aggregates = Vec::with_capacity(customers);

    for (customer_id, acc) in groups {
        if reference_date < acc.latest {
            return Err(ScoringError::ReferenceDateBeforeTransaction {
                customer_id,
                reference_date,
                latest: acc.latest,
            });
        }

        if acc.monetary <= Decimal::ZERO {
            continue;
        }

        aggregates.push(CustomerAggregate {
            customer_id,
            recency: (reference_date - acc.latest).num_days(),
            frequency: acc.invoices.len() as u64,
            monetary: acc.monetary,
        });
    }

    let non_positive = customers - aggregates.len();
    if non_positive > 0 {
        warn!(dropped = non_positive, "dropped customers with non-positive monetary value");
    }
    debug!(customers = aggregates.len(), "aggregated customer metrics");

    Ok(aggregates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2011, 3, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn record(invoice: &str, customer: u64, quantity: i64, cents: i64, when: NaiveDateTime) -> TransactionRecord {
        TransactionRecord::new(invoice, Some(customer), quantity, Decimal::new(cents, 2), when)
    }

    #[test]
    fn test_metrics_per_customer() {
        let records = vec![
            record("100", 1, 2, 500, at(1, 9)),
            record("100", 1, 1, 250, at(1, 9)),
            record("101", 1, 4, 100, at(10, 15)),
            record("102", 2, 1, 1000, at(5, 12)),
        ];

        let aggs = aggregate(records, at(20, 0)).unwrap();

        assert_eq!(aggs.len(), 2);
        assert_eq!(aggs[0].customer_id, 1);
        // 2011-03-20 00:00 - 2011-03-10 15:00 = 9 days 9 hours
        assert_eq!(aggs[0].recency, 9);
        assert_eq!(aggs[0].frequency, 2);
        assert_eq!(aggs[0].monetary, Decimal::new(1650, 2));

        assert_eq!(aggs[1].customer_id, 2);
        assert_eq!(aggs[1].recency, 14);
        assert_eq!(aggs[1].frequency, 1);
        assert_eq!(aggs[1].monetary, Decimal::new(1000, 2));
    }

    #[test]
    fn test_drops_non_positive_monetary() {
        let records = vec![
            record("200", 7, 1, 500, at(2, 10)),
            record("201", 7, -1, 500, at(3, 10)),
            record("202", 8, -2, 300, at(3, 10)),
            record("203", 9, 1, 1, at(3, 10)),
        ];

        let aggs = aggregate(records, at(20, 0)).unwrap();

        assert_eq!(aggs.len(), 1);
        assert_eq!(aggs[0].customer_id, 9);
        assert!(aggs.iter().all(|a| a.monetary > Decimal::ZERO));
    }

    #[test]
    fn test_reference_date_before_transaction_is_error() {
        let records = vec![record("300", 5, 1, 100, at(15, 12))];

        let err = aggregate(records, at(15, 0)).unwrap_err();
        match err {
            ScoringError::ReferenceDateBeforeTransaction { customer_id, .. } => {
                assert_eq!(customer_id, 5)
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_monetary_overflow_is_error() {
        let huge = |invoice: &str| {
            TransactionRecord::new(invoice, Some(11), 1, Decimal::MAX, at(2, 10))
        };
        let records = vec![record("500", 10, 1, 100, at(1, 10)), huge("501"), huge("502")];

        let err = aggregate(records, at(20, 0)).unwrap_err();
        assert!(matches!(err, ScoringError::MonetaryOverflow { customer_id: 11 }));
    }

    #[test]
    fn test_line_total_overflow_is_error() {
        let records = vec![TransactionRecord::new("600", Some(12), 3, Decimal::MAX, at(2, 10))];

        let err = aggregate(records, at(20, 0)).unwrap_err();
        assert!(matches!(err, ScoringError::MonetaryOverflow { customer_id: 12 }));
    }

    #[test]
    fn test_same_instant_is_zero_recency() {
        let aggs = aggregate(vec![record("400", 3, 1, 100, at(15, 12))], at(15, 12)).unwrap();
        assert_eq!(aggs[0].recency, 0);
    }

    #[test]
    fn test_ordered_by_customer_id() {
        let records = vec![
            record("1", 30, 1, 100, at(1, 0)),
            record("2", 10, 1, 100, at(1, 0)),
            record("3", 20, 1, 100, at(1, 0)),
        ];
        let ids: Vec<u64> = aggregate(records, at(2, 0))
            .unwrap()
            .iter()
            .map(|a| a.customer_id)
            .collect();
        assert_eq!(ids, vec![10, 20, 30]);
    }
}
