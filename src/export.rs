// 💾 CSV export of scoring results

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

use crate::record::CustomerId;
use crate::segments::{Segment, SegmentedCustomer};

/// Flat output row, one per customer
#[derive(Debug, Serialize)]
struct ResultRow {
    customer_id: CustomerId,
    recency: i64,
    frequency: u64,
    monetary: Decimal,
    recency_score: u8,
    frequency_score: u8,
    monetary_score: u8,
    rf_code: String,
    segment: Segment,
}

impl From<&SegmentedCustomer> for ResultRow {
    fn from(customer: &SegmentedCustomer) -> Self {
        let scored = &customer.scored;
        ResultRow {
            customer_id: scored.aggregate.customer_id,
            recency: scored.aggregate.recency,
            frequency: scored.aggregate.frequency,
            monetary: scored.aggregate.monetary,
            recency_score: scored.recency_score.get(),
            frequency_score: scored.frequency_score.get(),
            monetary_score: scored.monetary_score.get(),
            rf_code: scored.rf_code.to_string(),
            segment: customer.segment,
        }
    }
}

/// Write the full result table to `path`
pub fn write_results_csv(path: &Path, customers: &[SegmentedCustomer]) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create output file: {:?}", path))?;
    write_results(file, customers)
}

pub fn write_results<W: Write>(writer: W, customers: &[SegmentedCustomer]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for customer in customers {
        wtr.serialize(ResultRow::from(customer))
            .with_context(|| format!("Failed to write customer {}", customer.customer_id()))?;
    }
    wtr.flush().context("Failed to flush results")?;
    Ok(())
}

/// Write a single-column id list (e.g. every `new_customers` id) to `path`
pub fn write_customer_ids(path: &Path, header: &str, ids: &[CustomerId]) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create output file: {:?}", path))?;
    write_ids(file, header, ids)
}

pub fn write_ids<W: Write>(writer: W, header: &str, ids: &[CustomerId]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record([header]).context("Failed to write header")?;
    for id in ids {
        wtr.write_record([id.to_string()])
            .with_context(|| format!("Failed to write customer id {id}"))?;
    }
    wtr.flush().context("Failed to flush customer ids")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::CustomerAggregate;
    use crate::scoring::{RfCode, Score, ScoredCustomer};

    fn customer() -> SegmentedCustomer {
        let r = Score::new(5).unwrap();
        let f = Score::new(1).unwrap();
        SegmentedCustomer {
            scored: ScoredCustomer {
                aggregate: CustomerAggregate {
                    customer_id: 12347,
                    recency: 3,
                    frequency: 1,
                    monetary: Decimal::new(71146, 2),
                },
                recency_score: r,
                frequency_score: f,
                monetary_score: Score::new(4).unwrap(),
                rf_code: RfCode::new(r, f),
            },
            segment: Segment::NewCustomers,
        }
    }

    #[test]
    fn test_write_results() {
        let mut out = Vec::new();
        write_results(&mut out, &[customer()]).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "customer_id,recency,frequency,monetary,recency_score,frequency_score,monetary_score,rf_code,segment"
        );
        assert_eq!(lines[1], "12347,3,1,711.46,5,1,4,51,new_customers");
    }

    #[test]
    fn test_write_ids() {
        let mut out = Vec::new();
        write_ids(&mut out, "new_customer_id", &[12347, 12350]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "new_customer_id\n12347\n12350\n");
    }
}
