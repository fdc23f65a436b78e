// 📋 Segment Reports - per-segment summaries, extraction, output fingerprint

use rust_decimal::Decimal;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use crate::error::{Result, ScoringError};
use crate::record::CustomerId;
use crate::segments::{Segment, SegmentedCustomer};

// ============================================================================
// SEGMENT SUMMARY
// ============================================================================

/// Count and average metrics of the customers in one segment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentSummary {
    pub segment: Segment,
    pub customers: usize,
    pub mean_recency: f64,
    pub mean_frequency: f64,
    pub mean_monetary: Decimal,
}

impl SegmentSummary {
    pub fn summary(&self) -> String {
        format!(
            "{:<20} {:>6} customers | recency {:>8.1} | frequency {:>6.1} | monetary {:>12}",
            self.segment.as_str(),
            self.customers,
            self.mean_recency,
            self.mean_frequency,
            self.mean_monetary
        )
    }
}

#[derive(Default)]
struct Totals {
    customers: usize,
    recency: i64,
    frequency: u64,
    monetary: Decimal,
}

/// One summary per populated segment, in rule table order.
///
/// Fails if a segment's total spend leaves Decimal's range.
pub fn summarize_segments(customers: &[SegmentedCustomer]) -> Result<Vec<SegmentSummary>> {
    let mut totals: BTreeMap<Segment, Totals> = BTreeMap::new();

    for customer in customers {
        let aggregate = &customer.scored.aggregate;
        let entry = totals.entry(customer.segment).or_default();
        entry.customers += 1;
        entry.recency += aggregate.recency;
        entry.frequency += aggregate.frequency;
        entry.monetary = entry
            .monetary
            .checked_add(aggregate.monetary)
            .ok_or(ScoringError::MonetaryOverflow {
                customer_id: aggregate.customer_id,
            })?;
    }

    Ok(totals
        .into_iter()
        .map(|(segment, t)| {
            let n = t.customers as f64;
            SegmentSummary {
                segment,
                customers: t.customers,
                mean_recency: t.recency as f64 / n,
                mean_frequency: t.frequency as f64 / n,
                mean_monetary: (t.monetary / Decimal::from(t.customers)).round_dp(2),
            }
        })
        .collect())
}

/// Ids of the customers in `segment`, in output order
pub fn customers_in(customers: &[SegmentedCustomer], segment: Segment) -> Vec<CustomerId> {
    customers
        .iter()
        .filter(|c| c.segment == segment)
        .map(SegmentedCustomer::customer_id)
        .collect()
}

// ============================================================================
// FINGERPRINT
// ============================================================================

/// SHA-256 over every output row; equal outputs give equal fingerprints
pub fn fingerprint(customers: &[SegmentedCustomer]) -> String {
    let mut hasher = Sha256::new();
    for customer in customers {
        let scored = &customer.scored;
        let aggregate = &scored.aggregate;
        hasher.update(format!(
            "{}|{}|{}|{}|{}|{}|{}|{}\n",
            aggregate.customer_id,
            aggregate.recency,
            aggregate.frequency,
            aggregate.monetary,
            scored.recency_score,
            scored.frequency_score,
            scored.monetary_score,
            customer.segment
        ));
    }
    format!("{:x}", hasher.finalize())
}

// ============================================================================
// TESTS
// ============================================================================
