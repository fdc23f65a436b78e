// ⚠️ Error taxonomy for the scoring engine
// Filtered rows are NOT errors - only conditions that must abort a run live here.

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::record::CustomerId;

/// Which metric column a binning failure refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Recency,
    Frequency,
    Monetary,
}

impl Metric {
    pub fn name(&self) -> &'static str {
        match self {
            Metric::Recency => "recency",
            Metric::Frequency => "frequency",
            Metric::Monetary => "monetary",
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error)]
pub enum ScoringError {
    /// Configuration error: the reference date is earlier than a customer's latest purchase
    #[error(
        "reference date {reference_date} precedes latest transaction {latest} of customer {customer_id}"
    )]
    ReferenceDateBeforeTransaction {
        customer_id: CustomerId,
        reference_date: NaiveDateTime,
        latest: NaiveDateTime,
    },

    /// Net spend of a customer (or of a segment) does not fit in a Decimal
    #[error("monetary total overflowed at customer {customer_id}")]
    MonetaryOverflow { customer_id: CustomerId },

    /// Nothing left to score once cancelled/anonymous rows and non-positive spenders are gone
    #[error("no customers with positive monetary value left to score")]
    NoCustomers,

    /// Underdetermined binning: the column cannot be split into 5 groups
    #[error("insufficient distinct values for {metric}: found {distinct}, need at least {required}")]
    InsufficientDistinctValues {
        metric: Metric,
        distinct: usize,
        required: usize,
    },

    /// Underdetermined binning: quantile edges collapse because of heavy ties
    #[error("quantile edges for {metric} are not unique: {edges}")]
    DegenerateQuantiles { metric: Metric, edges: String },

    /// Internal invariant violation: an rf code no segment rule covers
    #[error("rf code {code} matches no segment rule")]
    UnclassifiedCode { code: String },
}

pub type Result<T> = std::result::Result<T, ScoringError>;

/// Configuration loading failures
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} must be a non-negative integer, got '{value}'")]
    InvalidOffset { var: &'static str, value: String },
}
