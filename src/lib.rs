// RFM Segmentation - Core Library
// Scoring engine plus the CSV/CLI collaborators around it

pub mod record;
pub mod error;
pub mod cleaner;        // Drop anonymous and cancelled rows
pub mod aggregate;      // Per-customer recency / frequency / monetary
pub mod scoring;        // Quintile scores
pub mod segments;       // rf code → segment rules
pub mod pipeline;       // clean → aggregate → score → classify
pub mod report;
pub mod ingest;
pub mod export;
pub mod config;
pub mod telemetry;
pub mod cli;

// Re-export commonly used types
pub use record::{CustomerId, TransactionRecord};
pub use error::{ConfigError, Metric, Result, ScoringError};
pub use cleaner::{clean, clean_with_stats, CleaningStats};
pub use aggregate::{aggregate, CustomerAggregate};
pub use scoring::{score, RfCode, Score, ScoredCustomer, BINS};
pub use segments::{
    classify, DigitClass, PatternError, RuleDefinition, Segment, SegmentClassifier,
    SegmentRule, SegmentedCustomer, STANDARD_RULES,
};
pub use pipeline::{run, ScoringPipeline};
pub use report::{customers_in, fingerprint, summarize_segments, SegmentSummary};
pub use ingest::{load_csv, read_records, suggest_reference_date};
pub use export::{write_customer_ids, write_results_csv};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
