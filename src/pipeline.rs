// 🔁 Scoring Pipeline - clean → aggregate → score → classify
// No branching of its own: the first stage error is returned as-is.

use chrono::NaiveDateTime;
use tracing::{info, info_span};

use crate::aggregate::aggregate;
use crate::cleaner::clean_with_stats;
use crate::error::Result;
use crate::record::TransactionRecord;
use crate::scoring::score;
use crate::segments::{SegmentClassifier, SegmentedCustomer};

#[derive(Debug, Clone, Default)]
pub struct ScoringPipeline {
    classifier: SegmentClassifier,
}

impl ScoringPipeline {
    /// Pipeline with the built-in segment table
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_classifier(classifier: SegmentClassifier) -> Self {
        ScoringPipeline { classifier }
    }

    pub fn classifier(&self) -> &SegmentClassifier {
        &self.classifier
    }

    /// Run every stage over one snapshot of records.
    ///
    /// `reference_date` is "today" for recency and must not precede any
    /// transaction. Either every surviving customer is segmented or an error
    /// is returned.
    pub fn run(
        &self,
        records: Vec<TransactionRecord>,
        reference_date: NaiveDateTime,
    ) -> Result<Vec<SegmentedCustomer>> {
        let span = info_span!("rfm_run", records = records.len(), %reference_date);
        let _guard = span.enter();

        let (cleaned, stats) = clean_with_stats(records);
        let aggregates = aggregate(cleaned, reference_date)?;
        let scored = score(aggregates)?;
        let segmented = self.classifier.classify(scored)?;

        info!(
            kept_records = stats.kept,
            dropped_records = stats.dropped(),
            customers = segmented.len(),
            "scoring run complete"
        );
        Ok(segmented)
    }
}

/// Run the pipeline with the built-in segment table
pub fn run(records: Vec<TransactionRecord>, reference_date: NaiveDateTime) -> Result<Vec<SegmentedCustomer>> {
    ScoringPipeline::new().run(records, reference_date)
}
