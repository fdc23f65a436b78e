// 🎯 Quantile Scorer - raw RFM metrics → ordinal 1-5 scores
//
// Recency and monetary are cut at the empirical quintiles of their values.
// Frequency has too many ties for that (most customers ordered once or twice),
// so it is ranked first-seen-wins and the ranks are split into 5 groups.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use tracing::debug;

use crate::aggregate::CustomerAggregate;
use crate::error::{Metric, Result, ScoringError};
use crate::record::CustomerId;

/// Number of bins per metric (fixed)
pub const BINS: usize = 5;

// ============================================================================
// SCORE TYPES
// ============================================================================

/// Ordinal score, always within 1..=5
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Score(u8);

impl Score {
    pub const MIN: Score = Score(1);
    pub const MAX: Score = Score(5);

    pub fn new(value: u8) -> Option<Self> {
        if (1..=BINS as u8).contains(&value) {
            Some(Score(value))
        } else {
            None
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Score for bin `index` counted from the lowest raw values
    fn ascending(index: usize) -> Self {
        Score(index as u8 + 1)
    }

    /// Score for bin `index` when low raw values are the good ones
    fn descending(index: usize) -> Self {
        Score((BINS - index) as u8)
    }
}

impl TryFrom<u8> for Score {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        Score::new(value).ok_or_else(|| format!("score must be within 1..=5, got {value}"))
    }
}

impl From<Score> for u8 {
    fn from(score: Score) -> u8 {
        score.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Recency digit followed by frequency digit, e.g. "55"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RfCode {
    pub recency: Score,
    pub frequency: Score,
}

impl RfCode {
    pub fn new(recency: Score, frequency: Score) -> Self {
        RfCode { recency, frequency }
    }

    /// All 25 possible codes, "11" through "55"
    pub fn all() -> impl Iterator<Item = RfCode> {
        (1..=BINS as u8).flat_map(|r| {
            (1..=BINS as u8).map(move |f| RfCode::new(Score(r), Score(f)))
        })
    }
}

impl fmt::Display for RfCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.recency, self.frequency)
    }
}

impl Serialize for RfCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Customer aggregate plus its three scores
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoredCustomer {
    pub aggregate: CustomerAggregate,
    pub recency_score: Score,
    pub frequency_score: Score,
    /// Not used for segmentation, kept for reporting
    pub monetary_score: Score,
    pub rf_code: RfCode,
}

impl ScoredCustomer {
    pub fn customer_id(&self) -> CustomerId {
        self.aggregate.customer_id
    }
}

// ============================================================================
// SCORER
// ============================================================================

/// Score every aggregate on all three metrics.
///
/// Each column is binned independently over the whole population, so all
/// aggregates must be present before calling this. Fails without producing
/// any scores if a column cannot be split into 5 groups.
pub fn score(aggregates: Vec<CustomerAggregate>) -> Result<Vec<ScoredCustomer>> {
    if aggregates.is_empty() {
        return Err(ScoringError::NoCustomers);
    }

    let recency: Vec<Decimal> = aggregates.iter().map(|a| Decimal::from(a.recency)).collect();
    let frequency: Vec<u64> = aggregates.iter().map(|a| a.frequency).collect();
    let monetary: Vec<Decimal> = aggregates.iter().map(|a| a.monetary).collect();

    let recency_bins = value_bins(&recency, Metric::Recency)?;
    let frequency_bins = rank_bins(&frequency, Metric::Frequency)?;
    let monetary_bins = value_bins(&monetary, Metric::Monetary)?;

    let scored: Vec<ScoredCustomer> = aggregates
        .into_iter()
        .enumerate()
        .map(|(i, aggregate)| {
            let recency_score = Score::descending(recency_bins[i]);
            let frequency_score = Score::ascending(frequency_bins[i]);
            ScoredCustomer {
                aggregate,
                recency_score,
                frequency_score,
                monetary_score: Score::ascending(monetary_bins[i]),
                rf_code: RfCode::new(recency_score, frequency_score),
            }
        })
        .collect();

    debug!(customers = scored.len(), "scored customers");
    Ok(scored)
}

// ============================================================================
// BINNING
// ============================================================================

/// Bin index (0 = lowest values) from the column's empirical quintile edges.
///
/// Bins are right-closed, the first one also includes the minimum. Equal
/// values always share a bin.
pub fn value_bins(values: &[Decimal], metric: Metric) -> Result<Vec<usize>> {
    let mut sorted = values.to_vec();
    sorted.sort();

    let mut distinct = sorted.clone();
    distinct.dedup();
    if distinct.len() < BINS {
        return Err(ScoringError::InsufficientDistinctValues {
            metric,
            distinct: distinct.len(),
            required: BINS,
        });
    }

    let edges = quantile_edges(&sorted);
    if edges.windows(2).any(|pair| pair[0] >= pair[1]) {
        let rendered: Vec<String> = edges.iter().map(|e| e.normalize().to_string()).collect();
        return Err(ScoringError::DegenerateQuantiles {
            metric,
            edges: rendered.join(", "),
        });
    }

    Ok(values
        .iter()
        .map(|value| {
            edges[1..]
                .iter()
                .position(|upper| value <= upper)
                .unwrap_or(BINS - 1)
        })
        .collect())
}

/// Bin index (0 = lowest values) from first-seen-wins ranks.
///
/// Ties are ranked in iteration order, so every position gets a distinct
/// rank. Ranks are split into 5 contiguous groups of `n / 5`, the first
/// `n % 5` groups taking one extra.
pub fn rank_bins(values: &[u64], metric: Metric) -> Result<Vec<usize>> {
    let n = values.len();
    if n < BINS {
        return Err(ScoringError::InsufficientDistinctValues {
            metric,
            distinct: n,
            required: BINS,
        });
    }

    // Stable sort keeps original order among equal values
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by_key(|&i| values[i]);

    let base = n / BINS;
    let extra = n % BINS;
    let mut bins = vec![0; n];
    let mut rank = 0;

    for bin in 0..BINS {
        let size = base + usize::from(bin < extra);
        for &position in &order[rank..rank + size] {
            bins[position] = bin;
        }
        rank += size;
    }

    Ok(bins)
}

/// The 0/20/40/60/80/100 % quantiles of an ascending slice, with linear
/// interpolation between neighbouring order statistics.
fn quantile_edges(sorted: &[Decimal]) -> [Decimal; BINS + 1] {
    let last = sorted.len() - 1;
    let mut edges = [Decimal::ZERO; BINS + 1];

    for (k, edge) in edges.iter_mut().enumerate() {
        // position = k/5 * (n-1), kept as an exact fraction
        let scaled = k * last;
        let lower = scaled / BINS;
        let remainder = scaled % BINS;

        *edge = if remainder == 0 {
            sorted[lower]
        } else {
            let fraction = Decimal::from(remainder as u64) / Decimal::from(BINS as u64);
            sorted[lower] + (sorted[lower + 1] - sorted[lower]) * fraction
        };
    }

    edges
}

// ============================================================================
// TESTS
// ============================================================================
