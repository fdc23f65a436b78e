// 🏷️ Segment Classifier - Rules as Data
// Ordered (recency, frequency) digit-class rules; first match wins.

use anyhow::{bail, Context as AnyhowContext};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

use crate::error::{Result, ScoringError};
use crate::record::CustomerId;
use crate::scoring::{RfCode, Score, ScoredCustomer};

// ============================================================================
// SEGMENTS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    Hibernating,
    AtRisk,
    CantLoose,
    AboutToSleep,
    NeedAttention,
    LoyalCustomers,
    Promising,
    NewCustomers,
    PotentialLoyalists,
    Champions,
}

impl Segment {
    /// Every segment, in rule table order
    pub const ALL: [Segment; 10] = [
        Segment::Hibernating,
        Segment::AtRisk,
        Segment::CantLoose,
        Segment::AboutToSleep,
        Segment::NeedAttention,
        Segment::LoyalCustomers,
        Segment::Promising,
        Segment::NewCustomers,
        Segment::PotentialLoyalists,
        Segment::Champions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Segment::Hibernating => "hibernating",
            Segment::AtRisk => "at_risk",
            Segment::CantLoose => "cant_loose",
            Segment::AboutToSleep => "about_to_sleep",
            Segment::NeedAttention => "need_attention",
            Segment::LoyalCustomers => "loyal_customers",
            Segment::Promising => "promising",
            Segment::NewCustomers => "new_customers",
            Segment::PotentialLoyalists => "potential_loyalists",
            Segment::Champions => "champions",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Segment {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Segment::ALL
            .into_iter()
            .find(|segment| segment.as_str() == wanted)
            .ok_or_else(|| format!("unknown segment: {s}"))
    }
}

// ============================================================================
// RULE DEFINITION
// ============================================================================

/// Inclusive digit range, `[1-2]` or a single digit like `5`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DigitClass {
    low: u8,
    high: u8,
}

impl DigitClass {
    pub const fn range(low: u8, high: u8) -> Self {
        DigitClass { low, high }
    }

    pub const fn exact(digit: u8) -> Self {
        DigitClass { low: digit, high: digit }
    }

    pub fn contains(&self, score: Score) -> bool {
        (self.low..=self.high).contains(&score.get())
    }
}

impl fmt::Display for DigitClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.low == self.high {
            write!(f, "{}", self.low)
        } else {
            write!(f, "[{}-{}]", self.low, self.high)
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatternError {
    #[error("pattern '{0}' must describe exactly two digit positions")]
    WrongArity(String),
    #[error("pattern '{pattern}': malformed character class")]
    Malformed { pattern: String },
    #[error("pattern '{pattern}': digit {digit} outside 1-5")]
    DigitOutOfRange { pattern: String, digit: char },
}

/// On-disk form of a rule: `{ "pattern": "[1-2]5", "segment": "cant_loose" }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleDefinition {
    pub pattern: String,
    pub segment: Segment,
}

/// One classification rule over the two rf-code digits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RuleDefinition", into = "RuleDefinition")]
pub struct SegmentRule {
    pub recency: DigitClass,
    pub frequency: DigitClass,
    pub segment: Segment,
}

impl SegmentRule {
    pub const fn new(recency: DigitClass, frequency: DigitClass, segment: Segment) -> Self {
        SegmentRule { recency, frequency, segment }
    }

    /// Parse a pattern in the table notation, e.g. `[3-4][4-5]` or `41`
    pub fn parse(pattern: &str, segment: Segment) -> std::result::Result<Self, PatternError> {
        let classes = parse_classes(pattern)?;
        match classes.as_slice() {
            [recency, frequency] => Ok(SegmentRule::new(*recency, *frequency, segment)),
            _ => Err(PatternError::WrongArity(pattern.to_string())),
        }
    }

    pub fn pattern(&self) -> String {
        format!("{}{}", self.recency, self.frequency)
    }

    pub fn matches(&self, code: RfCode) -> bool {
        self.recency.contains(code.recency) && self.frequency.contains(code.frequency)
    }
}

impl TryFrom<RuleDefinition> for SegmentRule {
    type Error = PatternError;

    fn try_from(def: RuleDefinition) -> std::result::Result<Self, Self::Error> {
        SegmentRule::parse(&def.pattern, def.segment)
    }
}

impl From<SegmentRule> for RuleDefinition {
    fn from(rule: SegmentRule) -> Self {
        RuleDefinition {
            pattern: rule.pattern(),
            segment: rule.segment,
        }
    }
}

fn parse_digit(c: char, pattern: &str) -> std::result::Result<u8, PatternError> {
    match c.to_digit(10) {
        Some(d @ 1..=5) => Ok(d as u8),
        _ => Err(PatternError::DigitOutOfRange {
            pattern: pattern.to_string(),
            digit: c,
        }),
    }
}

fn parse_classes(pattern: &str) -> std::result::Result<Vec<DigitClass>, PatternError> {
    let malformed = || PatternError::Malformed {
        pattern: pattern.to_string(),
    };
    let mut classes = Vec::new();
    let mut chars = pattern.trim().chars();

    while let Some(c) = chars.next() {
        if c == '[' {
            let low = parse_digit(chars.next().ok_or_else(malformed)?, pattern)?;
            if chars.next() != Some('-') {
                return Err(malformed());
            }
            let high = parse_digit(chars.next().ok_or_else(malformed)?, pattern)?;
            if chars.next() != Some(']') || low > high {
                return Err(malformed());
            }
            classes.push(DigitClass::range(low, high));
        } else {
            classes.push(DigitClass::exact(parse_digit(c, pattern)?));
        }
    }

    Ok(classes)
}

// ============================================================================
// CLASSIFIED OUTPUT
// ============================================================================

/// Final pipeline row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SegmentedCustomer {
    pub scored: ScoredCustomer,
    pub segment: Segment,
}

impl SegmentedCustomer {
    pub fn customer_id(&self) -> CustomerId {
        self.scored.customer_id()
    }
}

// ============================================================================
// CLASSIFIER
// ============================================================================

/// The built-in rule table
pub const STANDARD_RULES: [SegmentRule; 10] = [
    SegmentRule::new(DigitClass::range(1, 2), DigitClass::range(1, 2), Segment::Hibernating),
    SegmentRule::new(DigitClass::range(1, 2), DigitClass::range(3, 4), Segment::AtRisk),
    SegmentRule::new(DigitClass::range(1, 2), DigitClass::exact(5), Segment::CantLoose),
    SegmentRule::new(DigitClass::exact(3), DigitClass::range(1, 2), Segment::AboutToSleep),
    SegmentRule::new(DigitClass::exact(3), DigitClass::exact(3), Segment::NeedAttention),
    SegmentRule::new(DigitClass::range(3, 4), DigitClass::range(4, 5), Segment::LoyalCustomers),
    SegmentRule::new(DigitClass::exact(4), DigitClass::exact(1), Segment::Promising),
    SegmentRule::new(DigitClass::exact(5), DigitClass::exact(1), Segment::NewCustomers),
    SegmentRule::new(DigitClass::range(4, 5), DigitClass::range(2, 3), Segment::PotentialLoyalists),
    SegmentRule::new(DigitClass::exact(5), DigitClass::range(4, 5), Segment::Champions),
];

#[derive(Debug, Clone)]
pub struct SegmentClassifier {
    rules: Vec<SegmentRule>,
}

impl SegmentClassifier {
    /// Classifier with the built-in rule table
    pub fn standard() -> Self {
        SegmentClassifier::from_rules(STANDARD_RULES.to_vec())
    }

    /// Rules are evaluated in the order given
    pub fn from_rules(rules: Vec<SegmentRule>) -> Self {
        SegmentClassifier { rules }
    }

    /// Load an ordered rule list from a JSON file.
    ///
    /// Rejects rule sets that leave any of the 25 codes unclassified.
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read segment rules file: {:?}", path.as_ref()))?;

        let rules: Vec<SegmentRule> =
            serde_json::from_str(&content).context("Failed to parse segment rules JSON")?;

        let classifier = SegmentClassifier::from_rules(rules);
        let uncovered = classifier.uncovered_codes();
        if !uncovered.is_empty() {
            let codes: Vec<String> = uncovered.iter().map(RfCode::to_string).collect();
            bail!("Segment rules leave codes unclassified: {}", codes.join(", "));
        }

        Ok(classifier)
    }

    pub fn rules(&self) -> &[SegmentRule] {
        &self.rules
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// First matching rule's segment
    pub fn segment_for(&self, code: RfCode) -> Result<Segment> {
        self.rules
            .iter()
            .find(|rule| rule.matches(code))
            .map(|rule| rule.segment)
            .ok_or_else(|| ScoringError::UnclassifiedCode {
                code: code.to_string(),
            })
    }

    /// Codes in 11..=55 that no rule matches
    pub fn uncovered_codes(&self) -> Vec<RfCode> {
        RfCode::all()
            .filter(|&code| !self.rules.iter().any(|rule| rule.matches(code)))
            .collect()
    }

    /// Attach a segment to every scored customer; aborts on the first unmatched code
    pub fn classify(&self, scored: Vec<ScoredCustomer>) -> Result<Vec<SegmentedCustomer>> {
        let segmented = scored
            .into_iter()
            .map(|customer| {
                let segment = self.segment_for(customer.rf_code)?;
                Ok(SegmentedCustomer {
                    scored: customer,
                    segment,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(customers = segmented.len(), "classified customers");
        Ok(segmented)
    }
}

impl Default for SegmentClassifier {
    fn default() -> Self {
        Self::standard()
    }
}

/// Classify with the built-in rule table
pub fn classify(scored: Vec<ScoredCustomer>) -> Result<Vec<SegmentedCustomer>> {
    SegmentClassifier::standard().classify(scored)
}

// ============================================================================
// TESTS
// ============================================================================
