//! Report types shared across the scan pipeline
//!
//! Wire names are camelCase so that server responses, the embedded
//! frontend, and reports posted back to the recommend endpoint all agree
//! on one shape.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Device class a measurement run targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Mobile,
    Desktop,
}

impl Strategy {
    /// Query-parameter value expected by the measurement provider
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Mobile => "mobile",
            Strategy::Desktop => "desktop",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Three-level verdict for a lab metric value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rating {
    #[serde(rename = "good")]
    Good,
    #[serde(rename = "needs-improvement")]
    NeedsImprovement,
    #[serde(rename = "poor")]
    Poor,
}

impl Rating {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::Good => "good",
            Rating::NeedsImprovement => "needs-improvement",
            Rating::Poor => "poor",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Categorical bucket assigned by the field-data provider (not recomputed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldCategory {
    Fast,
    Average,
    Slow,
}

impl FieldCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldCategory::Fast => "FAST",
            FieldCategory::Average => "AVERAGE",
            FieldCategory::Slow => "SLOW",
        }
    }
}

impl fmt::Display for FieldCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One normalized lab metric
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricData {
    /// Full human label, e.g. "Largest Contentful Paint"
    pub name: String,

    /// Short code, e.g. "LCP"
    pub short_name: String,

    /// Raw numeric value in the metric's native unit
    pub value: f64,

    /// Human-readable value supplied by the provider ("N/A" when absent)
    pub display_value: String,

    /// Provider's own 0..=1 score, never derived from the rating
    pub score: f64,

    /// Threshold-based verdict computed from `value`
    pub rating: Rating,

    /// One-line explanation of what the metric measures
    pub description: String,
}

/// The seven tracked lab metrics, always all present
///
/// A missing source audit produces a sentinel record, never an absent
/// field; the struct shape encodes that invariant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricSet {
    pub lcp: MetricData,
    pub inp: MetricData,
    pub cls: MetricData,
    pub fcp: MetricData,
    pub tbt: MetricData,
    pub si: MetricData,
    pub ttfb: MetricData,
}

impl MetricSet {
    /// Iterate the metrics in their fixed display order
    pub fn iter(&self) -> impl Iterator<Item = &MetricData> {
        [
            &self.lcp, &self.inp, &self.cls, &self.fcp, &self.tbt, &self.si, &self.ttfb,
        ]
        .into_iter()
    }
}

/// One probability-mass bucket of a field-metric distribution (display only)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionBucket {
    pub min: f64,
    pub max: Option<f64>,
    pub proportion: f64,
}

/// Real-user percentile for one signal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldMetric {
    /// 75th percentile in the signal's native unit (ms for time-based
    /// signals, a x100-scaled integer for CLS)
    pub percentile: f64,

    /// Bucket assigned by the provider
    pub category: FieldCategory,

    /// Bucket ranges summing to roughly 1.0
    pub distributions: Vec<DistributionBucket>,
}

/// Real-user data; every signal is independently optional
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lcp: Option<FieldMetric>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inp: Option<FieldMetric>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cls: Option<FieldMetric>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fcp: Option<FieldMetric>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fid: Option<FieldMetric>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttfb: Option<FieldMetric>,
}

impl FieldData {
    /// Whether any signal carries real-user data; drives the
    /// field-over-lab precedence downstream
    pub fn has_any(&self) -> bool {
        self.lcp.is_some()
            || self.inp.is_some()
            || self.cls.is_some()
            || self.fcp.is_some()
            || self.fid.is_some()
            || self.ttfb.is_some()
    }
}

/// One surfaced audit, used for both diagnostics and opportunities
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditFinding {
    pub id: String,
    pub title: String,
    pub description: String,

    /// None means the audit is not applicable, which is still worth
    /// surfacing
    pub score: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_value: Option<String>,

    /// Estimated saving, populated for opportunities only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub savings: Option<String>,
}

/// Normalized result of one measurement run, immutable once assembled
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReport {
    pub strategy: Strategy,

    /// Canonical URL as resolved by the provider (may differ from input)
    pub url: String,

    pub fetch_time: String,

    /// Performance category score scaled to 0..=100
    pub overall_score: f64,

    pub metrics: MetricSet,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_data: Option<FieldData>,

    /// Catalog order, not severity order
    pub diagnostics: Vec<AuditFinding>,

    pub opportunities: Vec<AuditFinding>,
}

impl PerformanceReport {
    /// Field data counts as available when at least one signal is present
    pub fn has_field_data(&self) -> bool {
        self.field_data.as_ref().is_some_and(FieldData::has_any)
    }
}
