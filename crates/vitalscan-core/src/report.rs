//! Normalization of raw measurement payloads into `PerformanceReport`s
//!
//! The provider payload is deeply nested and almost every field is
//! optional in practice. It is parsed into a narrow intermediate tree with
//! every field explicitly `Option`, and all missing-to-sentinel (or
//! missing-to-absent) decisions happen here, in one place.

use serde::Deserialize;
use std::collections::HashMap;

use crate::error::ScanError;
use crate::rating::rate;
use crate::types::{
    AuditFinding, DistributionBucket, FieldCategory, FieldData, FieldMetric, MetricData,
    MetricSet, PerformanceReport, Rating, Strategy,
};

/// Diagnostics surfaced in this catalog order
const DIAGNOSTIC_AUDITS: &[&str] = &[
    "dom-size",
    "mainthread-work-breakdown",
    "bootup-time",
    "font-display",
    "third-party-summary",
    "long-tasks",
    "layout-shifts",
    "non-composited-animations",
    "unsized-images",
    "viewport",
];

/// Opportunities surfaced in this catalog order
const OPPORTUNITY_AUDITS: &[&str] = &[
    "render-blocking-resources",
    "unused-css-rules",
    "unused-javascript",
    "modern-image-formats",
    "offscreen-images",
    "unminified-css",
    "unminified-javascript",
    "efficient-animated-content",
    "duplicated-javascript",
    "legacy-javascript",
    "uses-optimized-images",
    "uses-responsive-images",
    "uses-text-compression",
    "server-response-time",
    "redirects",
    "preload-lcp-element",
    "uses-rel-preconnect",
];

/// Top-level provider payload; unknown fields are ignored
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPsiResponse {
    /// Canonical URL as resolved by the provider
    pub id: Option<String>,
    pub lighthouse_result: Option<RawLighthouseResult>,
    pub loading_experience: Option<RawLoadingExperience>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLighthouseResult {
    pub fetch_time: Option<String>,
    pub audits: Option<HashMap<String, RawAudit>>,
    pub categories: Option<RawCategories>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAudit {
    pub id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub score: Option<f64>,
    pub numeric_value: Option<f64>,
    pub display_value: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawCategories {
    pub performance: Option<RawCategoryScore>,
}

#[derive(Debug, Deserialize)]
pub struct RawCategoryScore {
    pub score: Option<f64>,
}

/// Real-user-experience section, keyed by the provider's metric names
#[derive(Debug, Deserialize)]
pub struct RawLoadingExperience {
    pub metrics: Option<HashMap<String, RawFieldMetric>>,
}

#[derive(Debug, Deserialize)]
pub struct RawFieldMetric {
    pub percentile: Option<f64>,
    pub category: Option<FieldCategory>,
    pub distributions: Option<Vec<DistributionBucket>>,
}

/// Build one immutable report from a raw provider payload.
///
/// Individually missing audits degrade to sentinel metric records; a
/// payload with no audits section at all is malformed and rejected.
pub fn assemble_report(
    input_url: &str,
    strategy: Strategy,
    raw: RawPsiResponse,
) -> Result<PerformanceReport, ScanError> {
    let lighthouse = raw.lighthouse_result;
    let audits = lighthouse
        .as_ref()
        .and_then(|lh| lh.audits.as_ref())
        .ok_or_else(|| {
            ScanError::MalformedPayload(format!(
                "{strategy} response has no audits section"
            ))
        })?;

    let metrics = extract_metrics(audits);
    let field_data = raw
        .loading_experience
        .and_then(|le| le.metrics)
        .map(extract_field_data);
    let diagnostics = extract_findings(audits, DIAGNOSTIC_AUDITS, false);
    let opportunities = extract_findings(audits, OPPORTUNITY_AUDITS, true);

    let overall_score = lighthouse
        .as_ref()
        .and_then(|lh| lh.categories.as_ref())
        .and_then(|c| c.performance.as_ref())
        .and_then(|p| p.score)
        .unwrap_or(0.0)
        * 100.0;

    let fetch_time = lighthouse
        .as_ref()
        .and_then(|lh| lh.fetch_time.clone())
        .unwrap_or_else(|| chrono::Utc::now().to_rfc3339());

    Ok(PerformanceReport {
        strategy,
        url: raw.id.unwrap_or_else(|| input_url.to_string()),
        fetch_time,
        overall_score,
        metrics,
        field_data,
        diagnostics,
        opportunities,
    })
}

fn extract_metrics(audits: &HashMap<String, RawAudit>) -> MetricSet {
    let mut cls = extract_metric(
        audits,
        "cumulative-layout-shift",
        "CLS",
        "Cumulative Layout Shift",
        "cls",
        "Visual stability: how much the layout shifts during loading",
    );

    // CLS has no natural "ms" rendering; when the provider sends no display
    // string, fall back to the numeric value at three decimals.
    if let Some(audit) = audits.get("cumulative-layout-shift") {
        cls.display_value = audit
            .display_value
            .clone()
            .or_else(|| audit.numeric_value.map(|v| format!("{v:.3}")))
            .unwrap_or_else(|| "N/A".to_string());
    }

    MetricSet {
        lcp: extract_metric(
            audits,
            "largest-contentful-paint",
            "LCP",
            "Largest Contentful Paint",
            "lcp",
            "Time until the largest content element is visible",
        ),
        inp: extract_metric(
            audits,
            "interaction-to-next-paint",
            "INP",
            "Interaction to Next Paint",
            "inp",
            "Responsiveness to user interactions",
        ),
        cls,
        fcp: extract_metric(
            audits,
            "first-contentful-paint",
            "FCP",
            "First Contentful Paint",
            "fcp",
            "Time until the first content is painted on screen",
        ),
        tbt: extract_metric(
            audits,
            "total-blocking-time",
            "TBT",
            "Total Blocking Time",
            "tbt",
            "Total time the main thread was blocked",
        ),
        si: extract_metric(
            audits,
            "speed-index",
            "SI",
            "Speed Index",
            "si",
            "How quickly content is visually displayed during load",
        ),
        ttfb: extract_metric(
            audits,
            "server-response-time",
            "TTFB",
            "Time to First Byte",
            "ttfb",
            "Server response time for the main document",
        ),
    }
}

/// Build one metric record, substituting the sentinel when the audit is
/// absent entirely. The audit's own score is carried as-is; the rating is
/// always recomputed from the numeric value.
fn extract_metric(
    audits: &HashMap<String, RawAudit>,
    audit_id: &str,
    short_name: &str,
    name: &str,
    signal: &str,
    description: &str,
) -> MetricData {
    let Some(audit) = audits.get(audit_id) else {
        return MetricData {
            name: name.to_string(),
            short_name: short_name.to_string(),
            value: 0.0,
            display_value: "N/A".to_string(),
            score: 0.0,
            rating: Rating::Poor,
            description: description.to_string(),
        };
    };

    let value = audit.numeric_value.unwrap_or(0.0);

    MetricData {
        name: name.to_string(),
        short_name: short_name.to_string(),
        value,
        display_value: audit
            .display_value
            .clone()
            .unwrap_or_else(|| format!("{} ms", value.round() as i64)),
        score: audit.score.unwrap_or(0.0),
        rating: rate(signal, value),
        description: description.to_string(),
    }
}

fn extract_field_data(metrics: HashMap<String, RawFieldMetric>) -> FieldData {
    let field = |key: &str| metrics.get(key).map(to_field_metric);

    FieldData {
        lcp: field("LARGEST_CONTENTFUL_PAINT_MS"),
        inp: field("INTERACTION_TO_NEXT_PAINT"),
        cls: field("CUMULATIVE_LAYOUT_SHIFT_SCORE"),
        fcp: field("FIRST_CONTENTFUL_PAINT_MS"),
        fid: field("FIRST_INPUT_DELAY_MS"),
        ttfb: field("EXPERIMENTAL_TIME_TO_FIRST_BYTE"),
    }
}

fn to_field_metric(raw: &RawFieldMetric) -> FieldMetric {
    FieldMetric {
        percentile: raw.percentile.unwrap_or(0.0),
        category: raw.category.unwrap_or(FieldCategory::Average),
        distributions: raw.distributions.clone().unwrap_or_default(),
    }
}

/// Project a fixed catalog of audit ids into findings, in catalog order.
///
/// Absent audits are skipped; perfect scores (exactly 1) are skipped; null
/// scores mean "not applicable" and are kept.
fn extract_findings(
    audits: &HashMap<String, RawAudit>,
    catalog: &[&str],
    with_savings: bool,
) -> Vec<AuditFinding> {
    catalog
        .iter()
        .filter_map(|id| audits.get(*id).map(|audit| (*id, audit)))
        .filter(|(_, audit)| audit.score != Some(1.0))
        .map(|(catalog_id, audit)| AuditFinding {
            id: audit.id.clone().unwrap_or_else(|| catalog_id.to_string()),
            title: audit.title.clone().unwrap_or_default(),
            description: audit.description.clone().unwrap_or_default(),
            score: audit.score,
            display_value: audit.display_value.clone(),
            savings: if with_savings {
                audit.display_value.clone()
            } else {
                None
            },
        })
        .collect()
}
