//! Narrative generation: prompt formatting and the text-generation client
//!
//! The formatter applies the one hard structural rule of this stage: a
//! report renders its field-data section or its lab-data section, never
//! both. Prompt wording beyond that is a replaceable template.

use std::fmt::Write as _;
use std::time::Duration;

use serde::Deserialize;
use serde_json::{Value as JsonValue, json};

use crate::error::ScanError;
use crate::types::PerformanceReport;

/// Production endpoint for the text-generation provider
pub const ANTHROPIC_ENDPOINT: &str = "https://api.anthropic.com/v1/messages";

const ANTHROPIC_VERSION: &str = "2023-06-01";
const MODEL: &str = "claude-sonnet-4-20250514";
const MAX_TOKENS: u32 = 1500;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Returned when the provider answers without any text content block
pub const NARRATIVE_FALLBACK: &str = "Analysis could not be generated.";

const SYSTEM_PROMPT: &str = "\
You are a senior web performance engineer specializing in Core Web Vitals.
You read normalized PageSpeed Insights reports and produce clear, actionable diagnoses.

Structure your analysis as:
1. Executive Summary (2-3 sentences) with an overall verdict
2. Core Web Vitals Diagnosis covering LCP, INP and CLS with actual values and verdicts
3. Top Issues: the 3 most critical problems, with specifics
4. Recommendations: concrete fixes ordered by impact (high/medium/low)

Rules:
- Each report contains either Field Data (real users) OR Lab Data (simulated run); analyze only the kind provided
- Field Data is authoritative when present
- Cite actual values; stay technical and specific
- No timelines, phases or implementation schedules
- Keep the whole response under 1000 words
- Use plain markdown headers (#, ##, ###), bold, and lists only

Threshold reference:
- LCP: good <= 2.5s, poor > 4s
- INP: good <= 200ms, poor > 500ms
- CLS: good <= 0.10, poor > 0.25
- FCP: good <= 1.8s, poor > 3s
- TBT: good <= 200ms, poor > 600ms
- SI: good <= 3.4s, poor > 5.8s
- TTFB: good <= 800ms, poor > 1800ms";

/// Render one textual block per report, in report order.
///
/// Field data, when available, fully replaces the lab metrics for that
/// report. Opportunities and diagnostics always follow, with an explicit
/// "None identified" marker when empty.
pub fn format_reports(reports: &[PerformanceReport]) -> String {
    reports
        .iter()
        .map(format_report)
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn format_report(report: &PerformanceReport) -> String {
    let has_field_data = report.has_field_data();
    let mut block = String::new();

    let strategy = report.strategy.as_str().to_uppercase();
    let _ = writeln!(block, "=== {strategy} ANALYSIS ===");
    let _ = writeln!(block, "URL: {}", report.url);
    let source = if has_field_data {
        "Real Users (CrUX)"
    } else {
        "Lab Test (Lighthouse)"
    };
    let _ = writeln!(block, "Data Source: {source}");
    let _ = writeln!(block, "Tested at: {}", report.fetch_time);
    block.push('\n');

    if has_field_data {
        let field_data = report.field_data.as_ref().unwrap();
        block.push_str("FIELD DATA (Real User Data - 28 days, 75th percentile):\n");
        if let Some(lcp) = &field_data.lcp {
            let _ = writeln!(
                block,
                "  LCP: {:.2}s - Rating: {}",
                lcp.percentile / 1000.0,
                lcp.category
            );
        }
        if let Some(inp) = &field_data.inp {
            let _ = writeln!(block, "  INP: {}ms - Rating: {}", inp.percentile, inp.category);
        }
        if let Some(cls) = &field_data.cls {
            let _ = writeln!(
                block,
                "  CLS: {:.3} - Rating: {}",
                cls.percentile / 100.0,
                cls.category
            );
        }
        if let Some(fcp) = &field_data.fcp {
            let _ = writeln!(
                block,
                "  FCP: {:.2}s - Rating: {}",
                fcp.percentile / 1000.0,
                fcp.category
            );
        }
    } else {
        block.push_str("LAB DATA (Simulated Test - no field data available for this site):\n");
        for metric in report.metrics.iter() {
            let _ = writeln!(
                block,
                "  {}: {} - Score: {:.0}/100 - Rating: {}",
                metric.short_name,
                metric.display_value,
                metric.score * 100.0,
                metric.rating.as_str().to_uppercase()
            );
        }
    }

    block.push_str("\nOPPORTUNITIES (things to fix):\n");
    if report.opportunities.is_empty() {
        block.push_str("  None identified\n");
    } else {
        for opportunity in &report.opportunities {
            match &opportunity.savings {
                Some(savings) => {
                    let _ = writeln!(
                        block,
                        "  - {} (potential savings: {savings})",
                        opportunity.title
                    );
                }
                None => {
                    let _ = writeln!(block, "  - {}", opportunity.title);
                }
            }
        }
    }

    block.push_str("\nDIAGNOSTICS (things to investigate):\n");
    if report.diagnostics.is_empty() {
        block.push_str("  None identified\n");
    } else {
        for diagnostic in &report.diagnostics {
            match &diagnostic.display_value {
                Some(display) => {
                    let _ = writeln!(block, "  - {} ({display})", diagnostic.title);
                }
                None => {
                    let _ = writeln!(block, "  - {}", diagnostic.title);
                }
            }
        }
    }

    block
}

fn user_prompt(reports: &[PerformanceReport]) -> String {
    format!(
        "Analyze the following PageSpeed Insights results:\n\n{}\n\n\
         Diagnose the issues, explain why they matter, and recommend specific \
         fixes ordered by impact. Keep it concise and actionable. No timelines \
         or implementation schedules.",
        format_reports(reports)
    )
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

/// Single-turn client for the text-generation provider
#[derive(Debug, Clone)]
pub struct NarrativeClient {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl NarrativeClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, ScanError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(format!("vitalscan/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ScanError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            endpoint: ANTHROPIC_ENDPOINT.to_string(),
        })
    }

    /// Point the client at a different endpoint (tests, proxies)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Generate one narrative over the given reports.
    pub async fn generate(&self, reports: &[PerformanceReport]) -> Result<String, ScanError> {
        if reports.is_empty() {
            return Err(ScanError::Validation("no reports to analyze".to_string()));
        }

        let body = json!({
            "model": MODEL,
            "max_tokens": MAX_TOKENS,
            "system": SYSTEM_PROMPT,
            "messages": [
                { "role": "user", "content": user_prompt(reports) }
            ],
        });

        let response = self
            .http
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| ScanError::Provider(format!("narrative request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<JsonValue>()
                .await
                .ok()
                .and_then(|body| {
                    body.get("error")?
                        .get("message")?
                        .as_str()
                        .map(str::to_string)
                })
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("unknown error")
                        .to_string()
                });
            return Err(ScanError::Provider(format!(
                "narrative API error ({}): {message}",
                status.as_u16()
            )));
        }

        let message: MessageResponse = response.json().await.map_err(|e| {
            ScanError::Provider(format!("narrative response was not valid JSON: {e}"))
        })?;

        Ok(extract_text(&message))
    }
}

/// First text block wins; anything else yields the fixed fallback
fn extract_text(message: &MessageResponse) -> String {
    message
        .content
        .iter()
        .find(|block| block.kind == "text")
        .and_then(|block| block.text.clone())
        .unwrap_or_else(|| NARRATIVE_FALLBACK.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::assemble_report;
    use crate::types::Strategy;
    use serde_json::json;

    fn lab_report() -> PerformanceReport {
        let raw = serde_json::from_value(json!({
            "id": "https://example.com/",
            "lighthouseResult": {
                "fetchTime": "2025-03-01T12:00:00.000Z",
                "audits": {
                    "largest-contentful-paint": {
                        "score": 0.12, "numericValue": 5200.0, "displayValue": "5.2 s",
                        "title": "LCP", "description": ""
                    },
                    "unused-javascript": {
                        "score": 0.3, "displayValue": "Potential savings of 240 KiB",
                        "title": "Reduce unused JavaScript", "description": ""
                    },
                    "dom-size": {
                        "score": 0.4, "displayValue": "3,412 elements",
                        "title": "Avoid an excessive DOM size", "description": ""
                    }
                },
                "categories": { "performance": { "score": 0.35 } }
            }
        }))
        .unwrap();
        assemble_report("https://example.com", Strategy::Mobile, raw).unwrap()
    }

    fn field_report() -> PerformanceReport {
        let raw = serde_json::from_value(json!({
            "id": "https://example.com/",
            "lighthouseResult": {
                "fetchTime": "2025-03-01T12:00:00.000Z",
                "audits": {}
            },
            "loadingExperience": {
                "metrics": {
                    "LARGEST_CONTENTFUL_PAINT_MS": { "percentile": 2340, "category": "FAST" },
                    "INTERACTION_TO_NEXT_PAINT": { "percentile": 250, "category": "AVERAGE" },
                    "CUMULATIVE_LAYOUT_SHIFT_SCORE": { "percentile": 7, "category": "FAST" },
                    "FIRST_CONTENTFUL_PAINT_MS": { "percentile": 1790, "category": "FAST" }
                }
            }
        }))
        .unwrap();
        assemble_report("https://example.com", Strategy::Desktop, raw).unwrap()
    }

    #[test]
    fn test_lab_section_lists_all_seven_metrics() {
        let text = format_reports(&[lab_report()]);

        assert!(text.contains("=== MOBILE ANALYSIS ==="));
        assert!(text.contains("Data Source: Lab Test (Lighthouse)"));
        assert!(text.contains("LAB DATA"));
        for short in ["LCP:", "INP:", "CLS:", "FCP:", "TBT:", "SI:", "TTFB:"] {
            assert!(text.contains(short), "missing lab line for {short}");
        }
        assert!(text.contains("5.2 s - Score: 12/100 - Rating: POOR"));
        assert!(!text.contains("FIELD DATA"));
    }

    #[test]
    fn test_field_section_excludes_lab_lines() {
        let text = format_reports(&[field_report()]);

        assert!(text.contains("=== DESKTOP ANALYSIS ==="));
        assert!(text.contains("Data Source: Real Users (CrUX)"));
        assert!(text.contains("FIELD DATA"));
        assert!(text.contains("LCP: 2.34s - Rating: FAST"));
        assert!(text.contains("INP: 250ms - Rating: AVERAGE"));
        assert!(text.contains("CLS: 0.070 - Rating: FAST"));
        assert!(text.contains("FCP: 1.79s - Rating: FAST"));
        // No lab section, and none of its telltale lines.
        assert!(!text.contains("LAB DATA"));
        assert!(!text.contains("TBT:"));
        assert!(!text.contains("Score:"));
    }

    #[test]
    fn test_empty_field_data_falls_back_to_lab() {
        let mut report = field_report();
        report.field_data = Some(crate::types::FieldData::default());

        let text = format_reports(&[report]);
        assert!(text.contains("LAB DATA"));
        assert!(!text.contains("FIELD DATA"));
    }

    #[test]
    fn test_lists_always_follow_either_section() {
        let lab = format_reports(&[lab_report()]);
        assert!(lab.contains("OPPORTUNITIES (things to fix):"));
        assert!(lab.contains("- Reduce unused JavaScript (potential savings: Potential savings of 240 KiB)"));
        assert!(lab.contains("DIAGNOSTICS (things to investigate):"));
        assert!(lab.contains("- Avoid an excessive DOM size (3,412 elements)"));

        let field = format_reports(&[field_report()]);
        assert!(field.contains("OPPORTUNITIES (things to fix):\n  None identified"));
        assert!(field.contains("DIAGNOSTICS (things to investigate):\n  None identified"));
    }

    #[test]
    fn test_reports_render_in_order() {
        let text = format_reports(&[lab_report(), field_report()]);
        let mobile = text.find("=== MOBILE ANALYSIS ===").unwrap();
        let desktop = text.find("=== DESKTOP ANALYSIS ===").unwrap();
        assert!(mobile < desktop);
    }

    #[test]
    fn test_extract_text_takes_first_text_block() {
        let message = MessageResponse {
            content: vec![
                ContentBlock { kind: "thinking".to_string(), text: None },
                ContentBlock { kind: "text".to_string(), text: Some("# Analysis".to_string()) },
                ContentBlock { kind: "text".to_string(), text: Some("ignored".to_string()) },
            ],
        };
        assert_eq!(extract_text(&message), "# Analysis");
    }

    #[test]
    fn test_extract_text_falls_back_without_text_block() {
        let message = MessageResponse { content: vec![] };
        assert_eq!(extract_text(&message), NARRATIVE_FALLBACK);
    }

    #[tokio::test]
    async fn test_generate_rejects_empty_report_set() {
        let client = NarrativeClient::new("test-key").unwrap();
        let err = client.generate(&[]).await.unwrap_err();
        assert!(matches!(err, ScanError::Validation(_)));
    }
}
