//! Scan orchestration and the client-visible state machine
//!
//! The machine is generic over the two network seams so frontends and
//! tests can drive it without touching the real providers. One submission
//! runs the whole pipeline: fetch both strategies concurrently
//! (all-or-nothing), then attempt the best-effort narrative stage.

use crate::error::ScanError;
use crate::narrative::NarrativeClient;
use crate::psi::PsiClient;
use crate::types::{PerformanceReport, Strategy};

/// Seam for the measurement provider
pub trait FetchReports {
    fn fetch(
        &self,
        url: &str,
        strategy: Strategy,
    ) -> impl Future<Output = Result<PerformanceReport, ScanError>> + Send;
}

impl FetchReports for PsiClient {
    async fn fetch(&self, url: &str, strategy: Strategy) -> Result<PerformanceReport, ScanError> {
        self.fetch_report(url, strategy).await
    }
}

/// Seam for the text-generation provider
pub trait GenerateNarrative {
    fn narrate(
        &self,
        reports: &ReportPair,
    ) -> impl Future<Output = Result<String, ScanError>> + Send;
}

impl GenerateNarrative for NarrativeClient {
    async fn narrate(&self, reports: &ReportPair) -> Result<String, ScanError> {
        self.generate(&[reports.mobile.clone(), reports.desktop.clone()])
            .await
    }
}

/// Both reports of one completed fetch stage; never surfaced partially
#[derive(Debug, Clone)]
pub struct ReportPair {
    pub mobile: PerformanceReport,
    pub desktop: PerformanceReport,
}

/// Outcome of the best-effort narrative stage.
///
/// Kept distinct from the hard-failure path of the fetch stage: a failed
/// narrative collapses to `Unavailable` inside `Done`, never to `Error`.
#[derive(Debug, Clone)]
pub enum NarrativeOutcome {
    Generated(String),
    Unavailable,
}

impl NarrativeOutcome {
    pub fn text(&self) -> Option<&str> {
        match self {
            NarrativeOutcome::Generated(text) => Some(text),
            NarrativeOutcome::Unavailable => None,
        }
    }
}

/// Client-observable pipeline state
#[derive(Debug, Clone)]
pub enum ScanState {
    Idle,
    Fetching {
        url: String,
    },
    Analyzing {
        reports: ReportPair,
    },
    Done {
        reports: ReportPair,
        narrative: NarrativeOutcome,
    },
    Error {
        message: String,
    },
}

impl ScanState {
    /// Short machine-readable label, useful for logging and progress UIs
    pub fn phase(&self) -> &'static str {
        match self {
            ScanState::Idle => "idle",
            ScanState::Fetching { .. } => "fetching",
            ScanState::Analyzing { .. } => "analyzing",
            ScanState::Done { .. } => "done",
            ScanState::Error { .. } => "error",
        }
    }
}

/// Prepare raw user input for submission.
///
/// Blank input yields `None` (the submission is a no-op); scheme-less
/// input is assumed to be https.
pub fn normalize_url(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Some(trimmed.to_string())
    } else {
        Some(format!("https://{trimmed}"))
    }
}

/// Drives the two-stage pipeline and owns the current state.
///
/// `submit` takes `&mut self`, so a second run cannot start while one is
/// in flight; resubmission after `Done` or `Error` re-enters `Fetching`.
pub struct Scanner<F, N> {
    fetcher: F,
    narrator: Option<N>,
    state: ScanState,
}

impl<F: FetchReports, N: GenerateNarrative> Scanner<F, N> {
    /// A scanner with no narrator still runs the full fetch stage and
    /// lands in `Done` with the narrative marked unavailable.
    pub fn new(fetcher: F, narrator: Option<N>) -> Self {
        Self {
            fetcher,
            narrator,
            state: ScanState::Idle,
        }
    }

    pub fn state(&self) -> &ScanState {
        &self.state
    }

    /// Run the pipeline for `raw_url`, reporting every transition to
    /// `observe`. Blank input leaves the current state untouched.
    pub async fn submit(
        &mut self,
        raw_url: &str,
        mut observe: impl FnMut(&ScanState),
    ) -> &ScanState {
        let Some(url) = normalize_url(raw_url) else {
            return &self.state;
        };

        self.transition(ScanState::Fetching { url: url.clone() }, &mut observe);

        // Both strategies fetch concurrently; the first failure aborts the
        // pair and the sibling result is discarded.
        let fetched = tokio::try_join!(
            self.fetcher.fetch(&url, Strategy::Mobile),
            self.fetcher.fetch(&url, Strategy::Desktop),
        );

        let reports = match fetched {
            Ok((mobile, desktop)) => ReportPair { mobile, desktop },
            Err(err) => {
                self.transition(
                    ScanState::Error {
                        message: err.to_string(),
                    },
                    &mut observe,
                );
                return &self.state;
            }
        };

        self.transition(
            ScanState::Analyzing {
                reports: reports.clone(),
            },
            &mut observe,
        );

        let narrative = match &self.narrator {
            Some(narrator) => match narrator.narrate(&reports).await {
                Ok(text) => NarrativeOutcome::Generated(text),
                Err(_) => NarrativeOutcome::Unavailable,
            },
            None => NarrativeOutcome::Unavailable,
        };

        self.transition(ScanState::Done { reports, narrative }, &mut observe);
        &self.state
    }

    fn transition(&mut self, next: ScanState, observe: &mut impl FnMut(&ScanState)) {
        self.state = next;
        observe(&self.state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::assemble_report;
    use serde_json::json;

    fn report_with_lcp(strategy: Strategy, lcp_ms: f64) -> PerformanceReport {
        let raw = serde_json::from_value(json!({
            "lighthouseResult": {
                "fetchTime": "2025-03-01T12:00:00.000Z",
                "audits": {
                    "largest-contentful-paint": {
                        "score": 0.5, "numericValue": lcp_ms,
                        "title": "LCP", "description": ""
                    }
                },
                "categories": { "performance": { "score": 0.5 } }
            }
        }))
        .unwrap();
        assemble_report("https://slow-site.test", strategy, raw).unwrap()
    }

    /// Stub provider: per-strategy results, recorded request URLs
    struct StubFetcher {
        mobile: Result<PerformanceReport, String>,
        desktop: Result<PerformanceReport, String>,
        seen: std::sync::Mutex<Vec<String>>,
    }

    impl StubFetcher {
        fn ok(mobile_lcp: f64, desktop_lcp: f64) -> Self {
            Self {
                mobile: Ok(report_with_lcp(Strategy::Mobile, mobile_lcp)),
                desktop: Ok(report_with_lcp(Strategy::Desktop, desktop_lcp)),
                seen: std::sync::Mutex::new(Vec::new()),
            }
        }

        fn desktop_fails(message: &str) -> Self {
            Self {
                mobile: Ok(report_with_lcp(Strategy::Mobile, 2000.0)),
                desktop: Err(message.to_string()),
                seen: std::sync::Mutex::new(Vec::new()),
            }
        }
    }

    impl FetchReports for StubFetcher {
        async fn fetch(
            &self,
            url: &str,
            strategy: Strategy,
        ) -> Result<PerformanceReport, ScanError> {
            self.seen.lock().unwrap().push(url.to_string());
            let result = match strategy {
                Strategy::Mobile => &self.mobile,
                Strategy::Desktop => &self.desktop,
            };
            result
                .clone()
                .map_err(|message| ScanError::Provider(message.clone()))
        }
    }

    struct StubNarrator {
        result: Result<String, String>,
    }

    impl GenerateNarrative for StubNarrator {
        async fn narrate(&self, _reports: &ReportPair) -> Result<String, ScanError> {
            self.result
                .clone()
                .map_err(|message| ScanError::Provider(message.clone()))
        }
    }

    #[test]
    fn test_normalize_url() {
        assert_eq!(normalize_url(""), None);
        assert_eq!(normalize_url("   \t"), None);
        assert_eq!(
            normalize_url("example.com").as_deref(),
            Some("https://example.com")
        );
        assert_eq!(
            normalize_url("  example.com  ").as_deref(),
            Some("https://example.com")
        );
        assert_eq!(
            normalize_url("http://plain.test").as_deref(),
            Some("http://plain.test")
        );
        assert_eq!(
            normalize_url("https://secure.test").as_deref(),
            Some("https://secure.test")
        );
    }

    #[tokio::test]
    async fn test_blank_submission_is_a_noop() {
        let mut scanner = Scanner::new(
            StubFetcher::ok(1000.0, 1000.0),
            Some(StubNarrator {
                result: Ok("text".to_string()),
            }),
        );

        let mut transitions = 0;
        scanner.submit("   ", |_| transitions += 1).await;

        assert!(matches!(scanner.state(), ScanState::Idle));
        assert_eq!(transitions, 0);
    }

    #[tokio::test]
    async fn test_submission_normalizes_url_before_fetching() {
        let fetcher = StubFetcher::ok(1000.0, 1000.0);
        let mut scanner = Scanner::new(
            fetcher,
            Some(StubNarrator {
                result: Ok("text".to_string()),
            }),
        );

        let mut phases = Vec::new();
        scanner
            .submit("example.com", |state| phases.push(state.phase()))
            .await;

        assert_eq!(phases, vec!["fetching", "analyzing", "done"]);
        // Both requests saw the normalized URL.
        let seen = scanner.fetcher.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen.iter().all(|u| u == "https://example.com"));
    }

    #[tokio::test]
    async fn test_fetch_failure_is_all_or_nothing() {
        let mut scanner = Scanner::new(
            StubFetcher::desktop_fails("PSI API error (500): backend down"),
            Some(StubNarrator {
                result: Ok("text".to_string()),
            }),
        );

        let mut phases = Vec::new();
        scanner
            .submit("https://example.com", |state| phases.push(state.phase()))
            .await;

        // The mobile report succeeded, but no pair is ever exposed.
        assert_eq!(phases, vec!["fetching", "error"]);
        match scanner.state() {
            ScanState::Error { message } => {
                assert_eq!(message, "PSI API error (500): backend down");
            }
            other => panic!("expected error state, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_narrative_failure_still_completes() {
        let mut scanner = Scanner::new(
            StubFetcher::ok(5200.0, 2100.0),
            Some(StubNarrator {
                result: Err("narrative API error (529): overloaded".to_string()),
            }),
        );

        scanner.submit("slow-site.test", |_| {}).await;

        match scanner.state() {
            ScanState::Done { reports, narrative } => {
                assert!(narrative.text().is_none());
                assert_eq!(reports.mobile.metrics.lcp.value, 5200.0);
            }
            other => panic!("expected done state, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_end_to_end_ratings_per_strategy() {
        let mut scanner = Scanner::new(
            StubFetcher::ok(5200.0, 2100.0),
            Some(StubNarrator {
                result: Ok("# Verdict".to_string()),
            }),
        );

        scanner.submit("slow-site.test", |_| {}).await;

        match scanner.state() {
            ScanState::Done { reports, narrative } => {
                assert_eq!(reports.mobile.metrics.lcp.short_name, "LCP");
                assert_eq!(reports.mobile.metrics.lcp.value, 5200.0);
                assert_eq!(reports.mobile.metrics.lcp.rating, crate::types::Rating::Poor);
                assert_eq!(reports.desktop.metrics.lcp.rating, crate::types::Rating::Good);
                assert_eq!(narrative.text(), Some("# Verdict"));
            }
            other => panic!("expected done state, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_narrator_marks_narrative_unavailable() {
        let mut scanner: Scanner<_, StubNarrator> =
            Scanner::new(StubFetcher::ok(1000.0, 1000.0), None);

        let mut phases = Vec::new();
        scanner
            .submit("example.com", |state| phases.push(state.phase()))
            .await;

        assert_eq!(phases, vec!["fetching", "analyzing", "done"]);
        match scanner.state() {
            ScanState::Done { narrative, .. } => assert!(narrative.text().is_none()),
            other => panic!("expected done state, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_resubmission_after_error_reenters_fetching() {
        let mut scanner = Scanner::new(
            StubFetcher::desktop_fails("boom"),
            Some(StubNarrator {
                result: Ok("text".to_string()),
            }),
        );

        scanner.submit("example.com", |_| {}).await;
        assert!(matches!(scanner.state(), ScanState::Error { .. }));

        let mut phases = Vec::new();
        scanner
            .submit("example.com", |state| phases.push(state.phase()))
            .await;
        assert_eq!(phases.first(), Some(&"fetching"));
    }
}
