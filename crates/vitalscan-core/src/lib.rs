//! # vitalscan-core
//!
//! Core library for VitalScan: fetch PageSpeed Insights reports for a URL,
//! normalize them into rated Core Web Vitals reports, and optionally turn
//! a report pair into an AI-written narrative diagnosis.
//!
//! This library provides:
//! - Normalization of raw measurement payloads into `PerformanceReport`s
//! - Threshold-based Core Web Vitals rating
//! - The two-stage scan orchestrator and its observable state machine
//! - Prompt formatting and a client for the text-generation provider
//! - A restricted markdown renderer for narrative output
//!
//! ## Example
//!
//! ```no_run
//! use vitalscan_core::{Config, NarrativeClient, PsiClient, Scanner};
//!
//! # async fn example() -> Result<(), vitalscan_core::ScanError> {
//! let config = Config::from_env()?;
//! let psi = PsiClient::new(&config.psi_api_key)?;
//! let narrator = NarrativeClient::new(&config.anthropic_api_key)?;
//!
//! let mut scanner = Scanner::new(psi, Some(narrator));
//! let state = scanner.submit("example.com", |_| {}).await;
//! println!("finished in phase: {}", state.phase());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod markdown;
pub mod narrative;
pub mod psi;
pub mod rating;
pub mod report;
pub mod state;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use error::ScanError;
pub use markdown::render_markdown;
pub use narrative::{NarrativeClient, format_reports};
pub use psi::PsiClient;
pub use rating::rate;
pub use report::assemble_report;
pub use state::{
    FetchReports, GenerateNarrative, NarrativeOutcome, ReportPair, ScanState, Scanner,
    normalize_url,
};
pub use types::{
    AuditFinding, FieldCategory, FieldData, FieldMetric, MetricData, MetricSet,
    PerformanceReport, Rating, Strategy,
};
