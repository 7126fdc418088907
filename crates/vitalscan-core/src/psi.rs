//! Measurement-provider client (PageSpeed Insights API)

use std::time::Duration;

use serde_json::Value as JsonValue;

use crate::error::ScanError;
use crate::report::{RawPsiResponse, assemble_report};
use crate::types::{PerformanceReport, Strategy};

/// Production endpoint for the measurement provider
pub const PSI_ENDPOINT: &str = "https://www.googleapis.com/pagespeedonline/v5/runPagespeed";

/// A measurement run can take a minute or more on heavy pages; the
/// provider itself has no documented limit, so we impose one and surface
/// it as a fetch-stage failure.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Client for fetching and normalizing one report per strategy
#[derive(Debug, Clone)]
pub struct PsiClient {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl PsiClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, ScanError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(format!("vitalscan/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ScanError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            endpoint: PSI_ENDPOINT.to_string(),
        })
    }

    /// Point the client at a different endpoint (tests, proxies)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Run one measurement for `url` under the given strategy and
    /// normalize the payload into a report.
    pub async fn fetch_report(
        &self,
        url: &str,
        strategy: Strategy,
    ) -> Result<PerformanceReport, ScanError> {
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[
                ("url", url),
                ("key", self.api_key.as_str()),
                ("strategy", strategy.as_str()),
                ("category", "performance"),
            ])
            .send()
            .await
            .map_err(|e| ScanError::Provider(format!("PSI request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<JsonValue>()
                .await
                .ok()
                .and_then(|body| embedded_error_message(&body))
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("unknown error")
                        .to_string()
                });
            return Err(ScanError::Provider(format!(
                "PSI API error ({}): {message}",
                status.as_u16()
            )));
        }

        let raw: RawPsiResponse = response
            .json()
            .await
            .map_err(|e| ScanError::Provider(format!("PSI response was not valid JSON: {e}")))?;

        assemble_report(url, strategy, raw)
    }
}

/// Pull the provider's own error message out of an error body, if present
fn embedded_error_message(body: &JsonValue) -> Option<String> {
    body.get("error")?
        .get("message")?
        .as_str()
        .map(str::to_string)
}
