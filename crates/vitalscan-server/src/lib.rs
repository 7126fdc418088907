//! HTTP API for VitalScan
//!
//! Two JSON endpoints mirror the pipeline's stages: `/api/analyze` runs
//! the all-or-nothing report fetch for both strategies, `/api/recommend`
//! turns a report set into a narrative. A small embedded frontend drives
//! them from the browser.

use axum::{
    Json, Router,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use url::Url;
use vitalscan_core::{
    NarrativeClient, PerformanceReport, PsiClient, ScanError, Strategy, config, normalize_url,
    render_markdown,
};


const FRONTEND_HTML: &str = include_str!("frontend.html");

/// Transport-level wrapper mapping the pipeline taxonomy onto statuses
pub struct AppError(ScanError);

impl From<ScanError> for AppError {
    fn from(err: ScanError) -> Self {
        AppError(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ScanError::Validation(_) => StatusCode::BAD_REQUEST,
            ScanError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ScanError::Provider(_) | ScanError::MalformedPayload(_) => StatusCode::BAD_GATEWAY,
        };
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        } else {
            tracing::warn!(error = %self.0, "request rejected");
        }
        (status, Json(ErrorBody { error: self.0.to_string() })).into_response()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Deserialize)]
struct AnalyzeRequest {
    url: Option<String>,
}

#[derive(Debug, Serialize)]
struct AnalyzeResponse {
    mobile: PerformanceReport,
    desktop: PerformanceReport,
}

#[derive(Debug, Deserialize)]
struct RecommendRequest {
    mobile: Option<PerformanceReport>,
    desktop: Option<PerformanceReport>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecommendResponse {
    analysis: String,
    analysis_html: String,
}

/// Build the application router with CORS and request tracing attached.
pub fn router() -> Router {
    Router::new()
        .route("/", get(frontend))
        .route("/health", get(health))
        .route("/api/analyze", post(analyze))
        .route("/api/recommend", post(recommend))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn frontend() -> Html<&'static str> {
    Html(FRONTEND_HTML)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Fetch both strategies concurrently; either failure fails the pair.
async fn analyze(Json(request): Json<AnalyzeRequest>) -> Result<Json<AnalyzeResponse>, AppError> {
    let url = request
        .url
        .as_deref()
        .and_then(normalize_url)
        .ok_or_else(|| ScanError::Validation("url is required".to_string()))?;
    Url::parse(&url).map_err(|_| ScanError::Validation(format!("invalid URL: {url}")))?;

    let api_key = config::require_env(config::PSI_KEY_VAR)?;
    let client = PsiClient::new(api_key)?;

    tracing::info!(url = %url, "fetching report pair");
    let (mobile, desktop) = tokio::try_join!(
        client.fetch_report(&url, Strategy::Mobile),
        client.fetch_report(&url, Strategy::Desktop),
    )?;

    Ok(Json(AnalyzeResponse { mobile, desktop }))
}

/// Generate a narrative for whichever reports the caller supplies.
async fn recommend(
    Json(request): Json<RecommendRequest>,
) -> Result<Json<RecommendResponse>, AppError> {
    let mut reports = Vec::new();
    if let Some(mobile) = request.mobile {
        reports.push(mobile);
    }
    if let Some(desktop) = request.desktop {
        reports.push(desktop);
    }
    if reports.is_empty() {
        return Err(ScanError::Validation("no reports provided".to_string()).into());
    }

    let api_key = config::require_env(config::ANTHROPIC_KEY_VAR)?;
    let client = NarrativeClient::new(api_key)?;

    tracing::info!(reports = reports.len(), "generating narrative");
    let analysis = client.generate(&reports).await?;
    let analysis_html = render_markdown(&analysis);

    Ok(Json(RecommendResponse { analysis, analysis_html }))
}
