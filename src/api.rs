use crate::analyzer::Analyzer;
use crate::config::Config;
use crate::error::{AnalyzerError, Result};
use crate::ollama::{CompletionModel, OllamaClient};
use crate::types::{AnalysisRequest, AnalysisResult};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json as ResponseJson, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

const HEALTH_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    analyzer: Arc<Analyzer>,
}

impl AppState {
    /// State backed by the Ollama server named in `config`
    pub fn new(config: Config) -> Result<Self> {
        let model = OllamaClient::new(&config)?;
        Ok(Self::with_model(config, Arc::new(model)))
    }

    /// State backed by any completion model
    pub fn with_model(config: Config, model: Arc<dyn CompletionModel>) -> Self {
        Self {
            analyzer: Arc::new(Analyzer::new(Arc::new(config), model)),
        }
    }

    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }
}

/// Error envelope returned for every failed request
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Error kind, e.g. `InvalidInputError`
    pub error: String,
    pub message: String,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub model: String,
    /// Ollama answered and has the configured model installed
    pub model_available: bool,
    pub timestamp: DateTime<Utc>,
}

/// Wraps [`AnalyzerError`] so it can be returned from handlers
#[derive(Debug)]
pub struct ApiError(pub AnalyzerError);

impl From<AnalyzerError> for ApiError {
    fn from(e: AnalyzerError) -> Self {
        Self(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(AnalyzerError::InvalidInput(rejection.body_text()))
    }
}

/// HTTP status for each error kind
pub fn status_for(error: &AnalyzerError) -> StatusCode {
    match error.kind() {
        "InvalidInputError" => StatusCode::BAD_REQUEST,
        "FetchError" | "ModelUnavailableError" => StatusCode::BAD_GATEWAY,
        "ModelTimeoutError" => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.0.kind().to_string(),
            message: self.0.to_string(),
        };
        (status_for(&self.0), ResponseJson(body)).into_response()
    }
}

/// Create the main application with all routes
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/analyze", post(analyze_repository))
        .route("/analyze-repository", post(analyze_repository))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Root endpoint - returns basic service information
async fn index() -> ResponseJson<Value> {
    ResponseJson(json!({
        "service": "repo-analyzer",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Suggests improvements for source repositories using a local LLM",
        "endpoints": {
            "health": "GET /health",
            "analyze": "POST /analyze",
            "analyze_repository": "POST /analyze-repository"
        }
    }))
}

async fn health_check(State(state): State<AppState>) -> ResponseJson<HealthResponse> {
    let model = state.analyzer.model();
    let model_available = tokio::time::timeout(HEALTH_PROBE_TIMEOUT, model.is_available())
        .await
        .unwrap_or(false);

    ResponseJson(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model: model.model_name().to_string(),
        model_available,
        timestamp: Utc::now(),
    })
}

async fn analyze_repository(
    State(state): State<AppState>,
    payload: std::result::Result<Json<AnalysisRequest>, JsonRejection>,
) -> std::result::Result<ResponseJson<AnalysisResult>, ApiError> {
    let Json(request) = payload?;
    let span = info_span!("analyze", request_id = %Uuid::new_v4(), repo_url = %request.repo_url);

    async move {
        info!("Analysis requested");
        match state.analyzer.analyze(&request).await {
            Ok(result) => Ok(ResponseJson(result)),
            Err(e) => {
                if e.is_upstream() {
                    warn!(kind = e.kind(), "Analysis failed upstream: {}", e);
                } else {
                    error!(kind = e.kind(), "Analysis failed: {}", e);
                }
                Err(ApiError(e))
            }
        }
    }
    .instrument(span)
    .await
}
