mod analyze;
mod health;
mod status;

use std::{sync::Arc, time::Instant};

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderName, HeaderValue, Method, StatusCode, Uri},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use pricer_core::{AppConfig, DEPLOYMENT_VERSION};
use pricer_vision::{AnalysisError, ExtractionPipeline, ModelHandle, PipelineOptions};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{request_id, RequestId, REQUEST_ID_HEADER};

/// Routes served in every environment, as `(method, path)`.
pub(super) const PUBLIC_ROUTES: &[(&str, &str)] = &[
    ("GET", "/health"),
    ("GET", "/api/test"),
    ("GET", "/api/ai-vision-status"),
    ("POST", "/api/analyze-image"),
];

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub pipeline: Arc<ExtractionPipeline>,
    pub started_at: Instant,
}

impl AppState {
    /// Builds the vision client from `config`. A missing or broken client
    /// does not fail startup; it is reported per request.
    pub fn new(config: AppConfig) -> Self {
        let model = ModelHandle::from_config(&config);
        let pipeline = ExtractionPipeline::new(
            model,
            PipelineOptions {
                verbose: config.verbose(),
            },
        );
        Self::with_pipeline(config, pipeline)
    }

    pub fn with_pipeline(config: AppConfig, pipeline: ExtractionPipeline) -> Self {
        Self {
            config: Arc::new(config),
            pipeline: Arc::new(pipeline),
            started_at: Instant::now(),
        }
    }
}

/// `"Lambda"` or `"Local"`, used in human-readable messages.
pub(super) fn locality(config: &AppConfig) -> &'static str {
    if config.hosted {
        "Lambda"
    } else {
        "Local"
    }
}

/// Failure body shared by every endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    #[serde(skip)]
    status: StatusCode,
    #[serde(skip)]
    retry_after_secs: Option<u64>,
    pub success: bool,
    pub error: String,
    pub reason: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

impl ApiError {
    pub fn new(
        status: StatusCode,
        request_id: impl Into<String>,
        reason: &'static str,
        error: impl Into<String>,
    ) -> Self {
        Self {
            status,
            retry_after_secs: None,
            success: false,
            error: error.into(),
            reason,
            message: None,
            request_id: request_id.into(),
            timestamp: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Maps a pipeline failure onto its HTTP status and caller-facing body.
    pub fn from_analysis(request_id: impl Into<String>, err: &AnalysisError, verbose: bool) -> Self {
        let mut api = Self::new(analysis_status(err), request_id, err.reason(), err.to_string());
        api.message = err.caller_detail(verbose);
        if let AnalysisError::RateLimited { retry_after_secs } = err {
            api.retry_after_secs = *retry_after_secs;
        }
        api
    }
}

fn analysis_status(err: &AnalysisError) -> StatusCode {
    match err {
        AnalysisError::MissingImage | AnalysisError::MissingPrompt => StatusCode::BAD_REQUEST,
        AnalysisError::QuotaExceeded => StatusCode::PAYMENT_REQUIRED,
        AnalysisError::InvalidCredential => StatusCode::UNAUTHORIZED,
        AnalysisError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        AnalysisError::ModelUnavailable
        | AnalysisError::ModelMisconfigured { .. }
        | AnalysisError::ModelDeprecated { .. }
        | AnalysisError::UpstreamFailure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status;
        let retry_after = self.retry_after_secs;
        let mut response = (status, Json(self)).into_response();
        if let Some(secs) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NotFoundBody {
    error: &'static str,
    method: String,
    path: String,
    timestamp: DateTime<Utc>,
    environment: String,
    request_id: String,
    deployment_version: &'static str,
    available_routes: Vec<String>,
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
        .expose_headers([HeaderName::from_static(REQUEST_ID_HEADER)])
}

pub fn build_app(state: AppState) -> Router {
    let max_body_bytes = state.config.max_body_bytes;

    let mut router = Router::new()
        .route("/health", get(health::health))
        .route("/api/test", get(status::api_test))
        .route("/api/ai-vision-status", get(status::ai_vision_status))
        .route("/api/analyze-image", post(analyze::analyze_image));

    if state.config.verbose() {
        router = router.route("/debug/routes", get(health::debug_routes));
    }

    router
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id))
                .layer(TraceLayer::new_for_http()),
        )
        .with_state(state)
}

async fn not_found(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    method: Method,
    uri: Uri,
) -> impl IntoResponse {
    tracing::debug!(%method, path = %uri, "route not found");

    (
        StatusCode::NOT_FOUND,
        Json(NotFoundBody {
            error: "Route not found",
            method: method.to_string(),
            path: uri.to_string(),
            timestamp: Utc::now(),
            environment: state.config.runtime_label(),
            request_id: req_id.0,
            deployment_version: DEPLOYMENT_VERSION,
            available_routes: PUBLIC_ROUTES
                .iter()
                .map(|(method, path)| format!("{method} {path}"))
                .collect(),
        }),
    )
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
