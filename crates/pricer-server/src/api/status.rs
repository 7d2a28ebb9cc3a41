use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use pricer_core::{DEPLOYMENT_VERSION, SERVICE_VERSION};
use pricer_vision::ModelHandle;
use serde::Serialize;

use super::{locality, AppState};

const SUPPORTED_FORMATS: [&str; 4] = ["JPEG", "PNG", "GIF", "WebP"];
const MAX_FILE_SIZE: &str = "10MB";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct VisionStatus {
    ai_vision_enabled: bool,
    openai_client_ready: bool,
    status: &'static str,
    message: String,
    timestamp: DateTime<Utc>,
    supported_formats: [&'static str; 4],
    max_file_size: &'static str,
    vision_model: String,
    environment: String,
    deployment_version: &'static str,
}

pub(super) async fn ai_vision_status(State(state): State<AppState>) -> Json<VisionStatus> {
    let config = &state.config;
    let (status, message) = match state.pipeline.model() {
        ModelHandle::Ready(_) => (
            "ready",
            format!("AI Vision is ready for use ({})", locality(config)),
        ),
        ModelHandle::NotConfigured => (
            "missing_api_key",
            "OpenAI API key not configured. Add OPENAI_API_KEY to your environment variables."
                .to_string(),
        ),
        ModelHandle::Failed { .. } => (
            "client_error",
            "OpenAI client failed to initialize. Check the server logs.".to_string(),
        ),
    };

    Json(VisionStatus {
        ai_vision_enabled: config.has_openai_key(),
        openai_client_ready: state.pipeline.model().is_ready(),
        status,
        message,
        timestamp: Utc::now(),
        supported_formats: SUPPORTED_FORMATS,
        max_file_size: MAX_FILE_SIZE,
        vision_model: config.vision_model.clone(),
        environment: config.runtime_label(),
        deployment_version: DEPLOYMENT_VERSION,
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ApiTest {
    message: String,
    timestamp: DateTime<Utc>,
    environment: String,
    openai_configured: bool,
    openai_client_ready: bool,
    serpapi_configured: bool,
    vision_model: String,
    system_status: &'static str,
    version: &'static str,
    platform: &'static str,
    deployment_version: &'static str,
}

pub(super) async fn api_test(State(state): State<AppState>) -> Json<ApiTest> {
    let config = &state.config;

    Json(ApiTest {
        message: format!("{} API routes are working!", locality(config)),
        timestamp: Utc::now(),
        environment: config.runtime_label(),
        openai_configured: config.has_openai_key(),
        openai_client_ready: state.pipeline.model().is_ready(),
        serpapi_configured: config.serpapi_configured,
        vision_model: config.vision_model.clone(),
        system_status: "operational",
        version: SERVICE_VERSION,
        platform: if config.hosted {
            "AWS Lambda"
        } else {
            "Axum Server"
        },
        deployment_version: DEPLOYMENT_VERSION,
    })
}
