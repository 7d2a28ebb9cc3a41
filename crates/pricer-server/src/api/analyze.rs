use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Extension, Json,
};
use pricer_core::{AnalysisRequest, AnalysisResult, DEPLOYMENT_VERSION};
use serde::Serialize;

use super::{ApiError, AppState};
use crate::middleware::RequestId;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct AnalyzeResponse {
    #[serde(flatten)]
    result: AnalysisResult,
    environment: String,
    deployment_version: &'static str,
}

pub(super) async fn analyze_image(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    payload: Result<Json<AnalysisRequest>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| reject_body(&req_id, &rejection))?;
    let verbose = state.config.verbose();

    if verbose {
        tracing::debug!(
            request_id = %req_id.0,
            has_image = request.image.is_some(),
            has_prompt = request.prompt.is_some(),
            image_len = request.image.as_deref().map_or(0, str::len),
            prompt_len = request.prompt.as_deref().map_or(0, str::len),
            file_name = ?request.file_name,
            "analyze-image request"
        );
    }

    let result = state.pipeline.analyze(request).await.map_err(|e| {
        if e.is_validation() {
            tracing::warn!(request_id = %req_id.0, reason = e.reason(), "analyze-image rejected");
        } else {
            tracing::error!(request_id = %req_id.0, reason = e.reason(), error = %e, "analyze-image failed");
        }
        ApiError::from_analysis(req_id.0.clone(), &e, verbose)
    })?;

    Ok(Json(AnalyzeResponse {
        result,
        environment: state.config.runtime_label(),
        deployment_version: DEPLOYMENT_VERSION,
    }))
}

fn reject_body(req_id: &RequestId, rejection: &JsonRejection) -> ApiError {
    tracing::warn!(request_id = %req_id.0, error = %rejection.body_text(), "unreadable analyze-image body");

    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            req_id.0.clone(),
            "payload_too_large",
            "Request body is too large",
        )
    } else {
        ApiError::new(
            StatusCode::BAD_REQUEST,
            req_id.0.clone(),
            "invalid_body",
            "Request body must be a JSON object",
        )
        .with_message(rejection.body_text())
    }
}
