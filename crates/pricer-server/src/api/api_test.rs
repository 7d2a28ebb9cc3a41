use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::Request;
use pricer_core::Environment;
use pricer_vision::{VisionError, VisionModel, VisionRequest};
use tower::ServiceExt;

use super::*;

const ACME_REPLY: &str =
    "```json\n[{\"brandOrManufacturer\":\"Acme\",\"costToReplace\":\"12.50\"}]\n```";

struct FakeModel {
    reply: fn() -> Result<String, VisionError>,
    calls: AtomicUsize,
}

#[async_trait]
impl VisionModel for FakeModel {
    async fn describe_image(&self, _request: VisionRequest<'_>) -> Result<String, VisionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.reply)()
    }

    fn model_name(&self) -> &str {
        "fake-vision"
    }
}

fn test_config(env: Environment, hosted: bool) -> AppConfig {
    AppConfig {
        env,
        hosted,
        bind_addr: "127.0.0.1:0".parse().expect("addr"),
        log_level: "info".to_string(),
        openai_api_key: Some("sk-test".to_string()),
        openai_base_url: "https://api.openai.com/v1".to_string(),
        vision_model: "gpt-4o".to_string(),
        upstream_timeout_secs: 5,
        max_body_bytes: 64 * 1024,
        serpapi_configured: true,
        google_api_configured: false,
        google_search_engine_configured: false,
    }
}

fn app_with(
    config: AppConfig,
    reply: fn() -> Result<String, VisionError>,
) -> (Router, Arc<FakeModel>) {
    let model = Arc::new(FakeModel {
        reply,
        calls: AtomicUsize::new(0),
    });
    let handle: Arc<dyn VisionModel> = model.clone();
    let pipeline = ExtractionPipeline::new(
        ModelHandle::Ready(handle),
        PipelineOptions {
            verbose: config.verbose(),
        },
    );
    (build_app(AppState::with_pipeline(config, pipeline)), model)
}

fn acme() -> Result<String, VisionError> {
    Ok(ACME_REPLY.to_string())
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

fn analyze_request(body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/analyze-image")
        .header("content-type", "application/json")
        .header("x-request-id", "req-analyze")
        .body(Body::from(body.to_string()))
        .expect("request")
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    serde_json::from_slice(&body).expect("json parse")
}

fn valid_body() -> serde_json::Value {
    serde_json::json!({
        "image": "data:image/jpeg;base64,/9j/4AAQ",
        "prompt": "List every item with a replacement cost",
        "fileName": "kitchen.jpg"
    })
}

// -------------------------------------------------------------------------
// ApiError
// -------------------------------------------------------------------------

#[test]
fn analysis_errors_map_to_http_statuses() {
    let cases = [
        (AnalysisError::MissingImage, StatusCode::BAD_REQUEST),
        (AnalysisError::MissingPrompt, StatusCode::BAD_REQUEST),
        (
            AnalysisError::ModelUnavailable,
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
        (AnalysisError::QuotaExceeded, StatusCode::PAYMENT_REQUIRED),
        (AnalysisError::InvalidCredential, StatusCode::UNAUTHORIZED),
        (
            AnalysisError::RateLimited {
                retry_after_secs: None,
            },
            StatusCode::TOO_MANY_REQUESTS,
        ),
        (
            AnalysisError::ModelDeprecated {
                detail: "retired".into(),
            },
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
    ];

    for (err, expected) in cases {
        let response = ApiError::from_analysis("req-1", &err, false).into_response();
        assert_eq!(response.status(), expected, "{}", err.reason());
    }
}

#[test]
fn rate_limited_error_sets_retry_after_header() {
    let err = AnalysisError::RateLimited {
        retry_after_secs: Some(30),
    };
    let response = ApiError::from_analysis("req-1", &err, false).into_response();
    assert_eq!(
        response
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok()),
        Some("30")
    );
}

// -------------------------------------------------------------------------
// POST /api/analyze-image
// -------------------------------------------------------------------------

#[tokio::test]
async fn analyze_image_returns_normalized_items() {
    let (app, model) = app_with(test_config(Environment::Production, false), acme);

    let response = app
        .oneshot(analyze_request(&valid_body()))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["extractedCount"], 1);
    assert_eq!(json["fileName"], "kitchen.jpg");
    assert_eq!(json["items"][0]["brandOrManufacturer"], "Acme");
    assert_eq!(json["items"][0]["brand"], "Acme");
    assert_eq!(json["items"][0]["modelNumber"], "");
    assert_eq!(json["items"][0]["costToReplace"], 12.5);
    assert_eq!(json["items"][0]["totalCost"], 12.5);
    assert_eq!(json["environment"], "production");
    assert_eq!(json["deploymentVersion"], DEPLOYMENT_VERSION);
    assert!(json["processingTime"].is_string());
    assert!(json.get("originalResponse").is_none());
    assert_eq!(model.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn analyze_image_echoes_raw_reply_when_verbose() {
    let (app, _) = app_with(test_config(Environment::Development, false), acme);

    let response = app
        .oneshot(analyze_request(&valid_body()))
        .await
        .expect("response");

    let json = json_body(response).await;
    assert_eq!(json["originalResponse"], ACME_REPLY);
}

#[tokio::test]
async fn hosted_development_is_not_verbose() {
    let (app, _) = app_with(test_config(Environment::Development, true), acme);

    let response = app
        .oneshot(analyze_request(&valid_body()))
        .await
        .expect("response");

    let json = json_body(response).await;
    assert!(json.get("originalResponse").is_none());
    assert_eq!(json["environment"], "AWS Lambda");
}

#[tokio::test]
async fn analyze_image_missing_prompt_is_bad_request_without_upstream_call() {
    let (app, model) = app_with(test_config(Environment::Production, false), acme);

    let response = app
        .oneshot(analyze_request(&serde_json::json!({
            "image": "data:image/jpeg;base64,/9j/4AAQ"
        })))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["reason"], "missing_prompt");
    assert_eq!(json["error"], "Prompt is required");
    assert_eq!(json["requestId"], "req-analyze");
    assert_eq!(model.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn analyze_image_rejects_malformed_json() {
    let (app, model) = app_with(test_config(Environment::Production, false), acme);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/analyze-image")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["reason"], "invalid_body");
    assert_eq!(model.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn analyze_image_rejects_oversized_body() {
    let (app, model) = app_with(test_config(Environment::Production, false), acme);
    let huge = serde_json::json!({
        "image": "A".repeat(128 * 1024),
        "prompt": "List"
    });

    let response = app
        .oneshot(analyze_request(&huge))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(model.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn analyze_image_quota_error_is_payment_required() {
    let (app, _) = app_with(test_config(Environment::Production, false), || {
        Err(VisionError::QuotaExceeded {
            message: "You exceeded your current quota".into(),
        })
    });

    let response = app
        .oneshot(analyze_request(&valid_body()))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
    let json = json_body(response).await;
    assert_eq!(json["reason"], "quota_exceeded");
    assert!(json.get("items").is_none());
}

#[tokio::test]
async fn analyze_image_upstream_failure_is_redacted_in_production() {
    let (app, _) = app_with(test_config(Environment::Production, false), || {
        Err(VisionError::Api {
            status: 500,
            message: "secret upstream detail".into(),
        })
    });

    let response = app
        .oneshot(analyze_request(&valid_body()))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = json_body(response).await;
    assert_eq!(json["reason"], "upstream_failure");
    assert_eq!(json["error"], "AI Vision analysis failed");
    assert_eq!(json["message"], "Internal server error");
}

#[tokio::test]
async fn analyze_image_without_api_key_reports_model_unavailable() {
    let mut config = test_config(Environment::Production, false);
    config.openai_api_key = None;
    let app = build_app(AppState::new(config));

    let response = app
        .oneshot(analyze_request(&valid_body()))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = json_body(response).await;
    assert_eq!(json["reason"], "model_unavailable");
}

// -------------------------------------------------------------------------
// Status, test and health endpoints
// -------------------------------------------------------------------------

#[tokio::test]
async fn ai_vision_status_reports_ready_client() {
    let (app, _) = app_with(test_config(Environment::Production, false), acme);

    let response = app
        .oneshot(get_request("/api/ai-vision-status"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "ready");
    assert_eq!(json["aiVisionEnabled"], true);
    assert_eq!(json["openaiClientReady"], true);
    assert_eq!(json["maxFileSize"], "10MB");
    assert_eq!(
        json["supportedFormats"],
        serde_json::json!(["JPEG", "PNG", "GIF", "WebP"])
    );
    assert_eq!(json["visionModel"], "gpt-4o");
}

#[tokio::test]
async fn ai_vision_status_reports_missing_key() {
    let mut config = test_config(Environment::Production, false);
    config.openai_api_key = None;
    let app = build_app(AppState::new(config));

    let response = app
        .oneshot(get_request("/api/ai-vision-status"))
        .await
        .expect("response");

    let json = json_body(response).await;
    assert_eq!(json["status"], "missing_api_key");
    assert_eq!(json["aiVisionEnabled"], false);
    assert_eq!(json["openaiClientReady"], false);
}

#[tokio::test]
async fn ai_vision_status_reports_client_error() {
    let mut config = test_config(Environment::Production, false);
    config.openai_base_url = "not a url".to_string();
    let app = build_app(AppState::new(config));

    let response = app
        .oneshot(get_request("/api/ai-vision-status"))
        .await
        .expect("response");

    let json = json_body(response).await;
    assert_eq!(json["status"], "client_error");
    assert_eq!(json["aiVisionEnabled"], true);
    assert_eq!(json["openaiClientReady"], false);
}

#[tokio::test]
async fn api_test_reports_configuration_summary() {
    let (app, _) = app_with(test_config(Environment::Test, false), acme);

    let response = app
        .oneshot(get_request("/api/test"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["message"], "Local API routes are working!");
    assert_eq!(json["systemStatus"], "operational");
    assert_eq!(json["serpapiConfigured"], true);
    assert_eq!(json["version"], pricer_core::SERVICE_VERSION);
}

#[tokio::test]
async fn health_includes_system_block_only_when_verbose() {
    let (dev, _) = app_with(test_config(Environment::Development, false), acme);
    let json = json_body(dev.oneshot(get_request("/health")).await.expect("response")).await;
    assert_eq!(json["status"], "OK");
    assert_eq!(json["environment"]["mode"], "Local Development");
    assert_eq!(json["environment"]["openai"], true);
    assert_eq!(json["environment"]["googleCSE"], false);
    assert_eq!(json["services"]["aiVision"], true);
    assert!(json["system"]["pid"].is_u64());

    let (prod, _) = app_with(test_config(Environment::Production, false), acme);
    let json = json_body(prod.oneshot(get_request("/health")).await.expect("response")).await;
    assert!(json.get("system").is_none());
}

#[tokio::test]
async fn debug_routes_mounted_only_when_verbose() {
    let (dev, _) = app_with(test_config(Environment::Development, false), acme);
    let response = dev
        .oneshot(get_request("/debug/routes"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["totalRoutes"], 5);
    assert_eq!(json["openaiStatus"]["clientReady"], true);

    let (prod, _) = app_with(test_config(Environment::Production, false), acme);
    let response = prod
        .oneshot(get_request("/debug/routes"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_route_returns_json_404() {
    let (app, _) = app_with(test_config(Environment::Production, false), acme);

    let response = app
        .oneshot(get_request("/api/nope?x=1"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    let json = json_body(response).await;
    assert_eq!(json["error"], "Route not found");
    assert_eq!(json["method"], "GET");
    assert_eq!(json["path"], "/api/nope?x=1");
    let routes = json["availableRoutes"].as_array().expect("routes array");
    assert!(routes.iter().any(|r| r == "POST /api/analyze-image"));
}
