use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use pricer_core::{DEPLOYMENT_VERSION, SERVICE_VERSION};
use serde::Serialize;

use super::{AppState, PUBLIC_ROUTES};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct HealthData {
    status: &'static str,
    timestamp: DateTime<Utc>,
    environment: HealthEnvironment,
    services: HealthServices,
    version: &'static str,
    deployment_version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<SystemInfo>,
}

/// Which integrations have credentials. Values are presence flags only.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthEnvironment {
    mode: &'static str,
    node_env: String,
    serpapi: bool,
    openai: bool,
    google: bool,
    #[serde(rename = "googleCSE")]
    google_cse: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthServices {
    ai_vision: bool,
    vision_model: String,
    csv_processing: bool,
    serpapi_integration: bool,
}

#[derive(Debug, Serialize)]
struct SystemInfo {
    /// Seconds since the server started.
    uptime: f64,
    pid: u32,
}

pub(super) async fn health(State(state): State<AppState>) -> Json<HealthData> {
    let config = &state.config;

    let system = config.verbose().then(|| SystemInfo {
        uptime: state.started_at.elapsed().as_secs_f64(),
        pid: std::process::id(),
    });

    Json(HealthData {
        status: "OK",
        timestamp: Utc::now(),
        environment: HealthEnvironment {
            mode: if config.hosted {
                "AWS Lambda"
            } else {
                "Local Development"
            },
            node_env: config.env.to_string(),
            serpapi: config.serpapi_configured,
            openai: config.has_openai_key(),
            google: config.google_api_configured,
            google_cse: config.google_search_engine_configured,
        },
        services: HealthServices {
            ai_vision: state.pipeline.model().is_ready(),
            vision_model: config.vision_model.clone(),
            csv_processing: config.serpapi_configured,
            serpapi_integration: config.serpapi_configured,
        },
        version: SERVICE_VERSION,
        deployment_version: DEPLOYMENT_VERSION,
        system,
    })
}

#[derive(Debug, Serialize)]
struct RouteInfo {
    path: &'static str,
    methods: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OpenAiStatus {
    configured: bool,
    client_ready: bool,
    vision_model: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct DebugRoutes {
    total_routes: usize,
    routes: Vec<RouteInfo>,
    direct_api_routes: Vec<String>,
    openai_status: OpenAiStatus,
    environment: &'static str,
    deployment_version: &'static str,
}

/// Route listing. Only mounted for verbose (local, non-production) servers.
pub(super) async fn debug_routes(State(state): State<AppState>) -> Json<DebugRoutes> {
    let routes: Vec<RouteInfo> = PUBLIC_ROUTES
        .iter()
        .chain(std::iter::once(&("GET", "/debug/routes")))
        .map(|&(method, path)| RouteInfo {
            path,
            methods: vec![method],
        })
        .collect();

    let direct_api_routes = PUBLIC_ROUTES
        .iter()
        .filter(|(_, path)| path.starts_with("/api/"))
        .map(|(method, path)| format!("{method} {path}"))
        .collect();

    Json(DebugRoutes {
        total_routes: routes.len(),
        routes,
        direct_api_routes,
        openai_status: OpenAiStatus {
            configured: state.config.has_openai_key(),
            client_ready: state.pipeline.model().is_ready(),
            vision_model: state.config.vision_model.clone(),
        },
        environment: "local-development",
        deployment_version: DEPLOYMENT_VERSION,
    })
}
