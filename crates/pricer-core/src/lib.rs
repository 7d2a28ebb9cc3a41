//! Shared domain types and configuration for the inventory pricing service.

pub mod app_config;
pub mod config;
pub mod items;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use items::{
    AnalysisRequest, AnalysisResult, ExtractedItem, DEFAULT_REPLACEMENT_COST, UNKNOWN_FILE_NAME,
};

use thiserror::Error;

/// Version string reported by the status, test and health endpoints.
pub const SERVICE_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "-unified");

/// Build marker echoed in every response body so deployments can be told apart.
pub const DEPLOYMENT_VERSION: &str = concat!("pricer-", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
