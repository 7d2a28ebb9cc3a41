//! Pre-flight checks run before any upstream call.

use std::sync::Arc;

use pricer_core::{AnalysisRequest, AppConfig};

use crate::client::{OpenAiVisionClient, VisionModel};
use crate::error::AnalysisError;

/// Availability of the vision model, resolved once at startup.
#[derive(Clone)]
pub enum ModelHandle {
    Ready(Arc<dyn VisionModel>),
    /// No credential was configured.
    NotConfigured,
    /// A credential exists but the client could not be built.
    Failed { reason: String },
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready(model) => f.debug_tuple("Ready").field(&model.model_name()).finish(),
            Self::NotConfigured => f.write_str("NotConfigured"),
            Self::Failed { reason } => f.debug_struct("Failed").field("reason", reason).finish(),
        }
    }
}

impl ModelHandle {
    /// Builds the OpenAI client from configuration. Never fails: problems
    /// are recorded in the handle and reported per request.
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        let Some(api_key) = config.openai_api_key.as_deref() else {
            tracing::warn!("OPENAI_API_KEY not set; image analysis is disabled");
            return Self::NotConfigured;
        };

        match OpenAiVisionClient::with_base_url(
            api_key,
            &config.vision_model,
            config.upstream_timeout_secs,
            &config.openai_base_url,
        ) {
            Ok(client) => {
                tracing::info!(model = %config.vision_model, "vision client initialized");
                Self::Ready(Arc::new(client))
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to initialize vision client");
                Self::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// Name of the ready model, if any.
    #[must_use]
    pub fn model_name(&self) -> Option<&str> {
        match self {
            Self::Ready(model) => Some(model.model_name()),
            _ => None,
        }
    }
}

/// A request whose required inputs are present and non-blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    pub image: String,
    pub prompt: String,
    /// Echoed back verbatim; `None` when the caller sent none.
    pub file_name: Option<String>,
    /// Label used in synthesized descriptions.
    pub file_label: String,
}

/// Checks image, then prompt, then model availability. The first failure
/// wins, so a request missing both inputs reports the missing image.
///
/// # Errors
///
/// Returns [`AnalysisError::MissingImage`], [`AnalysisError::MissingPrompt`],
/// [`AnalysisError::ModelUnavailable`] or [`AnalysisError::ModelMisconfigured`].
pub fn validate_request(
    request: AnalysisRequest,
    model: &ModelHandle,
) -> Result<(ValidatedRequest, Arc<dyn VisionModel>), AnalysisError> {
    let file_label = request.file_label().to_string();
    let AnalysisRequest {
        image,
        prompt,
        file_name,
    } = request;

    let image = non_blank(image).ok_or(AnalysisError::MissingImage)?;
    let prompt = non_blank(prompt).ok_or(AnalysisError::MissingPrompt)?;

    let model = match model {
        ModelHandle::Ready(model) => Arc::clone(model),
        ModelHandle::NotConfigured => return Err(AnalysisError::ModelUnavailable),
        ModelHandle::Failed { reason } => {
            return Err(AnalysisError::ModelMisconfigured {
                reason: reason.clone(),
            })
        }
    };

    Ok((
        ValidatedRequest {
            image,
            prompt,
            file_name,
            file_label,
        },
        model,
    ))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
