use thiserror::Error;

/// Errors returned by the upstream vision client.
#[derive(Debug, Error)]
pub enum VisionError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The account behind the credential has no remaining quota.
    #[error("quota exceeded: {message}")]
    QuotaExceeded { message: String },

    /// The provider rejected the API key.
    #[error("invalid credential: {message}")]
    InvalidCredential { message: String },

    #[error("rate limited: {message}")]
    RateLimited {
        message: String,
        retry_after_secs: Option<u64>,
    },

    /// The configured model has been retired or renamed by the provider.
    #[error("model deprecated: {message}")]
    ModelDeprecated { message: String },

    /// Any other non-2xx response.
    #[error("upstream API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// A 2xx response that carried no completion choices.
    #[error("upstream reply contained no choices")]
    EmptyReply,

    /// The client could not be built from the supplied settings.
    #[error("invalid client configuration: {0}")]
    Config(String),
}

/// Failure outcomes of one analysis, in the order they can occur.
///
/// Each variant has a stable [`reason`](AnalysisError::reason) code that
/// callers branch on; the `Display` text is for humans and may change.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Image data is required")]
    MissingImage,

    #[error("Prompt is required")]
    MissingPrompt,

    #[error("OpenAI API key not configured. Please add OPENAI_API_KEY to your environment variables.")]
    ModelUnavailable,

    #[error("OpenAI client not initialized properly.")]
    ModelMisconfigured { reason: String },

    #[error("OpenAI API quota exceeded. Please check your billing and add credits to your OpenAI account.")]
    QuotaExceeded,

    #[error("Invalid OpenAI API key. Please check your OPENAI_API_KEY in environment variables.")]
    InvalidCredential,

    #[error("OpenAI API rate limit exceeded. Please wait and try again.")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("AI Vision model has been updated. Please contact support if this error persists.")]
    ModelDeprecated { detail: String },

    #[error("AI Vision analysis failed")]
    UpstreamFailure { detail: String },
}

impl AnalysisError {
    /// Stable machine-readable code for this failure.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MissingImage => "missing_image",
            Self::MissingPrompt => "missing_prompt",
            Self::ModelUnavailable => "model_unavailable",
            Self::ModelMisconfigured { .. } => "model_misconfigured",
            Self::QuotaExceeded => "quota_exceeded",
            Self::InvalidCredential => "invalid_credential",
            Self::RateLimited { .. } => "rate_limited",
            Self::ModelDeprecated { .. } => "model_deprecated",
            Self::UpstreamFailure { .. } => "upstream_failure",
        }
    }

    /// Validation failures never reach the upstream model.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingImage
                | Self::MissingPrompt
                | Self::ModelUnavailable
                | Self::ModelMisconfigured { .. }
        )
    }

    /// Supplementary message for the caller.
    ///
    /// Upstream failure details are replaced by a generic message unless
    /// `verbose` is set.
    #[must_use]
    pub fn caller_detail(&self, verbose: bool) -> Option<String> {
        match self {
            Self::UpstreamFailure { detail } if verbose => Some(detail.clone()),
            Self::UpstreamFailure { .. } => Some("Internal server error".to_string()),
            Self::ModelDeprecated { .. } => Some(
                "The configured vision model was retired; set PRICER_VISION_MODEL to a current model"
                    .to_string(),
            ),
            Self::ModelMisconfigured { reason } if verbose => Some(reason.clone()),
            _ => None,
        }
    }
}

impl From<VisionError> for AnalysisError {
    fn from(err: VisionError) -> Self {
        match err {
            VisionError::QuotaExceeded { .. } => Self::QuotaExceeded,
            VisionError::InvalidCredential { .. } => Self::InvalidCredential,
            VisionError::RateLimited {
                retry_after_secs, ..
            } => Self::RateLimited { retry_after_secs },
            VisionError::ModelDeprecated { message } => Self::ModelDeprecated { detail: message },
            other => Self::UpstreamFailure {
                detail: other.to_string(),
            },
        }
    }
}
