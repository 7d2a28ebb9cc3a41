//! HTTP client for an OpenAI-compatible vision model.
//!
//! Sends one chat completion per image with the prompt and image as a single
//! multi-modal user message. Non-2xx responses are classified into the
//! distinguished [`VisionError`] kinds; nothing is retried, since every call
//! is billed.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};

use crate::error::VisionError;
use crate::types::{
    ApiErrorEnvelope, ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ContentPart,
    ImageUrl,
};

/// Output ceiling for one reply. Large enough for a few dozen items.
pub const MAX_OUTPUT_TOKENS: u32 = 1000;

/// Low temperature keeps replies close to the requested JSON shape.
pub const SAMPLING_TEMPERATURE: f64 = 0.1;

/// Image fidelity requested from the provider. Small labels and model
/// numbers are unreadable at lower settings.
const IMAGE_DETAIL: &str = "high";

/// Upper bound on how much of a non-JSON error body is kept in messages.
const ERROR_BODY_PREVIEW_CHARS: usize = 300;

/// Parameters for one vision call.
#[derive(Debug, Clone, Copy)]
pub struct VisionRequest<'a> {
    pub prompt: &'a str,
    /// `data:` URI or remote URL.
    pub image: &'a str,
}

impl<'a> VisionRequest<'a> {
    #[must_use]
    pub fn new(prompt: &'a str, image: &'a str) -> Self {
        Self { prompt, image }
    }
}

/// A vision-capable model that turns an image plus instructions into text.
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Issues exactly one upstream call and returns the raw reply text.
    ///
    /// # Errors
    ///
    /// Returns a [`VisionError`] describing why the provider did not answer.
    async fn describe_image(&self, request: VisionRequest<'_>) -> Result<String, VisionError>;

    /// Model identifier reported by status endpoints.
    fn model_name(&self) -> &str;
}

/// Client for the chat completions endpoint of an OpenAI-compatible API.
///
/// The base URL is configurable so proxies and mock servers can stand in
/// for the public API.
pub struct OpenAiVisionClient {
    client: Client,
    api_key: String,
    model: String,
    endpoint: Url,
}

impl std::fmt::Debug for OpenAiVisionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiVisionClient")
            .field("api_key", &"[redacted]")
            .field("model", &self.model)
            .field("endpoint", &self.endpoint.as_str())
            .finish_non_exhaustive()
    }
}

impl OpenAiVisionClient {
    /// Creates a client with a custom API base URL (proxies, wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`VisionError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`VisionError::Config`] if `base_url` is not
    /// a valid URL.
    pub fn with_base_url(
        api_key: &str,
        model: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, VisionError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("pricer/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let endpoint = Self::endpoint_url(base_url)?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            model: model.to_owned(),
            endpoint,
        })
    }

    /// Appends `chat/completions` to the base URL, tolerating a trailing slash.
    fn endpoint_url(base_url: &str) -> Result<Url, VisionError> {
        let raw = format!("{}/chat/completions", base_url.trim_end_matches('/'));
        Url::parse(&raw)
            .map_err(|e| VisionError::Config(format!("invalid base URL '{base_url}': {e}")))
    }

    fn build_body<'a>(&'a self, request: VisionRequest<'a>) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: vec![
                    ContentPart::Text {
                        text: request.prompt,
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: request.image,
                            detail: IMAGE_DETAIL,
                        },
                    },
                ],
            }],
            max_tokens: MAX_OUTPUT_TOKENS,
            temperature: SAMPLING_TEMPERATURE,
        }
    }
}

#[async_trait]
impl VisionModel for OpenAiVisionClient {
    async fn describe_image(&self, request: VisionRequest<'_>) -> Result<String, VisionError> {
        let body = self.build_body(request);
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok());
            let text = response.text().await.unwrap_or_default();
            return Err(classify_api_error(status, &text, retry_after_secs));
        }

        let text = response.text().await?;
        let parsed: ChatCompletionResponse =
            serde_json::from_str(&text).map_err(|e| VisionError::Deserialize {
                context: format!("chat completion from {}", self.model),
                source: e,
            })?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or(VisionError::EmptyReply)?;

        Ok(choice.message.content.unwrap_or_default())
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Maps a non-2xx response onto a [`VisionError`] kind.
///
/// Provider error codes take precedence over the HTTP status, since quota
/// exhaustion is also reported as 429.
pub(crate) fn classify_api_error(
    status: StatusCode,
    body: &str,
    retry_after_secs: Option<u64>,
) -> VisionError {
    let parsed = serde_json::from_str::<ApiErrorEnvelope>(body)
        .ok()
        .map(|envelope| envelope.error);

    let message = parsed
        .as_ref()
        .map(|e| e.message.trim().to_string())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| fallback_message(status, body));

    let code = parsed
        .as_ref()
        .and_then(|e| e.code.as_deref().or(e.kind.as_deref()))
        .unwrap_or_default();
    let lowered = message.to_lowercase();

    if code == "insufficient_quota" {
        VisionError::QuotaExceeded { message }
    } else if code == "invalid_api_key" || status == StatusCode::UNAUTHORIZED {
        VisionError::InvalidCredential { message }
    } else if status == StatusCode::TOO_MANY_REQUESTS || lowered.contains("rate limit") {
        VisionError::RateLimited {
            message,
            retry_after_secs,
        }
    } else if lowered.contains("deprecated") {
        VisionError::ModelDeprecated { message }
    } else {
        VisionError::Api {
            status: status.as_u16(),
            message,
        }
    }
}

fn fallback_message(status: StatusCode, body: &str) -> String {
    let preview: String = body.trim().chars().take(ERROR_BODY_PREVIEW_CHARS).collect();
    if preview.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string()
    } else {
        preview
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
