//! One-shot image analysis: validate, call the model once, decode, normalize.

use pricer_core::{AnalysisRequest, AnalysisResult};

use crate::client::{VisionModel, VisionRequest};
use crate::decode::decode_reply;
use crate::error::AnalysisError;
use crate::normalize::normalize_items;
use crate::validate::{validate_request, ModelHandle};

#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineOptions {
    /// Attach the raw model reply to successful results.
    pub verbose: bool,
}

/// Runs analyses against a single model handle.
///
/// Stateless across requests; share it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct ExtractionPipeline {
    model: ModelHandle,
    options: PipelineOptions,
}

impl ExtractionPipeline {
    #[must_use]
    pub fn new(model: ModelHandle, options: PipelineOptions) -> Self {
        Self { model, options }
    }

    #[must_use]
    pub fn model(&self) -> &ModelHandle {
        &self.model
    }

    /// Analyzes one image.
    ///
    /// Makes at most one upstream call and none when validation fails. A
    /// reply that is not JSON still succeeds with a single fallback item.
    ///
    /// # Errors
    ///
    /// Returns a validation error before any upstream call, or the classified
    /// upstream failure. Decoding and normalization never fail.
    pub async fn analyze(&self, request: AnalysisRequest) -> Result<AnalysisResult, AnalysisError> {
        let (validated, model) = validate_request(request, &self.model)?;

        tracing::info!(
            file = %validated.file_label,
            model = model.model_name(),
            prompt_chars = validated.prompt.chars().count(),
            "analyzing image"
        );

        let raw = describe(model.as_ref(), &validated.prompt, &validated.image).await?;
        if self.options.verbose {
            tracing::debug!(reply = %raw, "model reply received");
        } else {
            tracing::debug!(reply_chars = raw.chars().count(), "model reply received");
        }

        let decoded = decode_reply(&raw, &validated.file_label);
        let fallback = decoded.is_fallback();
        let items = normalize_items(&decoded.into_candidates(), &validated.file_label);

        tracing::info!(
            file = %validated.file_label,
            items = items.len(),
            fallback,
            "image analysis complete"
        );

        let original_response = self.options.verbose.then_some(raw);
        Ok(AnalysisResult::new(
            items,
            validated.file_name,
            original_response,
        ))
    }
}

async fn describe(
    model: &dyn VisionModel,
    prompt: &str,
    image: &str,
) -> Result<String, AnalysisError> {
    model
        .describe_image(VisionRequest::new(prompt, image))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, model = model.model_name(), "vision call failed");
            AnalysisError::from(e)
        })
}
