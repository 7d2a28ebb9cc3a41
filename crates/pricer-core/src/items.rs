use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Replacement cost used when the model gives no usable figure.
///
/// Indistinguishable from a genuine $25.99 estimate once normalized; kept for
/// compatibility with existing consumers of the item list.
pub const DEFAULT_REPLACEMENT_COST: f64 = 25.99;

/// Label substituted for a missing or blank file name.
pub const UNKNOWN_FILE_NAME: &str = "unknown";

/// An image analysis request as received from a client.
///
/// Every field is optional at the wire level so that missing inputs surface
/// as typed validation errors instead of body-decoding failures.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    /// Data URI (`data:image/jpeg;base64,...`) or an `https://` URL.
    #[serde(default)]
    pub image: Option<String>,
    /// Extraction instructions forwarded verbatim to the model.
    #[serde(default)]
    pub prompt: Option<String>,
    /// Opaque label used in synthesized descriptions and echoed back.
    #[serde(default)]
    pub file_name: Option<String>,
}

impl AnalysisRequest {
    #[must_use]
    pub fn new(
        image: impl Into<String>,
        prompt: impl Into<String>,
        file_name: Option<String>,
    ) -> Self {
        Self {
            image: Some(image.into()),
            prompt: Some(prompt.into()),
            file_name,
        }
    }

    /// The file name, or [`UNKNOWN_FILE_NAME`] when absent or blank.
    #[must_use]
    pub fn file_label(&self) -> &str {
        self.file_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(UNKNOWN_FILE_NAME)
    }
}

/// One inventory record extracted from an image. Every field is always
/// populated; see the normalization stage for the derivation rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedItem {
    pub brand_or_manufacturer: String,
    /// May be empty when the model could not read a model number.
    pub model_number: String,
    pub item_description: String,
    /// Non-negative; defaults to [`DEFAULT_REPLACEMENT_COST`].
    pub cost_to_replace: f64,
    /// Non-negative; falls back to `cost_to_replace`.
    pub total_cost: f64,
    pub brand: String,
    pub description: String,
}

/// Successful outcome of one analysis.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub success: bool,
    pub items: Vec<ExtractedItem>,
    pub file_name: Option<String>,
    pub extracted_count: usize,
    /// Raw model reply; only populated for verbose pipelines.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_response: Option<String>,
    pub processing_time: DateTime<Utc>,
}

impl AnalysisResult {
    #[must_use]
    pub fn new(
        items: Vec<ExtractedItem>,
        file_name: Option<String>,
        original_response: Option<String>,
    ) -> Self {
        Self {
            success: true,
            extracted_count: items.len(),
            items,
            file_name,
            original_response,
            processing_time: Utc::now(),
        }
    }
}
