//! Loosely-typed item records decoded from a model reply.

use pricer_core::ExtractedItem;
use serde::Deserialize;
use serde_json::Value;

/// A record as the model wrote it, before normalization.
///
/// Every field is optional and kept as raw JSON: models routinely send
/// prices as strings, omit keys, or use the short aliases `brand`, `model`
/// and `description`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateItem {
    #[serde(default)]
    pub brand_or_manufacturer: Option<Value>,
    #[serde(default)]
    pub brand: Option<Value>,
    #[serde(default)]
    pub model_number: Option<Value>,
    #[serde(default)]
    pub model: Option<Value>,
    #[serde(default)]
    pub item_description: Option<Value>,
    #[serde(default)]
    pub description: Option<Value>,
    #[serde(default)]
    pub cost_to_replace: Option<Value>,
    #[serde(default)]
    pub total_cost: Option<Value>,
}

impl CandidateItem {
    /// Reads a candidate from any JSON value. Non-objects yield an empty
    /// candidate, which normalization fills entirely with defaults.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(_) => serde_json::from_value(value).unwrap_or_default(),
            _ => Self::default(),
        }
    }
}

impl From<&ExtractedItem> for CandidateItem {
    fn from(item: &ExtractedItem) -> Self {
        Self {
            brand_or_manufacturer: Some(Value::from(item.brand_or_manufacturer.as_str())),
            brand: Some(Value::from(item.brand.as_str())),
            model_number: Some(Value::from(item.model_number.as_str())),
            model: None,
            item_description: Some(Value::from(item.item_description.as_str())),
            description: Some(Value::from(item.description.as_str())),
            cost_to_replace: Some(Value::from(item.cost_to_replace)),
            total_cost: Some(Value::from(item.total_cost)),
        }
    }
}
