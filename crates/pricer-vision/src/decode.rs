//! Structured-then-fallback decoding of a raw model reply.

use pricer_core::DEFAULT_REPLACEMENT_COST;
use serde_json::Value;

use crate::candidate::CandidateItem;

/// Brand placed on the synthesized item when the reply is not JSON.
pub const FALLBACK_BRAND: &str = "AI Analysis";

/// How much of an unparseable reply is kept as the fallback description.
pub const FALLBACK_DESCRIPTION_CHARS: usize = 200;

const FENCE: &str = "```";

/// Result of decoding one reply.
///
/// `Fallback` is not an error: it is the designated outcome for prose
/// replies and always carries exactly one item.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedReply {
    Structured(Vec<CandidateItem>),
    Fallback(CandidateItem),
}

impl DecodedReply {
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Structured(items) => items.len(),
            Self::Fallback(_) => 1,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn into_candidates(self) -> Vec<CandidateItem> {
        match self {
            Self::Structured(items) => items,
            Self::Fallback(item) => vec![item],
        }
    }
}

/// Removes a Markdown code fence wrapping the whole reply, then trims.
///
/// A language tag (```` ```json ````) is only recognized on a line of its
/// own, so a single-line fence such as ```` ```42``` ```` keeps its content.
/// A missing closing fence is tolerated. Fences in the middle of the text
/// are left alone.
#[must_use]
pub fn strip_code_fence(raw: &str) -> &str {
    let mut text = raw.trim();

    if let Some(rest) = text.strip_prefix(FENCE) {
        text = match rest.split_once('\n') {
            Some((tag, body)) if tag.trim().chars().all(is_tag_char) => body,
            _ => rest,
        };
    }

    if let Some(rest) = text.trim_end().strip_suffix(FENCE) {
        text = rest;
    }

    text.trim()
}

fn is_tag_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "_+-".contains(c)
}

/// Decodes a reply into candidate items.
///
/// A JSON array yields one candidate per element (possibly none); any other
/// JSON value yields exactly one. Text that is not JSON yields the fallback
/// candidate built from the first [`FALLBACK_DESCRIPTION_CHARS`] characters
/// of the untouched reply.
#[must_use]
pub fn decode_reply(raw: &str, file_label: &str) -> DecodedReply {
    match serde_json::from_str::<Value>(strip_code_fence(raw)) {
        Ok(Value::Array(values)) => {
            DecodedReply::Structured(values.into_iter().map(CandidateItem::from_value).collect())
        }
        Ok(value) => DecodedReply::Structured(vec![CandidateItem::from_value(value)]),
        Err(e) => {
            tracing::debug!(error = %e, "model reply is not JSON; synthesizing fallback item");
            DecodedReply::Fallback(fallback_candidate(raw, file_label))
        }
    }
}

fn fallback_candidate(raw: &str, file_label: &str) -> CandidateItem {
    let description: String = raw.chars().take(FALLBACK_DESCRIPTION_CHARS).collect();

    CandidateItem {
        brand_or_manufacturer: Some(Value::from(FALLBACK_BRAND)),
        brand: Some(Value::from("")),
        model_number: Some(Value::from("")),
        model: None,
        item_description: Some(Value::from(format!("Items visible in {file_label}"))),
        description: Some(Value::from(description)),
        cost_to_replace: Some(Value::from(DEFAULT_REPLACEMENT_COST)),
        total_cost: Some(Value::from(DEFAULT_REPLACEMENT_COST)),
    }
}

#[cfg(test)]
#[path = "decode_test.rs"]
mod tests;
