//! Normalization from [`CandidateItem`] to the canonical [`ExtractedItem`].
//!
//! Every rule is first-match-wins and total: whatever the model sent, each
//! output field is populated and both costs are finite and non-negative.

use std::sync::LazyLock;

use pricer_core::{ExtractedItem, DEFAULT_REPLACEMENT_COST};
use regex::Regex;
use serde_json::Value;

use crate::candidate::CandidateItem;

/// Brand used when the model names neither a brand nor a manufacturer.
pub const NO_BRAND: &str = "No Brand";

/// A leading number grouped in threes by commas (`1,299` or `1,234,567`).
static GROUPED_THOUSANDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([+-]?\d{1,3}(?:,\d{3})+)(?:[^\d,]|$)").expect("valid thousands regex")
});

/// Normalizes candidates in order. `index` in synthesized descriptions is
/// the 1-based position in this list.
#[must_use]
pub fn normalize_items(candidates: &[CandidateItem], file_label: &str) -> Vec<ExtractedItem> {
    candidates
        .iter()
        .enumerate()
        .map(|(idx, candidate)| normalize_item(candidate, idx, file_label))
        .collect()
}

/// Normalizes one candidate at zero-based position `index`.
#[must_use]
pub fn normalize_item(candidate: &CandidateItem, index: usize, file_label: &str) -> ExtractedItem {
    let brand_or_manufacturer = first_text(&[
        candidate.brand_or_manufacturer.as_ref(),
        candidate.brand.as_ref(),
    ])
    .unwrap_or_else(|| NO_BRAND.to_string());

    let model_number =
        first_text(&[candidate.model_number.as_ref(), candidate.model.as_ref()]).unwrap_or_default();

    let item_description = first_text(&[
        candidate.item_description.as_ref(),
        candidate.description.as_ref(),
    ])
    .unwrap_or_else(|| format!("Item {} from {file_label}", index + 1));

    let cost_to_replace =
        parse_cost(candidate.cost_to_replace.as_ref()).unwrap_or(DEFAULT_REPLACEMENT_COST);
    let total_cost = parse_cost(candidate.total_cost.as_ref()).unwrap_or(cost_to_replace);

    // The short aliases mirror the resolved long-form fields, so an item that
    // went through here once comes out unchanged the second time.
    let brand =
        text_value(candidate.brand.as_ref()).unwrap_or_else(|| brand_or_manufacturer.clone());
    let description =
        text_value(candidate.description.as_ref()).unwrap_or_else(|| item_description.clone());

    ExtractedItem {
        brand_or_manufacturer,
        model_number,
        item_description,
        cost_to_replace,
        total_cost,
        brand,
        description,
    }
}

fn first_text(fields: &[Option<&Value>]) -> Option<String> {
    fields.iter().find_map(|field| text_value(*field))
}

/// Reads a display string from a JSON value.
///
/// Blank strings count as absent; anything else is kept verbatim. Numbers
/// are rendered (models sometimes send numeric model numbers); booleans,
/// arrays and objects are ignored.
fn text_value(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => (!s.trim().is_empty()).then(|| s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Reads a cost from a JSON number or a numeric string such as `"12.50"`,
/// `"$1,299.99"` or `"40 USD"`.
///
/// Commas are only read as thousands separators when they group digits in
/// threes; `"12,50"` parses as `12`. Returns `None` for anything negative,
/// non-finite or without a leading number.
pub(crate) fn parse_cost(value: Option<&Value>) -> Option<f64> {
    let parsed = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let text = s.trim().trim_start_matches('$').trim_start();
            parse_leading_float(&ungroup_thousands(text))
        }
        _ => None,
    }?;

    (parsed.is_finite() && parsed >= 0.0).then_some(parsed.abs())
}

/// Drops the separators from a leading thousands-grouped number and leaves
/// every other comma in place.
fn ungroup_thousands(text: &str) -> String {
    match GROUPED_THOUSANDS.captures(text).and_then(|caps| caps.get(1)) {
        Some(grouped) => {
            let mut out = grouped.as_str().replace(',', "");
            out.push_str(&text[grouped.end()..]);
            out
        }
        None => text.to_string(),
    }
}

/// Parses the longest decimal prefix of `s`, ignoring trailing text.
fn parse_leading_float(s: &str) -> Option<f64> {
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }

    let int_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    let mut digits = end - int_start;

    if bytes.get(end) == Some(&b'.') {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while bytes.get(frac_end).is_some_and(u8::is_ascii_digit) {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        end = frac_end;
    }

    if digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while bytes.get(exp_end).is_some_and(u8::is_ascii_digit) {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok()
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
