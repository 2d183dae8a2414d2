//! Pricing parameters and their normalization from raw store documents.
use crate::core::document::Document;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use tracing::{debug, warn};

pub const DEFAULT_EXCHANGE_RATE: f64 = 12.7;
pub const DEFAULT_SERVICE_FEE: f64 = 1500.0;
pub const DEFAULT_BASE_DELIVERY_FEE: f64 = 1300.0;

/// Built-in delivery coefficients. Store updates merge over this set.
pub const DEFAULT_CATEGORIES: [(&str, f64); 9] = [
    ("Hoodies", 1.6),
    ("Sneakers", 1.5),
    ("Jackets/Windbreakers", 1.1),
    ("Jeans/Trousers", 0.9),
    ("T-shirts/Shorts/Accessories", 1.1),
    ("Belt bags/Clutches", 0.9),
    ("Winter footwear", 1.7),
    ("Bags/Backpacks", 1.5),
    ("Electronics/Perfume/Alcohol/Food/Jewelry/Watches", 2.0),
];

// Document field names, as written by the settings editor.
pub const FIELD_EXCHANGE_RATE: &str = "exchangeRate";
pub const FIELD_SERVICE_FEE: &str = "serviceFee";
pub const FIELD_BASE_DELIVERY_FEE: &str = "baseDeliveryFee";
pub const FIELD_CATEGORY_COEFFICIENTS: &str = "categoryCoefficients";
const FIELD_LEGACY_DELIVERY_FEE: &str = "deliveryFee";
const FIELD_LEGACY_CATEGORIES: &str = "deliveryCategories";

/// Parameters driving every quote.
///
/// All fields are finite and non-negative once a value has passed through
/// [`PricingConfig::from_document`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingConfig {
    pub exchange_rate: f64,
    pub service_fee: f64,
    pub base_delivery_fee: f64,
    pub category_coefficients: BTreeMap<String, f64>,
}

impl Default for PricingConfig {
    fn default() -> Self {
        PricingConfig {
            exchange_rate: DEFAULT_EXCHANGE_RATE,
            service_fee: DEFAULT_SERVICE_FEE,
            base_delivery_fee: DEFAULT_BASE_DELIVERY_FEE,
            category_coefficients: default_categories(),
        }
    }
}

impl PricingConfig {
    /// Builds a config from a whole-document snapshot.
    ///
    /// Every scalar field is re-read independently; a missing or malformed
    /// value becomes `0`. Categories are merged over the defaults.
    pub fn from_document(doc: &Document) -> Self {
        let delivery = doc
            .get(FIELD_BASE_DELIVERY_FEE)
            .or_else(|| doc.get(FIELD_LEGACY_DELIVERY_FEE));
        let categories = doc
            .get(FIELD_CATEGORY_COEFFICIENTS)
            .or_else(|| doc.get(FIELD_LEGACY_CATEGORIES));

        let config = PricingConfig {
            exchange_rate: field_number(FIELD_EXCHANGE_RATE, doc.get(FIELD_EXCHANGE_RATE)),
            service_fee: field_number(FIELD_SERVICE_FEE, doc.get(FIELD_SERVICE_FEE)),
            base_delivery_fee: field_number(FIELD_BASE_DELIVERY_FEE, delivery),
            category_coefficients: merge_categories(&default_categories(), categories),
        };
        debug!(?config, "Normalized pricing document");
        config
    }

    /// The document form of this config, as the store keeps it.
    pub fn to_document(&self) -> Document {
        let categories: serde_json::Map<String, Value> = self
            .category_coefficients
            .iter()
            .map(|(name, coefficient)| (name.clone(), json!(coefficient)))
            .collect();

        let mut doc = Document::new();
        doc.insert(FIELD_EXCHANGE_RATE.to_string(), json!(self.exchange_rate));
        doc.insert(FIELD_SERVICE_FEE.to_string(), json!(self.service_fee));
        doc.insert(FIELD_BASE_DELIVERY_FEE.to_string(), json!(self.base_delivery_fee));
        doc.insert(
            FIELD_CATEGORY_COEFFICIENTS.to_string(),
            Value::Object(categories),
        );
        doc
    }

    /// Coefficient for a known category.
    pub fn coefficient(&self, category: &str) -> Option<f64> {
        self.category_coefficients.get(category).copied()
    }
}

pub fn default_categories() -> BTreeMap<String, f64> {
    DEFAULT_CATEGORIES
        .iter()
        .map(|(name, coefficient)| (name.to_string(), *coefficient))
        .collect()
}

/// Merges a raw category mapping over `base`.
///
/// Keys in the update overwrite, absent keys keep their base value and new
/// keys are added. A non-object update leaves `base` untouched.
pub fn merge_categories(
    base: &BTreeMap<String, f64>,
    update: Option<&Value>,
) -> BTreeMap<String, f64> {
    let mut merged = base.clone();
    match update {
        Some(Value::Object(entries)) => {
            for (name, raw) in entries {
                merged.insert(name.clone(), field_number(name, Some(raw)));
            }
        }
        Some(Value::Null) | None => {}
        Some(other) => warn!(value = %other, "Ignoring malformed category coefficients"),
    }
    merged
}

fn field_number(field: &str, value: Option<&Value>) -> f64 {
    let number = value.map_or(0.0, coerce_number);
    if let Some(raw) = value
        && number == 0.0
        && !is_zero_literal(raw)
    {
        warn!(field, value = %raw, "Invalid numeric value, using 0");
    }
    number
}

fn is_zero_literal(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => parse_leading_number(s) == Some(0.0),
        _ => false,
    }
}

/// Coerces a raw document value to a finite, non-negative number.
///
/// Numbers are taken as is, strings are read with [`parse_leading_number`].
/// Anything else, and any negative or non-finite result, yields `0`.
pub fn coerce_number(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_leading_number(s),
        _ => None,
    };
    sanitize(parsed.unwrap_or(0.0))
}

/// Clamps invalid numbers to `0`.
pub fn sanitize(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Reads the longest decimal prefix of `input`, after leading whitespace.
///
/// `"12.5 RUB"` reads as `12.5`, `".5"` as `0.5`, `"abc"` as `None`.
pub fn parse_leading_number(input: &str) -> Option<f64> {
    let s = input.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
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
        if digits > 0 || frac_end > frac_start {
            digits += frac_end - frac_start;
            end = frac_end;
        }
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
