//! Parsing and validation of model replies
//!
//! Models return free text that should contain one JSON object shaped
//! like the receipt schema. Replies arrive clean, fenced in markdown, or
//! buried inside reasoning text; numeric fields arrive as numbers or
//! locale-formatted strings. Everything here is lenient on the way in
//! and strict on the way out: unknown fields are ignored, but a receipt
//! without a store name, items, a total, or a resolvable currency is
//! rejected.

use crate::classify::CategoryClassifier;
use crate::error::{Result, TripLedgerError};
use crate::fingerprint;
use crate::models::{Category, Currency, Item, Language, Receipt};
use chrono::{Local, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::str::FromStr;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Receipt fields exactly as the model reported them, before validation
#[derive(Debug, Default, Deserialize)]
pub struct RawReceipt {
    #[serde(default)]
    pub store_name: Option<String>,
    #[serde(default)]
    pub store_name_translated: Option<String>,
    #[serde(default)]
    pub store_address: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub items: Vec<RawItem>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub subtotal: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub tax: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub total: Option<Decimal>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub original_language: Option<String>,
}

/// One line item as reported by the model
#[derive(Debug, Default, Deserialize)]
pub struct RawItem {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub name_translated: Option<String>,
    #[serde(default, deserialize_with = "lenient_quantity")]
    pub quantity: Option<u32>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub unit_price: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub total_price: Option<Decimal>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub subcategory: Option<String>,
}

/// Identifying context carried into receipt assembly
pub struct ReceiptMeta<'a> {
    pub fingerprint: &'a str,
    pub source_image: &'a str,
}

/// Parse a raw model reply into a validated domain receipt
pub fn parse_receipt(
    text: &str,
    meta: &ReceiptMeta<'_>,
    classifier: &CategoryClassifier,
) -> Result<Receipt> {
    let raw = parse_response(text)?;
    build_receipt(raw, meta, classifier)
}

/// Extract and deserialize the JSON object inside a model reply
pub fn parse_response(text: &str) -> Result<RawReceipt> {
    let value = extract_json_value(strip_code_fences(text))?;
    if !value.is_object() {
        return Err(TripLedgerError::MalformedResponse(
            "reply is not a JSON object".to_string(),
        ));
    }
    serde_json::from_value(value)
        .map_err(|e| TripLedgerError::Validation(format!("receipt schema mismatch: {}", e)))
}

/// Drop a leading markdown fence and anything after a closing fence
fn strip_code_fences(text: &str) -> &str {
    let mut text = text.trim();
    if let Some(rest) = text.strip_prefix("```json") {
        text = rest;
    } else if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }
    if let Some(pos) = text.find("```") {
        text = &text[..pos];
    }
    text.trim()
}

/// Parse the text as JSON, falling back to the outermost brace window
/// when the model wrapped the object in prose
fn extract_json_value(text: &str) -> Result<Value> {
    if let Ok(value) = serde_json::from_str(text) {
        return Ok(value);
    }
    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if start < end {
            if let Ok(value) = serde_json::from_str(&text[start..=end]) {
                return Ok(value);
            }
        }
    }
    let snippet: String = text.chars().take(200).collect();
    Err(TripLedgerError::MalformedResponse(format!(
        "no JSON object found in reply: {}",
        snippet
    )))
}

/// Validate raw fields and assemble the domain receipt
pub fn build_receipt(
    raw: RawReceipt,
    meta: &ReceiptMeta<'_>,
    classifier: &CategoryClassifier,
) -> Result<Receipt> {
    let store_name = clean(raw.store_name)
        .ok_or_else(|| TripLedgerError::Validation("store_name is missing".to_string()))?;
    if raw.items.is_empty() {
        return Err(TripLedgerError::Validation(
            "receipt has no items".to_string(),
        ));
    }
    let total = raw
        .total
        .ok_or_else(|| TripLedgerError::Validation("total is missing".to_string()))?;

    let language = raw
        .original_language
        .as_deref()
        .map(Language::parse)
        .unwrap_or(Language::Other);
    let currency = resolve_currency(raw.currency.as_deref(), language)?;

    let timestamp = raw
        .timestamp
        .as_deref()
        .and_then(parse_timestamp)
        .unwrap_or_else(|| Local::now().naive_local());

    let receipt_id = fingerprint::receipt_id_from(meta.fingerprint);
    let items = raw
        .items
        .into_iter()
        .enumerate()
        .map(|(index, raw_item)| build_item(raw_item, &receipt_id, index, classifier))
        .collect();

    Ok(Receipt {
        receipt_id,
        timestamp,
        store_name,
        store_name_translated: clean(raw.store_name_translated),
        store_address: clean(raw.store_address),
        items,
        // Receipts that list only a grand total are treated as
        // tax-included, so the subtotal mirrors the total.
        subtotal: raw.subtotal.or(Some(total)),
        tax: raw.tax,
        total,
        currency,
        original_language: language,
        source_image: meta.source_image.to_string(),
    })
}

fn build_item(
    raw: RawItem,
    receipt_id: &str,
    index: usize,
    classifier: &CategoryClassifier,
) -> Item {
    let name = clean(raw.name).unwrap_or_else(|| "Unknown item".to_string());
    let category = raw
        .category
        .as_deref()
        .and_then(Category::parse)
        .unwrap_or_else(|| classifier.classify(&name));
    let subcategory = clean(raw.subcategory)
        .or_else(|| classifier.subcategory(&name, category).map(str::to_string));
    Item {
        item_id: format!("{}_item_{:03}", receipt_id, index),
        receipt_id: receipt_id.to_string(),
        name,
        name_translated: clean(raw.name_translated),
        quantity: raw.quantity.unwrap_or(1),
        unit_price: raw.unit_price,
        total_price: raw.total_price,
        category,
        subcategory,
    }
}

/// Model-supplied code wins when recognized; otherwise the detected
/// language picks a default. English and unknown languages have no
/// default, so those receipts must carry an explicit code.
fn resolve_currency(code: Option<&str>, language: Language) -> Result<Currency> {
    if let Some(code) = code {
        if let Some(currency) = Currency::parse(code) {
            return Ok(currency);
        }
    }
    language.default_currency().ok_or_else(|| {
        TripLedgerError::Validation(format!(
            "currency is missing and cannot be inferred for language '{}'",
            language
        ))
    })
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Accept JSON numbers and numeric strings (with thousands separators);
/// null and empty strings are absent, anything else is an error
fn lenient_decimal<'de, D>(deserializer: D) -> std::result::Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => parse_decimal(&n.to_string())
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid numeric value: {}", n))),
        Some(Value::String(s)) => {
            let cleaned = s.trim().replace(',', "");
            if cleaned.is_empty() {
                return Ok(None);
            }
            parse_decimal(&cleaned)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid numeric value: {:?}", s)))
        }
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a number, got {}",
            other
        ))),
    }
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    Decimal::from_str(s)
        .ok()
        .or_else(|| Decimal::from_scientific(s).ok())
}

/// Accept integer-valued JSON numbers and numeric strings for quantity
fn lenient_quantity<'de, D>(deserializer: D) -> std::result::Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let parsed = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => {
            if let Some(u) = n.as_u64() {
                u32::try_from(u).ok()
            } else {
                n.as_f64().and_then(whole_f64_to_u32)
            }
        }
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed
                .parse::<u32>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().and_then(whole_f64_to_u32))
        }
        Some(_) => None,
    };
    match parsed {
        Some(q) => Ok(Some(q)),
        None => Err(serde::de::Error::custom("invalid quantity")),
    }
}

fn whole_f64_to_u32(f: f64) -> Option<u32> {
    if f.fract() == 0.0 && (0.0..=u32::MAX as f64).contains(&f) {
        Some(f as u32)
    } else {
        None
    }
}
