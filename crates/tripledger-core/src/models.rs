//! Domain models: receipts, items, categories, and per-image outcomes

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed spending categories. Order matters: keyword matching resolves
/// ties by declaration order, so `Food` outranks everything below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Food,
    Beverage,
    Transport,
    Lodging,
    Shopping,
    Entertainment,
    Health,
    Other,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Food,
        Category::Beverage,
        Category::Transport,
        Category::Lodging,
        Category::Shopping,
        Category::Entertainment,
        Category::Health,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "food",
            Category::Beverage => "beverage",
            Category::Transport => "transport",
            Category::Lodging => "lodging",
            Category::Shopping => "shopping",
            Category::Entertainment => "entertainment",
            Category::Health => "health",
            Category::Other => "other",
        }
    }

    /// Parse a model-supplied category string. Only the 8 recognized
    /// values map; anything else returns None and the caller falls back
    /// to keyword classification.
    pub fn parse(s: &str) -> Option<Category> {
        match s.trim().to_lowercase().as_str() {
            "food" => Some(Category::Food),
            "beverage" => Some(Category::Beverage),
            "transport" => Some(Category::Transport),
            "lodging" => Some(Category::Lodging),
            "shopping" => Some(Category::Shopping),
            "entertainment" => Some(Category::Entertainment),
            "health" => Some(Category::Health),
            "other" => Some(Category::Other),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Supported currency codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Currency {
    TWD,
    JPY,
    USD,
    EUR,
    KRW,
    CNY,
    GBP,
    HKD,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::TWD => "TWD",
            Currency::JPY => "JPY",
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::KRW => "KRW",
            Currency::CNY => "CNY",
            Currency::GBP => "GBP",
            Currency::HKD => "HKD",
        }
    }

    pub fn parse(s: &str) -> Option<Currency> {
        match s.trim().to_uppercase().as_str() {
            "TWD" => Some(Currency::TWD),
            "JPY" => Some(Currency::JPY),
            "USD" => Some(Currency::USD),
            "EUR" => Some(Currency::EUR),
            "KRW" => Some(Currency::KRW),
            "CNY" => Some(Currency::CNY),
            "GBP" => Some(Currency::GBP),
            "HKD" => Some(Currency::HKD),
            _ => None,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detected source language of a receipt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "ja")]
    Ja,
    #[serde(rename = "en")]
    En,
    #[serde(rename = "zh-TW")]
    ZhTw,
    #[serde(rename = "zh-CN")]
    ZhCn,
    #[serde(rename = "ko")]
    Ko,
    #[serde(rename = "other")]
    Other,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Ja => "ja",
            Language::En => "en",
            Language::ZhTw => "zh-TW",
            Language::ZhCn => "zh-CN",
            Language::Ko => "ko",
            Language::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Language {
        match s.trim() {
            "ja" => Language::Ja,
            "en" => Language::En,
            "zh-TW" => Language::ZhTw,
            "zh-CN" => Language::ZhCn,
            "ko" => Language::Ko,
            _ => Language::Other,
        }
    }

    /// Currency assumed when the model omits one. English and unknown
    /// languages have no safe default and must carry an explicit code.
    pub fn default_currency(&self) -> Option<Currency> {
        match self {
            Language::Ja => Some(Currency::JPY),
            Language::ZhTw => Some(Currency::TWD),
            Language::ZhCn => Some(Currency::CNY),
            Language::Ko => Some(Currency::KRW),
            Language::En | Language::Other => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line entry within a receipt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub item_id: String,
    pub receipt_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_translated: Option<String>,
    pub quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_price: Option<Decimal>,
    pub category: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
}

/// One parsed receipt with aggregate totals.
///
/// `total` is expected to equal `subtotal + tax` when both are present,
/// but source data may disagree and the drift is tolerated, never fixed
/// up. Item `total_price` is likewise trusted from the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub receipt_id: String,
    pub timestamp: NaiveDateTime,
    pub store_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_name_translated: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_address: Option<String>,
    pub items: Vec<Item>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtotal: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax: Option<Decimal>,
    pub total: Decimal,
    pub currency: Currency,
    pub original_language: Language,
    pub source_image: String,
}

impl Receipt {
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }
}

/// Geocoded place attached to a receipt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub place_id: Option<String>,
}

/// One successful extraction, persisted in the cache keyed by fingerprint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub fingerprint: String,
    pub source_image: String,
    pub processed_at: DateTime<Utc>,
    pub receipt: Receipt,
}

/// Which stage of processing an image failed at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Io,
    Provider,
    MalformedResponse,
    Validation,
    Store,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureKind::Io => "io",
            FailureKind::Provider => "provider",
            FailureKind::MalformedResponse => "malformed_response",
            FailureKind::Validation => "validation",
            FailureKind::Store => "store",
        };
        f.write_str(s)
    }
}

/// Structured per-image failure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingError {
    pub kind: FailureKind,
    pub message: String,
}

impl fmt::Display for ProcessingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Outcome of processing a single image
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingResult {
    pub source_image: String,
    pub success: bool,
    /// True when the receipt came from the extraction cache
    pub cached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<Receipt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ProcessingError>,
    pub elapsed_ms: u64,
}

impl ProcessingResult {
    pub fn success(source_image: String, receipt: Receipt, cached: bool, elapsed_ms: u64) -> Self {
        Self {
            source_image,
            success: true,
            cached,
            receipt: Some(receipt),
            error: None,
            elapsed_ms,
        }
    }

    pub fn failure(
        source_image: String,
        kind: FailureKind,
        message: String,
        elapsed_ms: u64,
    ) -> Self {
        Self {
            source_image,
            success: false,
            cached: false,
            receipt: None,
            error: Some(ProcessingError { kind, message }),
            elapsed_ms,
        }
    }
}
