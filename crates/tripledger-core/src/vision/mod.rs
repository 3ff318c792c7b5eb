//! Vision model clients
//!
//! One capability interface over "image plus instruction text in, free
//! text out", with two provider implementations selected by
//! configuration. Nothing here validates the reply as JSON; that is the
//! response parser's job.

mod gemini;
mod huggingface;
pub mod response;

pub use gemini::GeminiClient;
pub use huggingface::HuggingFaceClient;

use crate::config::{Config, Provider};
use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Image file extensions accepted for extraction (lowercase)
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "heic", "heif", "webp"];

/// Whether a path carries one of the supported image extensions
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SUPPORTED_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// MIME type for an image path, by extension. Unknown extensions fall
/// back to JPEG, which the providers tolerate.
pub fn mime_type(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("heic") => "image/heic",
        Some("heif") => "image/heif",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}

/// An image loaded and ready to send to a provider
#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
}

impl ImagePayload {
    /// Read a whole image file from disk
    pub fn read(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Ok(Self {
            bytes,
            mime_type: mime_type(path),
        })
    }
}

/// Capability interface: send an image with instruction text, get the
/// model's raw textual reply back
#[async_trait]
pub trait VisionClient: Send + Sync {
    async fn extract(&self, image: &ImagePayload, prompt: &str) -> Result<String>;
}

/// Build the provider client selected by the configuration
pub fn client_for(config: &Config) -> Result<Box<dyn VisionClient>> {
    match config.provider {
        Provider::Gemini => Ok(Box::new(GeminiClient::new(config)?)),
        Provider::Huggingface => Ok(Box::new(HuggingFaceClient::new(config)?)),
    }
}

/// Instruction prompt shared by both providers. Demands exactly one JSON
/// object shaped like the receipt schema, with translations into
/// `translate_to`.
pub fn extraction_prompt(translate_to: &str) -> String {
    format!(
        r#"You are an expert at reading receipts and invoices.
Analyze this image and extract all information.

IMPORTANT:
- Detect the language of the receipt (Japanese, English, Chinese, etc.)
- Keep original text for store names and item names
- Also provide translated versions in {lang} if not already in {lang}
- Use 24-hour time format for timestamps
- If you cannot read certain fields clearly, use null

Return the data as a valid JSON object with this exact structure:
{{
  "store_name": "store name in original language",
  "store_name_translated": "store name in {lang} (if different, otherwise null)",
  "store_address": "full address if visible, null otherwise",
  "timestamp": "YYYY-MM-DDTHH:MM:SS format, use best estimate for date/time",
  "items": [
    {{
      "name": "item name in original language",
      "name_translated": "item name in {lang} (if different)",
      "quantity": 1,
      "unit_price": 100,
      "total_price": 100,
      "category": "food|beverage|transport|lodging|shopping|entertainment|health|other",
      "subcategory": "specific type like meal, snack, coffee, train, hotel, souvenir, etc."
    }}
  ],
  "subtotal": 900,
  "tax": 90,
  "total": 990,
  "currency": "JPY|TWD|USD|EUR|KRW|CNY|GBP|HKD",
  "original_language": "ja|en|zh-TW|zh-CN|ko|other"
}}

Rules:
1. All numeric values should be numbers, not strings
2. If tax is included in prices (内税), try to identify the tax amount. If subtotal is not explicitly listed, use null.
3. If you see 税込 or similar, the total already includes tax
4. Category must be one of: food, beverage, transport, lodging, shopping, entertainment, health, other
5. For Japanese convenience stores (ローソン, セブンイレブン, ファミリーマート), common items:
   - おにぎり = rice ball (food/snack)
   - パン = bread (food/snack)
   - お茶/水 = tea/water (beverage/soft_drink)
   - コーヒー = coffee (beverage/coffee)
6. Return ONLY the JSON, no markdown code blocks or other text
"#,
        lang = translate_to
    )
}
