//! TripLedger Core Library
//!
//! Core functionality for the tripledger travel-expense tracker.
//!
//! # Features
//! - Receipt extraction from photos via vision-language models
//!   (Gemini / HuggingFace router)
//! - Content-hash cache keyed by SHA-256 so reprocessing is free
//! - CSV ledger of receipts, line items, and store locations
//! - Keyword category classification with model-category precedence
//! - Address geocoding via the Google Maps API
//! - Plain-text expense reports

pub mod cache;
pub mod classify;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod geo;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod store;
pub mod vision;

pub use cache::{CacheStats, ExtractionCache};
pub use classify::CategoryClassifier;
pub use config::{Config, GeminiConfig, HuggingFaceConfig, Provider};
pub use error::{exit_codes, Error, Result, TripLedgerError};
pub use fingerprint::{fingerprint_bytes, fingerprint_file, receipt_id_from, RECEIPT_ID_LEN};
pub use geo::{GeocodeCache, Geocoder};
pub use models::{
    CacheEntry, Category, Currency, FailureKind, GeoLocation, Item, Language, ProcessingError,
    ProcessingResult, Receipt,
};
pub use pipeline::{scan_directory, ExtractionPipeline, PipelineSummary};
pub use report::render_report;
pub use store::{ReceiptStore, StoreStats};
pub use vision::{
    client_for, extraction_prompt, is_supported_image, ImagePayload, VisionClient,
    SUPPORTED_EXTENSIONS,
};

/// Default data directory name
pub const DATA_DIR_NAME: &str = "tripledger";

/// Default config directory name
pub const CONFIG_DIR_NAME: &str = "tripledger";
