//! Error types for tripledger

use thiserror::Error;

/// Result type alias using TripLedgerError
pub type Result<T> = std::result::Result<T, TripLedgerError>;

/// Error type alias for convenience
pub type Error = TripLedgerError;

/// Exit codes for CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const NOT_FOUND: i32 = 2;
    pub const INVALID_INPUT: i32 = 3;
    pub const CONFIG_ERROR: i32 = 4;
}

/// Main error type for tripledger
#[derive(Debug, Error)]
pub enum TripLedgerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Walk directory error: {0}")]
    WalkDir(#[from] walkdir::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Receipt not found: {0}")]
    ReceiptNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl TripLedgerError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ReceiptNotFound(_) => exit_codes::NOT_FOUND,
            Self::InvalidInput(_) => exit_codes::INVALID_INPUT,
            Self::Config(_) => exit_codes::CONFIG_ERROR,
            _ => exit_codes::GENERAL_ERROR,
        }
    }
}
