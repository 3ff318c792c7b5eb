//! Configuration management

use crate::error::{Result, TripLedgerError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which vision provider handles extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Gemini,
    Huggingface,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Gemini => "gemini",
            Provider::Huggingface => "huggingface",
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Provider used for extraction
    #[serde(default = "default_provider")]
    pub provider: Provider,

    /// Gemini provider settings
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// HuggingFace router provider settings
    #[serde(default)]
    pub huggingface: HuggingFaceConfig,

    /// API key for the geocoding service (optional; geocoding is skipped
    /// without it)
    #[serde(default = "default_maps_api_key")]
    pub google_maps_api_key: Option<String>,

    /// ccTLD region bias for geocoding queries
    #[serde(default = "default_region")]
    pub region: String,

    /// Language receipts are translated into by the extraction prompt
    #[serde(default = "default_primary_language")]
    pub primary_language: String,

    /// Request timeout in seconds for provider calls
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,

    /// Data directory holding the CSV tables and caches.
    /// `TRIPLEDGER_DATA_DIR` overrides this at runtime.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

/// Gemini API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// API key (usually from GEMINI_API_KEY)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model name for extraction calls
    #[serde(default = "default_gemini_model")]
    pub model: String,

    /// Base URL of the generative language API
    #[serde(default = "default_gemini_url")]
    pub base_url: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: std::env::var("GEMINI_API_KEY").ok(),
            model: default_gemini_model(),
            base_url: default_gemini_url(),
        }
    }
}

/// HuggingFace inference router settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HuggingFaceConfig {
    /// Access token (usually from HF_TOKEN)
    #[serde(default)]
    pub token: Option<String>,

    /// Model name for chat completions
    #[serde(default = "default_hf_model")]
    pub model: String,

    /// Base URL of the OpenAI-compatible router
    #[serde(default = "default_hf_url")]
    pub base_url: String,
}

impl Default for HuggingFaceConfig {
    fn default() -> Self {
        Self {
            token: std::env::var("HF_TOKEN").ok(),
            model: default_hf_model(),
            base_url: default_hf_url(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            gemini: GeminiConfig::default(),
            huggingface: HuggingFaceConfig::default(),
            google_maps_api_key: default_maps_api_key(),
            region: default_region(),
            primary_language: default_primary_language(),
            request_timeout_secs: default_timeout(),
            data_dir: None,
        }
    }
}

fn default_provider() -> Provider {
    match std::env::var("EXTRACTION_PROVIDER").as_deref() {
        Ok("huggingface") => Provider::Huggingface,
        _ => Provider::Gemini,
    }
}

fn default_gemini_model() -> String {
    std::env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-2.0-flash".to_string())
}

fn default_gemini_url() -> String {
    std::env::var("GEMINI_API_URL")
        .unwrap_or_else(|_| "https://generativelanguage.googleapis.com/v1beta".to_string())
}

fn default_hf_model() -> String {
    std::env::var("HUGGINGFACE_MODEL").unwrap_or_else(|_| "Qwen/Qwen2-VL-7B-Instruct".to_string())
}

fn default_hf_url() -> String {
    std::env::var("HF_API_URL").unwrap_or_else(|_| "https://router.huggingface.co".to_string())
}

fn default_maps_api_key() -> Option<String> {
    std::env::var("GOOGLE_MAPS_API_KEY").ok()
}

fn default_region() -> String {
    std::env::var("TRIPLEDGER_REGION").unwrap_or_else(|_| "jp".to_string())
}

fn default_primary_language() -> String {
    std::env::var("PRIMARY_LANGUAGE").unwrap_or_else(|_| "Traditional Chinese".to_string())
}

fn default_timeout() -> u64 {
    60
}

impl Config {
    /// Load config from default path
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let config: Config = serde_yaml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save config to default path
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::CONFIG_DIR_NAME)
            .join("config.yml")
    }

    /// Resolve the data directory. `TRIPLEDGER_DATA_DIR` wins over the
    /// config file, which wins over the platform default.
    pub fn data_dir(&self) -> PathBuf {
        if let Ok(dir) = std::env::var("TRIPLEDGER_DATA_DIR") {
            return PathBuf::from(dir);
        }
        self.data_dir.clone().unwrap_or_else(Self::default_data_dir)
    }

    /// Default data directory under the platform data dir
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::DATA_DIR_NAME)
    }

    pub fn receipts_path(&self) -> PathBuf {
        self.data_dir().join("receipts.csv")
    }

    pub fn items_path(&self) -> PathBuf {
        self.data_dir().join("items.csv")
    }

    pub fn locations_path(&self) -> PathBuf {
        self.data_dir().join("locations.csv")
    }

    pub fn extraction_cache_path(&self) -> PathBuf {
        self.data_dir().join("cache").join("processed.json")
    }

    pub fn geocode_cache_path(&self) -> PathBuf {
        self.data_dir().join("cache").join("geocoding.json")
    }

    /// Fail fast when the selected provider has no credentials. Called
    /// once at startup, before any image is touched.
    pub fn require_credentials(&self) -> Result<()> {
        match self.provider {
            Provider::Gemini => {
                if self.gemini.api_key.as_deref().unwrap_or("").is_empty() {
                    return Err(TripLedgerError::Config(
                        "GEMINI_API_KEY is not set (required for the gemini provider)".to_string(),
                    ));
                }
            }
            Provider::Huggingface => {
                if self.huggingface.token.as_deref().unwrap_or("").is_empty() {
                    return Err(TripLedgerError::Config(
                        "HF_TOKEN is not set (required for the huggingface provider)".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}
