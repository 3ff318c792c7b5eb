//! Gemini provider client

use super::{ImagePayload, VisionClient};
use crate::config::Config;
use crate::error::{Result, TripLedgerError};
use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Low temperature keeps extraction output stable across runs
const TEMPERATURE: f32 = 0.1;
const MAX_OUTPUT_TOKENS: u32 = 2048;

/// Client for the Gemini generateContent API
pub struct GeminiClient {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let api_key = config
            .gemini
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| TripLedgerError::Config("GEMINI_API_KEY is not set".to_string()))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            api_key,
            model: config.gemini.model.clone(),
            base_url: config.gemini.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl VisionClient for GeminiClient {
    async fn extract(&self, image: &ImagePayload, prompt: &str) -> Result<String> {
        #[derive(Serialize)]
        struct GenerateRequest<'a> {
            contents: Vec<Content<'a>>,
            #[serde(rename = "generationConfig")]
            generation_config: GenerationConfig,
        }

        #[derive(Serialize)]
        struct Content<'a> {
            role: &'a str,
            parts: Vec<Part<'a>>,
        }

        #[derive(Serialize)]
        struct Part<'a> {
            #[serde(rename = "inlineData", skip_serializing_if = "Option::is_none")]
            inline_data: Option<InlineData<'a>>,
            #[serde(skip_serializing_if = "Option::is_none")]
            text: Option<&'a str>,
        }

        #[derive(Serialize)]
        struct InlineData<'a> {
            #[serde(rename = "mimeType")]
            mime_type: &'a str,
            data: String,
        }

        #[derive(Serialize)]
        struct GenerationConfig {
            temperature: f32,
            #[serde(rename = "maxOutputTokens")]
            max_output_tokens: u32,
        }

        #[derive(Deserialize)]
        struct GenerateResponse {
            #[serde(default)]
            candidates: Vec<Candidate>,
        }

        #[derive(Deserialize)]
        struct Candidate {
            content: Option<CandidateContent>,
        }

        #[derive(Deserialize)]
        struct CandidateContent {
            #[serde(default)]
            parts: Vec<CandidatePart>,
        }

        #[derive(Deserialize)]
        struct CandidatePart {
            text: Option<String>,
        }

        let encoded = base64::engine::general_purpose::STANDARD.encode(&image.bytes);
        let request_body = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![
                    Part {
                        inline_data: Some(InlineData {
                            mime_type: image.mime_type,
                            data: encoded,
                        }),
                        text: None,
                    },
                    Part {
                        inline_data: None,
                        text: Some(prompt),
                    },
                ],
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
        };

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TripLedgerError::Provider(format!(
                "Gemini API error {}: {}",
                status, body
            )));
        }

        let generate_response: GenerateResponse = response.json().await?;
        let text: String = generate_response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(TripLedgerError::Provider(
                "Gemini returned no candidate text".to_string(),
            ));
        }
        Ok(text)
    }
}
