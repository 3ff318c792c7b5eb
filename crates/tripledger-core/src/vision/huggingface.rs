//! HuggingFace inference router client (OpenAI-compatible)

use super::{ImagePayload, VisionClient};
use crate::config::Config;
use crate::error::{Result, TripLedgerError};
use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const TEMPERATURE: f32 = 0.1;
/// Vision models on the router interleave reasoning with output, so the
/// budget is larger than Gemini's
const MAX_TOKENS: u32 = 4096;

const SYSTEM_PROMPT: &str = "You are a receipt/invoice data extraction assistant. \
You MUST respond with ONLY a valid JSON object. \
Do NOT include any reasoning, explanation, or thinking process. \
Output ONLY the JSON, nothing else.";

/// Client for HuggingFace's chat completions router
pub struct HuggingFaceClient {
    token: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl HuggingFaceClient {
    pub fn new(config: &Config) -> Result<Self> {
        let token = config
            .huggingface
            .token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| TripLedgerError::Config("HF_TOKEN is not set".to_string()))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            token,
            model: config.huggingface.model.clone(),
            base_url: config.huggingface.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl VisionClient for HuggingFaceClient {
    async fn extract(&self, image: &ImagePayload, prompt: &str) -> Result<String> {
        #[derive(Serialize)]
        struct ChatRequest<'a> {
            model: &'a str,
            messages: Vec<Message<'a>>,
            max_tokens: u32,
            temperature: f32,
        }

        #[derive(Serialize)]
        struct Message<'a> {
            role: &'a str,
            content: MessageContent<'a>,
        }

        #[derive(Serialize)]
        #[serde(untagged)]
        enum MessageContent<'a> {
            Text(&'a str),
            Parts(Vec<ContentPart<'a>>),
        }

        #[derive(Serialize)]
        #[serde(tag = "type")]
        enum ContentPart<'a> {
            #[serde(rename = "text")]
            Text { text: &'a str },
            #[serde(rename = "image_url")]
            ImageUrl { image_url: ImageUrl },
        }

        #[derive(Serialize)]
        struct ImageUrl {
            url: String,
        }

        #[derive(Deserialize)]
        struct ChatResponse {
            #[serde(default)]
            choices: Vec<Choice>,
        }

        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMessage,
        }

        #[derive(Deserialize)]
        struct ChoiceMessage {
            content: Option<String>,
        }

        let encoded = base64::engine::general_purpose::STANDARD.encode(&image.bytes);
        let data_uri = format!("data:{};base64,{}", image.mime_type, encoded);

        let request_body = ChatRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: MessageContent::Text(SYSTEM_PROMPT),
                },
                Message {
                    role: "user",
                    content: MessageContent::Parts(vec![
                        ContentPart::Text { text: prompt },
                        ContentPart::ImageUrl {
                            image_url: ImageUrl { url: data_uri },
                        },
                    ]),
                },
            ],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        let url = format!("{}/v1/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TripLedgerError::Provider(format!(
                "HuggingFace API error {}: {}",
                status, body
            )));
        }

        let chat_response: ChatResponse = response.json().await?;
        let text = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        if text.is_empty() {
            return Err(TripLedgerError::Provider(
                "HuggingFace returned an empty reply".to_string(),
            ));
        }
        Ok(text)
    }
}
