use std::env;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::{GenerationError, GenerationRequest, ModelTier, TextGenerator};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o";
const DEFAULT_FAST_MODEL: &str = "gpt-4o-mini";
const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 90;

#[derive(Debug, Clone)]
pub struct ModelSelection {
    pub default_model: String,
    pub fast_model: String,
}

impl ModelSelection {
    pub fn from_env() -> Self {
        Self {
            default_model: env::var("WAYFARER_MODEL_ID")
                .unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            fast_model: env::var("WAYFARER_FAST_MODEL_ID")
                .unwrap_or_else(|_| DEFAULT_FAST_MODEL.to_string()),
        }
    }

    pub fn model_for(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Default => self.default_model.as_str(),
            ModelTier::Fast => self.fast_model.as_str(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub models: ModelSelection,
    pub request_timeout: Duration,
}

impl OpenAiConfig {
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("WAYFARER_OPENAI_API_KEY")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())?;
        let base_url = env::var("WAYFARER_OPENAI_BASE_URL")
            .ok()
            .map(|value| value.trim().trim_end_matches('/').to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let request_timeout = Duration::from_secs(
            env::var("WAYFARER_OPENAI_TIMEOUT_SECONDS")
                .ok()
                .and_then(|value| value.trim().parse::<u64>().ok())
                .map(|value| value.clamp(5, 600))
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECONDS),
        );

        Some(Self {
            api_key,
            base_url,
            models: ModelSelection::from_env(),
            request_timeout,
        })
    }
}

pub struct OpenAiGenerator {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiGenerator {
    pub fn new(config: OpenAiConfig) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(6))
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { client, config })
    }

    pub fn models(&self) -> &ModelSelection {
        &self.config.models
    }
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let model = self.config.models.model_for(request.tier);
        let payload = serde_json::json!({
            "model": model,
            "temperature": request.temperature,
            "input": [
                {
                    "role": "system",
                    "content": [
                        { "type": "input_text", "text": request.system }
                    ]
                },
                {
                    "role": "user",
                    "content": [
                        { "type": "input_text", "text": request.user }
                    ]
                }
            ]
        });

        debug!(role = %request.role, model = %model, "sending generation request");
        let response = self
            .client
            .post(format!("{}/responses", self.config.base_url))
            .bearer_auth(self.config.api_key.as_str())
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: serde_json::Value = response.json().await?;
        extract_output_text(&body)
            .filter(|value| !value.trim().is_empty())
            .ok_or(GenerationError::EmptyOutput)
    }
}

pub fn extract_output_text(payload: &serde_json::Value) -> Option<String> {
    if let Some(value) = payload.get("output_text").and_then(|value| value.as_str()) {
        return Some(value.to_string());
    }
    let output = payload.get("output")?.as_array()?;
    let mut chunks = Vec::new();
    for item in output {
        let Some(content) = item.get("content").and_then(|value| value.as_array()) else {
            continue;
        };
        for content_item in content {
            let is_text = content_item
                .get("type")
                .and_then(|value| value.as_str())
                .map(|value| value == "output_text")
                .unwrap_or(false);
            if let Some(text) = content_item
                .get("text")
                .and_then(|value| value.as_str())
                .filter(|_| is_text)
            {
                chunks.push(text.to_string());
            }
        }
    }
    if chunks.is_empty() {
        None
    } else {
        Some(chunks.join("\n\n"))
    }
}
