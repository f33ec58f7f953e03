mod json;
mod openai;
mod scripted;

pub use json::{extract_json, parse_json_reply};
pub use openai::{extract_output_text, ModelSelection, OpenAiConfig, OpenAiGenerator};
pub use scripted::{ScriptedGenerator, ScriptedReply};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelTier {
    Default,
    Fast,
}

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub role: String,
    pub tier: ModelTier,
    pub system: String,
    pub user: String,
    pub temperature: f32,
}

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("text generation is not configured: {0}")]
    NotConfigured(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("provider returned no output text")]
    EmptyOutput,

    #[error("generation rejected: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    fn name(&self) -> &'static str;

    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}
