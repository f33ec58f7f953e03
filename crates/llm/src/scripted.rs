use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::{GenerationError, GenerationRequest, TextGenerator};

#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Text(String),
    Delayed { after: Duration, text: String },
    Fail(String),
}

// Roles without a script fail with `Rejected`.
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    replies: HashMap<String, ScriptedReply>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reply(mut self, role: &str, text: impl Into<String>) -> Self {
        self.replies
            .insert(role.to_string(), ScriptedReply::Text(text.into()));
        self
    }

    pub fn with_delay(mut self, role: &str, after: Duration, text: impl Into<String>) -> Self {
        self.replies.insert(
            role.to_string(),
            ScriptedReply::Delayed {
                after,
                text: text.into(),
            },
        );
        self
    }

    pub fn with_failure(mut self, role: &str, message: impl Into<String>) -> Self {
        self.replies
            .insert(role.to_string(), ScriptedReply::Fail(message.into()));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self, role: &str) -> usize {
        self.calls.lock().iter().filter(|call| *call == role).count()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        self.calls.lock().push(request.role.clone());

        match self.replies.get(&request.role) {
            Some(ScriptedReply::Text(text)) => Ok(text.clone()),
            Some(ScriptedReply::Delayed { after, text }) => {
                tokio::time::sleep(*after).await;
                Ok(text.clone())
            }
            Some(ScriptedReply::Fail(message)) => Err(GenerationError::Rejected(message.clone())),
            None => Err(GenerationError::Rejected(format!(
                "no scripted reply for role {}",
                request.role
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ModelTier;

    fn request(role: &str) -> GenerationRequest {
        GenerationRequest {
            role: role.to_string(),
            tier: ModelTier::Fast,
            system: String::new(),
            user: String::new(),
            temperature: 0.3,
        }
    }

    #[tokio::test]
    async fn replies_by_role_and_records_calls() {
        let generator = ScriptedGenerator::new()
            .with_reply("researcher", "notes")
            .with_failure("reviewer", "down");

        assert_eq!(generator.generate(&request("researcher")).await.unwrap(), "notes");
        assert!(generator.generate(&request("reviewer")).await.is_err());
        assert!(generator.generate(&request("unknown")).await.is_err());
        assert_eq!(generator.calls(), vec!["researcher", "reviewer", "unknown"]);
        assert_eq!(generator.call_count("researcher"), 1);
    }
}
