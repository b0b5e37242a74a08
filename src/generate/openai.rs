//! OpenAI-compatible chat completions client

use crate::config::GeneratorConfig;
use crate::generate::{parse_json_output, GenerationError, Prompt, TextGenerator};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// `TextGenerator` backed by a `/chat/completions` endpoint in JSON mode
pub struct ChatCompletionsGenerator {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    content: Option<String>,
}

impl ChatCompletionsGenerator {
    pub fn new(config: &GeneratorConfig, api_key: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key: api_key.into(),
            temperature: config.temperature,
        })
    }

    /// Reads the API key from the environment variable named in the config
    pub fn from_env(config: &GeneratorConfig) -> crate::Result<Self> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            crate::ConfigError::Validation(format!(
                "environment variable {} is not set",
                config.api_key_env
            ))
        })?;
        Ok(Self::new(config, api_key)?)
    }
}

#[async_trait]
impl TextGenerator for ChatCompletionsGenerator {
    async fn generate(&self, prompt: &Prompt) -> Result<serde_json::Value, GenerationError> {
        let body = json!({
            "model": self.model,
            "temperature": self.temperature,
            "response_format": {"type": "json_object"},
            "messages": [
                {"role": "system", "content": prompt.system_message()},
                {"role": "user", "content": prompt.render()},
            ],
        });

        tracing::debug!("Requesting {} from {}", prompt.template, self.model);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Request(e.to_string()))?;

        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| GenerationError::Parse("response has no message content".to_string()))?;

        parse_json_output(&content)
    }
}
