//! Structured text generation
//!
//! The research loop talks to a language model only through
//! [`TextGenerator`]: a rendered [`Prompt`] goes in, a JSON value comes
//! out. Malformed output is a recoverable [`GenerationError`], never a
//! panic.

mod openai;
mod prompt;

pub use openai::ChatCompletionsGenerator;
pub use prompt::{Prompt, PromptTemplate};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation request failed: {0}")]
    Request(String),

    #[error("generation endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("model output is not valid JSON: {0}")]
    Parse(String),

    #[error("model output does not match the expected shape: {0}")]
    Schema(String),
}

impl GenerationError {
    /// Returns true when the model answered but the answer was unusable
    pub fn is_parse_failure(&self) -> bool {
        matches!(self, Self::Parse(_) | Self::Schema(_))
    }
}

/// Capability to answer a prompt with a JSON object
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &Prompt) -> Result<serde_json::Value, GenerationError>;
}

/// Runs a prompt and decodes the answer into `T`
pub async fn generate_structured<T: DeserializeOwned>(
    generator: &dyn TextGenerator,
    prompt: &Prompt,
) -> Result<T, GenerationError> {
    let value = generator.generate(prompt).await?;
    serde_json::from_value(value).map_err(|e| GenerationError::Schema(e.to_string()))
}

/// Parses model output as JSON, tolerating a surrounding Markdown code fence
pub fn parse_json_output(raw: &str) -> Result<serde_json::Value, GenerationError> {
    let trimmed = raw.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|s| s.strip_suffix("```"))
        .unwrap_or(trimmed);

    serde_json::from_str(unfenced.trim()).map_err(|e| GenerationError::Parse(e.to_string()))
}
