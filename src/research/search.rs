//! Web search collaborator

use crate::config::SearchConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

/// One ranked search result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl SearchHit {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: None,
            description: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search request failed: {0}")]
    Request(String),

    #[error("search endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to parse search response: {0}")]
    Parse(String),
}

/// Capability to turn a query into ranked result URLs
#[async_trait]
pub trait SearchEngine: Send + Sync {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, SearchError>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<SearchHit>,
}

/// Search over a FireCrawl-style `POST {query, limit}` endpoint
pub struct HttpSearchEngine {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl HttpSearchEngine {
    pub fn new(config: &SearchConfig, api_key: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: api_key.into(),
        })
    }

    /// Reads the API key from the environment variable named in the config
    pub fn from_env(config: &SearchConfig) -> crate::Result<Self> {
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
impl SearchEngine for HttpSearchEngine {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, SearchError> {
        tracing::debug!("Searching for {:?} (limit {})", query, limit);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&json!({ "query": query, "limit": limit }))
            .send()
            .await
            .map_err(|e| SearchError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| SearchError::Parse(e.to_string()))?;

        Ok(parsed
            .data
            .into_iter()
            .filter(|hit| !hit.url.trim().is_empty())
            .take(limit)
            .collect())
    }
}
