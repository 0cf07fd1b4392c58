//! HTTP embedding provider for OpenAI-compatible endpoints.
//!
//! This module is only available when the `remote` feature is enabled.
//! It speaks the `/v1/embeddings` wire format served by OpenAI and by
//! local inference servers (Ollama, vLLM, LM Studio).

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "text-embedding-3-small";
const DEFAULT_DIMENSIONS: usize = 1536;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// An [`EmbeddingProvider`] calling an OpenAI-compatible embeddings API.
///
/// Requests carry the client timeout; a timed-out or failed call surfaces
/// as [`RagError::EmbeddingError`] rather than hanging the ingestion path.
///
/// # Example
///
/// ```rust,ignore
/// use agent_rag::remote::RemoteEmbeddingProvider;
///
/// let provider = RemoteEmbeddingProvider::builder("sk-...")
///     .base_url("http://localhost:11434/v1")
///     .model("nomic-embed-text", 768)
///     .build()?;
/// ```
pub struct RemoteEmbeddingProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    dimensions: usize,
}

/// Builder for [`RemoteEmbeddingProvider`].
pub struct RemoteEmbeddingBuilder {
    base_url: String,
    api_key: String,
    model: String,
    dimensions: usize,
    timeout: Duration,
}

impl RemoteEmbeddingProvider {
    /// Start building a provider with the given API key.
    ///
    /// Local inference servers generally accept any non-empty key.
    pub fn builder(api_key: impl Into<String>) -> RemoteEmbeddingBuilder {
        RemoteEmbeddingBuilder {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            dimensions: DEFAULT_DIMENSIONS,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl RemoteEmbeddingBuilder {
    /// Point the provider at a different OpenAI-compatible server.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the model name and its embedding dimensionality.
    pub fn model(mut self, model: impl Into<String>, dimensions: usize) -> Self {
        self.model = model.into();
        self.dimensions = dimensions;
        self
    }

    /// Set the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the provider.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmbeddingError`] when the API key is empty or
    /// the HTTP client cannot be constructed.
    pub fn build(self) -> Result<RemoteEmbeddingProvider> {
        if self.api_key.is_empty() {
            return Err(RagError::EmbeddingError {
                provider: "remote".into(),
                message: "API key must not be empty".into(),
            });
        }

        let client = reqwest::Client::builder().timeout(self.timeout).build().map_err(|e| {
            RagError::EmbeddingError {
                provider: "remote".into(),
                message: format!("failed to build HTTP client: {e}"),
            }
        })?;

        Ok(RemoteEmbeddingProvider {
            client,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            api_key: self.api_key,
            model: self.model,
            dimensions: self.dimensions,
        })
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[async_trait]
impl EmbeddingProvider for RemoteEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let results = self.embed_batch(&[text]).await?;
        results.into_iter().next().ok_or_else(|| RagError::EmbeddingError {
            provider: "remote".into(),
            message: "API returned empty response".into(),
        })
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(batch_size = texts.len(), model = %self.model, "embedding batch via remote API");

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest { model: &self.model, input: texts.to_vec() })
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "remote embedding request failed");
                RagError::EmbeddingError {
                    provider: "remote".into(),
                    message: format!("request failed: {e}"),
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(%status, "remote embedding API error");
            return Err(RagError::EmbeddingError {
                provider: "remote".into(),
                message: format!("API returned {status}: {body}"),
            });
        }

        let parsed: EmbeddingResponse = response.json().await.map_err(|e| {
            RagError::EmbeddingError {
                provider: "remote".into(),
                message: format!("failed to parse response: {e}"),
            }
        })?;

        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}
