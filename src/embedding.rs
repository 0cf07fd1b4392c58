//! Embedding provider trait and the built-in feature-hashing provider.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use async_trait::async_trait;

use crate::error::Result;

/// A provider that generates vector embeddings from text input.
///
/// Implementations wrap specific embedding backends behind a unified async
/// interface. The default [`embed_batch`](EmbeddingProvider::embed_batch)
/// implementation calls [`embed`](EmbeddingProvider::embed) sequentially;
/// backends that support native batching should override it.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of text inputs.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;

    /// Identifier of the model behind this provider, recorded in
    /// collection info.
    fn model_id(&self) -> &str;
}

/// A deterministic, offline embedding provider using token feature hashing.
///
/// Tokens are lowercased alphanumeric runs; each token is hashed into one of
/// `dimensions` buckets with a sign bit, and the resulting vector is
/// L2-normalized. Documents sharing vocabulary score high under cosine
/// similarity, which is enough for local development and for exercising the
/// full ingest-and-search path without a model download or a network call.
/// Swap in a real provider for production-quality retrieval.
#[derive(Debug, Clone)]
pub struct HashingEmbeddingProvider {
    dimensions: usize,
    model_id: String,
}

impl HashingEmbeddingProvider {
    /// Create a provider with the default dimensionality (384).
    pub fn new() -> Self {
        Self::with_dimensions(384)
    }

    /// Create a provider with a custom dimensionality.
    pub fn with_dimensions(dimensions: usize) -> Self {
        Self { dimensions, model_id: format!("feature-hashing-{dimensions}") }
    }

    fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];

        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase)
        {
            let mut hasher = DefaultHasher::new();
            token.hash(&mut hasher);
            let digest = hasher.finish();

            let bucket = (digest % self.dimensions as u64) as usize;
            let sign = if digest & (1 << 63) == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }

        vector
    }
}

impl Default for HashingEmbeddingProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_sync(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_sync(text)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
