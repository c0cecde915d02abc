//! Deterministic mock provider for tests: no network call, same text
//! always produces the same vector.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Instant;

use crate::error::EmbedError;
use crate::provider::{EmbedRequest, EmbedResponse, EmbeddingProvider, HealthStatus, PingResponse, ProviderAdapter};
use crate::vector::EmbeddingVector;

#[derive(Debug, Clone)]
pub struct MockEmbeddingProvider {
    model_id: String,
    dimensions: i32,
}

impl MockEmbeddingProvider {
    pub fn new(model_id: impl Into<String>, dimensions: i32) -> Self {
        Self { model_id: model_id.into(), dimensions }
    }

    fn generate_embedding(&self, text: &str) -> Vec<f32> {
        let mut data = vec![0.0f32; self.dimensions as usize];
        for (i, byte) in text.bytes().enumerate() {
            let idx = i % self.dimensions as usize;
            data[idx] += (byte as f32) / 255.0;
        }
        let norm: f32 = data.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut data {
                *x /= norm;
            }
        }
        data
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<EmbeddingVector, EmbedError> {
        Ok(EmbeddingVector::new(self.generate_embedding(text), self.model_id.clone()))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<EmbeddingVector>, EmbedError> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    fn dimensions(&self) -> i32 {
        self.dimensions
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

pub struct MockProviderAdapter {
    provider_id: String,
    embedding: MockEmbeddingProvider,
}

impl MockProviderAdapter {
    pub fn new(provider_id: impl Into<String>) -> Self {
        Self { provider_id: provider_id.into(), embedding: MockEmbeddingProvider::new("mock-embed", 384) }
    }
}

#[async_trait]
impl ProviderAdapter for MockProviderAdapter {
    fn provider_id(&self) -> &str {
        &self.provider_id
    }

    async fn ping(&self) -> Result<PingResponse, EmbedError> {
        Ok(PingResponse {
            provider_id: self.provider_id.clone(),
            latency_ms: 1,
            health: HealthStatus::Healthy,
            metadata: HashMap::new(),
        })
    }

    async fn embed(&self, request: EmbedRequest) -> Result<EmbedResponse, EmbedError> {
        let start = Instant::now();
        let embedding = self.embedding.embed(&request.text).await?;
        Ok(EmbedResponse { embedding, request_id: request.request_id, latency_ms: start.elapsed().as_millis() as u64 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_embeds_to_correct_dimensions() {
        let provider = MockEmbeddingProvider::new("test-model", 384);
        let embedding = provider.embed("hello world").await.unwrap();
        assert_eq!(embedding.dimensions, 384);
        assert_eq!(embedding.data.len(), 384);
    }

    #[tokio::test]
    async fn mock_is_deterministic() {
        let provider = MockEmbeddingProvider::new("test-model", 384);
        let e1 = provider.embed("hello world").await.unwrap();
        let e2 = provider.embed("hello world").await.unwrap();
        assert_eq!(e1.data, e2.data);
    }
}
