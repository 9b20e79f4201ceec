//! Ollama `/api/embed` client.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{check_alignment, Embedder};
use crate::config::EmbeddingConfig;
use crate::error::AppError;

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Embedder backed by an Ollama server.
///
/// Large batches are split into sub-batches of `batch_size` sent one after
/// another; the combined result is only returned if every sub-batch succeeds.
#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    client: reqwest::Client,
    base_url: String,
    model: String,
    dimensions: usize,
    batch_size: usize,
    timeout: Duration,
}

impl OllamaEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self, AppError> {
        if config.provider != "ollama" {
            return Err(AppError::Validation(format!(
                "unsupported embedding provider '{}'",
                config.provider
            )));
        }
        if config.dimensions == 0 || config.batch_size == 0 {
            return Err(AppError::Validation(
                "embedding dimensions and batch_size must be positive".to_string(),
            ));
        }

        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        tracing::info!(
            base_url = %config.base_url,
            model = %config.model,
            dimensions = config.dimensions,
            batch_size = config.batch_size,
            "Ollama embedder initialized"
        );

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            dimensions: config.dimensions,
            batch_size: config.batch_size,
            timeout,
        })
    }

    fn embed_url(&self) -> String {
        format!("{}/api/embed", self.base_url)
    }

    async fn embed_chunk(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, AppError> {
        let request = EmbedRequest {
            model: &self.model,
            input: texts,
        };

        let response = self
            .client
            .post(self.embed_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Embedding(format!(
                "Ollama returned {}: {}",
                status,
                body.trim()
            )));
        }

        let parsed: EmbedResponse = response.json().await.map_err(|e| self.request_error(e))?;
        check_alignment(texts.len(), self.dimensions, &parsed.embeddings)?;
        Ok(parsed.embeddings)
    }

    fn request_error(&self, err: reqwest::Error) -> AppError {
        if err.is_timeout() {
            AppError::Timeout {
                operation: "embedding request",
                after: self.timeout,
            }
        } else {
            AppError::Http(err)
        }
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    fn model_id(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, AppError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut vectors = Vec::with_capacity(texts.len());
        for (i, chunk) in texts.chunks(self.batch_size).enumerate() {
            tracing::debug!(sub_batch = i, size = chunk.len(), model = %self.model, "Embedding");
            vectors.extend(self.embed_chunk(chunk).await?);
        }

        check_alignment(texts.len(), self.dimensions, &vectors)?;
        Ok(vectors)
    }
}
