//! Text embedding capability.
//!
//! An [`Embedder`] turns an ordered batch of texts into an equal-length,
//! order-aligned batch of fixed-dimension vectors. The call is
//! all-or-nothing: any failure fails the whole batch.

mod ollama;

use async_trait::async_trait;

use crate::error::AppError;

pub use ollama::OllamaEmbedder;

/// Batch embedding service.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Model identifier, for logging.
    fn model_id(&self) -> &str;

    /// Length of every returned vector.
    fn dimensions(&self) -> usize;

    /// Embeds `texts`; `result[i]` belongs to `texts[i]`.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, AppError>;

    /// Embeds a single query string.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, AppError> {
        let mut vectors = self.embed(&[text.to_string()]).await?;
        check_alignment(1, self.dimensions(), &vectors)?;
        vectors
            .pop()
            .ok_or_else(|| AppError::Embedding("no vector returned for query".to_string()))
    }
}

/// Verifies a batch result has one vector per input, each of `dimensions`.
pub fn check_alignment(
    expected: usize,
    dimensions: usize,
    vectors: &[Vec<f32>],
) -> Result<(), AppError> {
    if vectors.len() != expected {
        return Err(AppError::Embedding(format!(
            "expected {} vectors, got {}",
            expected,
            vectors.len()
        )));
    }
    if let Some(bad) = vectors.iter().find(|v| v.len() != dimensions) {
        return Err(AppError::DimensionMismatch {
            expected: dimensions,
            actual: bad.len(),
        });
    }
    Ok(())
}
