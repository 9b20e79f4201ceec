//! Text generation for the audit stage.
//!
//! A [`Generator`] answers one security question about one retrieval
//! context block. The answer is free text; severity is parsed from it once,
//! by [`Severity::from_analysis`](crate::models::Severity::from_analysis).

mod ollama;
mod prompt;

use async_trait::async_trait;

use crate::error::AppError;

pub use ollama::OllamaGenerator;
pub use prompt::render_audit_prompt;

/// Text-generation service.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Analyses `context` for vulnerabilities related to `topic`.
    async fn generate(&self, context: &str, topic: &str) -> Result<String, AppError>;
}
