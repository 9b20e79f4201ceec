//! Ollama `/api/generate` client.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{render_audit_prompt, Generator};
use crate::config::GenerationConfig;
use crate::error::AppError;

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Generator backed by a local Ollama chat model.
#[derive(Debug, Clone)]
pub struct OllamaGenerator {
    client: reqwest::Client,
    base_url: String,
    model: String,
    temperature: f32,
    timeout: Duration,
}

impl OllamaGenerator {
    pub fn new(config: &GenerationConfig) -> Result<Self, AppError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            timeout,
        })
    }

    fn map_error(&self, err: reqwest::Error) -> AppError {
        if err.is_timeout() {
            AppError::Timeout {
                operation: "generation request",
                after: self.timeout,
            }
        } else {
            AppError::Generation(err.to_string())
        }
    }
}

#[async_trait]
impl Generator for OllamaGenerator {
    async fn generate(&self, context: &str, topic: &str) -> Result<String, AppError> {
        let request = GenerateRequest {
            model: &self.model,
            prompt: render_audit_prompt(context, topic),
            stream: false,
            options: GenerateOptions {
                temperature: self.temperature,
            },
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Generation(format!(
                "Ollama returned {}: {}",
                status,
                body.trim()
            )));
        }

        let parsed: GenerateResponse = response.json().await.map_err(|e| self.map_error(e))?;
        Ok(parsed.response.trim().to_string())
    }
}
