//! Ollama `/api/generate` backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::backend::{ModelBackend, ModelError, OLLAMA_SERVICE};

/// Model used when settings leave it empty.
pub const DEFAULT_MODEL: &str = "llama2";

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

/// Non-streaming generate response.
#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

pub struct OllamaBackend {
    client: Client,
    endpoint: String,
    model: String,
}

impl OllamaBackend {
    /// `endpoint` is the full generate URL, e.g. `http://localhost:11434/api/generate`.
    pub fn new(endpoint: String, model: String, timeout: Duration) -> Result<Self, ModelError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ModelError::ClientBuild(e.to_string()))?;
        let model = if model.trim().is_empty() {
            DEFAULT_MODEL.to_string()
        } else {
            model
        };
        Ok(Self {
            client,
            endpoint,
            model,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ModelBackend for OllamaBackend {
    fn name(&self) -> &str {
        OLLAMA_SERVICE
    }

    async fn generate(&self, prompt: &str) -> Result<String, ModelError> {
        debug!(
            "Calling Ollama at {} with model {} ({} prompt chars)",
            self.endpoint,
            self.model,
            prompt.len()
        );

        let resp = self
            .client
            .post(&self.endpoint)
            .json(&GenerateRequest {
                model: &self.model,
                prompt,
                stream: false,
            })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ModelError::Api {
                status: status.as_u16(),
            });
        }

        let body: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| ModelError::Decode(e.to_string()))?;

        debug!("Ollama answered with {} chars", body.response.len());
        Ok(body.response)
    }
}
