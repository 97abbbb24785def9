//! Model backend seam and backend selection.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::Settings;

use super::ollama::OllamaBackend;

/// Selector value of the implemented backend.
pub const OLLAMA_SERVICE: &str = "ollama";

/// Errors from a model backend.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("AI service '{service}' is not implemented yet")]
    NotImplemented { service: String },

    #[error("API error: {status}")]
    Api { status: u16 },

    #[error("Request to model backend failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Failed to decode model response: {0}")]
    Decode(String),

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),
}

/// Something that turns a prompt into generated text.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    async fn generate(&self, prompt: &str) -> Result<String, ModelError>;
}

/// Backend parameters taken from settings.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub service: String,
    pub endpoint: String,
    pub model: String,
    pub timeout: Duration,
}

/// Picks the backend implementation for `config.service`.
pub fn backend_from_config(config: &BackendConfig) -> Result<Box<dyn ModelBackend>, ModelError> {
    match config.service.as_str() {
        OLLAMA_SERVICE => Ok(Box::new(OllamaBackend::new(
            config.endpoint.clone(),
            config.model.clone(),
            config.timeout,
        )?)),
        other => Ok(Box::new(UnimplementedBackend::new(other))),
    }
}

/// Backend selected by the `aiService` setting.
pub fn backend_from_settings(settings: &Settings) -> Result<Box<dyn ModelBackend>, ModelError> {
    backend_from_config(&settings.backend_config())
}

/// Stand-in for a configured but unimplemented service.
///
/// Every call fails; there is no fallback to another backend.
pub struct UnimplementedBackend {
    service: String,
}

impl UnimplementedBackend {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }
}

#[async_trait]
impl ModelBackend for UnimplementedBackend {
    fn name(&self) -> &str {
        &self.service
    }

    async fn generate(&self, _prompt: &str) -> Result<String, ModelError> {
        Err(ModelError::NotImplemented {
            service: self.service.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(service: &str) -> BackendConfig {
        BackendConfig {
            service: service.to_string(),
            endpoint: "http://localhost:11434/api/generate".to_string(),
            model: "llama2".to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_selects_ollama() {
        let backend = backend_from_config(&config("ollama")).unwrap();
        assert_eq!(backend.name(), "ollama");
    }

    #[tokio::test]
    async fn test_other_service_fails_explicitly() {
        let backend = backend_from_config(&config("openai")).unwrap();
        let err = backend.generate("hello").await.unwrap_err();
        assert!(matches!(err, ModelError::NotImplemented { ref service } if service == "openai"));
        assert!(err.to_string().contains("not implemented"));
    }

    #[test]
    fn test_api_error_carries_status() {
        let err = ModelError::Api { status: 503 };
        assert_eq!(err.to_string(), "API error: 503");
    }
}
