//! Model-facing pieces: prompt building, backends and response parsing.

pub mod backend;
pub mod ollama;
pub mod prompt;
pub mod response;

pub use backend::{
    backend_from_config, backend_from_settings, BackendConfig, ModelBackend, ModelError, UnimplementedBackend,
    OLLAMA_SERVICE,
};
pub use ollama::OllamaBackend;
pub use prompt::{build_prompt, PromptError};
pub use response::{parse_response, ParsedModelResponse};
