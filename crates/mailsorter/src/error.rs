use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MailsorterError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),

    #[error("Mail host error: {0}")]
    Email(#[from] crate::email::EmailError),

    #[error("Model error: {0}")]
    Model(#[from] crate::ai::ModelError),

    #[error("Prompt error: {0}")]
    Prompt(#[from] crate::ai::PromptError),

    #[error("Secret error: {0}")]
    Secret(#[from] crate::secrets::SecretError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read settings file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write settings file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse settings JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Settings validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },

    #[error("Invalid folder token in '{field}': '{token}' (expected accountId|path)")]
    InvalidFolderToken { field: &'static str, token: String },

    #[error("Duplicate account id '{id}'")]
    DuplicateAccount { id: String },

    #[error("Could not determine the home directory for the default settings path")]
    NoHomeDirectory,
}

pub type Result<T> = std::result::Result<T, MailsorterError>;
