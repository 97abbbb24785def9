use thiserror::Error;

use crate::ai::{ModelError, PromptError};
use crate::db::DatabaseError;
use crate::email::EmailError;

/// Failures inside a batch run. Each one is caught at message or folder scope
/// and ends up as a line in the run's error list.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Folder not found: {0}")]
    FolderNotFound(String),

    #[error("No matching folder found for: {subject}")]
    NoMatch { subject: String },

    #[error("Prompt error: {0}")]
    Prompt(#[from] PromptError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Mail host error: {0}")]
    Email(#[from] EmailError),

    #[error("Failed to record processed message: {0}")]
    Database(#[from] DatabaseError),

    #[error("Failed to create report: {0}")]
    Report(String),
}
