//! Prompt template filling.

use thiserror::Error;

pub const EMAIL_CONTENT_PLACEHOLDER: &str = "{email_content}";
pub const AVAILABLE_FOLDERS_PLACEHOLDER: &str = "{available_folders}";

/// Errors raised while building a classification prompt.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PromptError {
    #[error("Prompt template is missing the {0} placeholder")]
    TemplateValidation(&'static str),

    #[error("No {0} available")]
    ContentMissing(&'static str),

    #[error("Placeholder {0} was not replaced")]
    Substitution(&'static str),
}

/// Fills `template` with the message content and the folder catalogue.
///
/// Each placeholder is replaced once, folders first. A placeholder literal that
/// is still present afterwards (including one carried in by the message
/// content) is reported as a substitution error.
pub fn build_prompt(template: &str, content: &str, folders: &str) -> Result<String, PromptError> {
    for placeholder in [EMAIL_CONTENT_PLACEHOLDER, AVAILABLE_FOLDERS_PLACEHOLDER] {
        if !template.contains(placeholder) {
            return Err(PromptError::TemplateValidation(placeholder));
        }
    }

    if content.trim().is_empty() {
        return Err(PromptError::ContentMissing("email content"));
    }

    if folders.trim().is_empty() {
        return Err(PromptError::ContentMissing("folder structure"));
    }

    let prompt = template
        .replacen(AVAILABLE_FOLDERS_PLACEHOLDER, folders, 1)
        .replacen(EMAIL_CONTENT_PLACEHOLDER, content, 1);

    for placeholder in [EMAIL_CONTENT_PLACEHOLDER, AVAILABLE_FOLDERS_PLACEHOLDER] {
        if prompt.contains(placeholder) {
            return Err(PromptError::Substitution(placeholder));
        }
    }

    Ok(prompt)
}
