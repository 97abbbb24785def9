use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::config::schema::{Settings, SETTINGS_VERSION};
use crate::error::ConfigError;
use crate::folder::address::TOKEN_SEPARATOR;

const SCHEMA_JSON: &str = include_str!("../../schema/settings-v1.json");

/// Returns the canonical settings path: `~/.mailsorter/settings.json`.
pub fn default_settings_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".mailsorter").join("settings.json"))
}

pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_settings_from_str(&content)
}

pub fn load_settings_from_str(content: &str) -> Result<Settings, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    validate_schema(&json_value)?;

    let settings: Settings = serde_json::from_value(json_value)?;

    validate_settings(&settings)?;

    Ok(settings)
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();
    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

/// Checks what the schema cannot express.
///
/// Prompt placeholders are not checked here. A bad template is reported by
/// the prompt builder, once per message.
fn validate_settings(settings: &Settings) -> Result<(), ConfigError> {
    if settings.version != SETTINGS_VERSION {
        return Err(ConfigError::Validation {
            message: format!("Unsupported settings version: {}", settings.version),
        });
    }

    check_tokens("sourceFolders", &settings.source_folders)?;
    check_tokens("targetFolders", &settings.target_folders)?;
    if let Some(summary) = settings.summary_folder_id.as_deref() {
        if !summary.trim().is_empty() {
            check_tokens("summaryFolderId", std::slice::from_ref(&summary.to_string()))?;
        }
    }

    let mut account_ids = HashSet::new();
    for account in &settings.accounts {
        if !account_ids.insert(account.id.as_str()) {
            return Err(ConfigError::DuplicateAccount {
                id: account.id.clone(),
            });
        }
    }

    Ok(())
}

fn check_tokens(field: &'static str, tokens: &[String]) -> Result<(), ConfigError> {
    for token in tokens {
        match token.split_once(TOKEN_SEPARATOR) {
            Some((account_id, _)) if !account_id.is_empty() => {}
            _ => {
                return Err(ConfigError::InvalidFolderToken {
                    field,
                    token: token.clone(),
                })
            }
        }
    }
    Ok(())
}

/// Where settings are loaded from and saved to.
pub trait SettingsStore: Send + Sync {
    fn load(&self) -> Result<Settings, ConfigError>;
    fn save(&self, settings: &Settings) -> Result<(), ConfigError>;
}

/// Settings kept as a pretty-printed JSON file.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at [`default_settings_path`].
    pub fn at_default_path() -> Result<Self, ConfigError> {
        default_settings_path()
            .map(Self::new)
            .ok_or(ConfigError::NoHomeDirectory)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for JsonFileStore {
    fn load(&self) -> Result<Settings, ConfigError> {
        load_settings(&self.path)
    }

    fn save(&self, settings: &Settings) -> Result<(), ConfigError> {
        let write_err = |e: std::io::Error| ConfigError::WriteFile {
            path: self.path.clone(),
            source: e,
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let json = serde_json::to_string_pretty(settings)?;
        std::fs::write(&self.path, json).map_err(write_err)?;
        log::info!("Saved settings to {}", self.path.display());
        Ok(())
    }
}
