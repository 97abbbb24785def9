use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ai::BackendConfig;
use crate::folder::FolderAddress;
use crate::secrets::{SecretError, SecretSource};

pub const SETTINGS_VERSION: &str = "1.0";

/// The settings document. Read once per run and never mutated by it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: String,

    /// Backend selector. Only `ollama` is implemented.
    #[serde(default = "default_ai_service")]
    pub ai_service: String,

    #[serde(default = "default_backend_endpoint", alias = "ollamaEndpoint")]
    pub backend_endpoint: String,

    #[serde(default = "default_backend_model", alias = "ollamaModel")]
    pub backend_model: String,

    #[serde(default, skip_serializing_if = "Option::is_none", alias = "openaiKey")]
    pub alt_service_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none", alias = "openaiModel")]
    pub alt_service_model: Option<String>,

    /// Folder tokens (`accountId|path`) whose messages are classified.
    #[serde(default)]
    pub source_folders: Vec<String>,

    /// Candidate folder tokens the model may choose from.
    #[serde(default)]
    pub target_folders: Vec<String>,

    /// Folder token receiving the run report.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary_folder_id: Option<String>,

    #[serde(default)]
    pub processing_prompt: String,

    #[serde(default)]
    pub unread_only: bool,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub accounts: Vec<AccountConfig>,
}

fn default_version() -> String {
    SETTINGS_VERSION.to_string()
}

fn default_ai_service() -> String {
    crate::ai::OLLAMA_SERVICE.to_string()
}

fn default_backend_endpoint() -> String {
    "http://localhost:11434/api/generate".to_string()
}

fn default_backend_model() -> String {
    crate::ai::ollama::DEFAULT_MODEL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    120
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            ai_service: default_ai_service(),
            backend_endpoint: default_backend_endpoint(),
            backend_model: default_backend_model(),
            alt_service_key: None,
            alt_service_model: None,
            source_folders: Vec::new(),
            target_folders: Vec::new(),
            summary_folder_id: None,
            processing_prompt: String::new(),
            unread_only: false,
            request_timeout_secs: default_request_timeout_secs(),
            accounts: Vec::new(),
        }
    }
}

impl Settings {
    pub fn source_addresses(&self) -> Vec<FolderAddress> {
        self.source_folders
            .iter()
            .map(|t| FolderAddress::parse(t))
            .collect()
    }

    pub fn target_addresses(&self) -> Vec<FolderAddress> {
        self.target_folders
            .iter()
            .map(|t| FolderAddress::parse(t))
            .collect()
    }

    /// The report folder, if one is configured and non-empty.
    pub fn summary_address(&self) -> Option<FolderAddress> {
        self.summary_folder_id
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .map(FolderAddress::parse)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn backend_config(&self) -> BackendConfig {
        BackendConfig {
            service: self.ai_service.clone(),
            endpoint: self.backend_endpoint.clone(),
            model: self.backend_model.clone(),
            timeout: self.request_timeout(),
        }
    }

    pub fn account(&self, id: &str) -> Option<&AccountConfig> {
        self.accounts.iter().find(|a| a.id == id)
    }
}

/// An IMAP account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountConfig {
    /// Opaque id used in folder tokens.
    pub id: String,

    /// Display name shown in the folder catalogue, typically the address.
    #[serde(default)]
    pub name: String,

    pub host: String,

    #[serde(default = "default_imap_port")]
    pub port: u16,

    pub username: String,

    #[serde(default)]
    pub auth: AccountAuth,
}

fn default_imap_port() -> u16 {
    993
}

impl AccountConfig {
    /// The display name, falling back to the username.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.username
        } else {
            &self.name
        }
    }
}

/// Password sources for an account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountAuth {
    /// Direct password value. Prefer `passwordFile` or `passwordEnvVar`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_file: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_env_var: Option<String>,
}

impl AccountAuth {
    pub fn source(&self) -> SecretSource<'_> {
        SecretSource {
            direct: self.password.as_deref(),
            file: self.password_file.as_deref(),
            env_var: self.password_env_var.as_deref(),
        }
    }

    pub fn resolve_password(&self) -> Result<secrecy::SecretString, SecretError> {
        self.source().resolve()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_defaults_from_empty_document() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.ai_service, "ollama");
        assert_eq!(settings.backend_endpoint, "http://localhost:11434/api/generate");
        assert_eq!(settings.backend_model, "llama2");
        assert_eq!(settings.request_timeout(), Duration::from_secs(120));
        assert!(!settings.unread_only);
    }

    #[test]
    fn test_camel_case_keys() {
        let settings: Settings = serde_json::from_str(
            r#"{
                "aiService": "ollama",
                "backendEndpoint": "http://gpu-box:11434/api/generate",
                "backendModel": "mistral",
                "sourceFolders": ["acct1|/INBOX"],
                "targetFolders": ["acct1|/Work", "acct1|/Private"],
                "summaryFolderId": "acct1|/Reports",
                "processingPrompt": "{email_content} {available_folders}",
                "unreadOnly": true
            }"#,
        )
        .unwrap();

        assert_eq!(settings.backend_model, "mistral");
        assert_eq!(settings.source_addresses()[0].path(), "/INBOX");
        assert_eq!(settings.target_addresses().len(), 2);
        assert_eq!(settings.summary_address().unwrap().token(), "acct1|/Reports");
        assert!(settings.unread_only);

        let json = serde_json::to_value(&settings).unwrap();
        assert_eq!(json["summaryFolderId"], "acct1|/Reports");
        assert!(json.get("altServiceKey").is_none());
    }

    #[test]
    fn test_legacy_key_names() {
        let settings: Settings = serde_json::from_str(
            r#"{"ollamaEndpoint": "http://x/api/generate", "ollamaModel": "phi", "openaiKey": "sk", "openaiModel": "gpt"}"#,
        )
        .unwrap();
        assert_eq!(settings.backend_endpoint, "http://x/api/generate");
        assert_eq!(settings.backend_model, "phi");
        assert_eq!(settings.alt_service_key.as_deref(), Some("sk"));
        assert_eq!(settings.alt_service_model.as_deref(), Some("gpt"));
    }

    #[test]
    fn test_blank_summary_folder_is_none() {
        let settings = Settings {
            summary_folder_id: Some("  ".to_string()),
            ..Settings::default()
        };
        assert!(settings.summary_address().is_none());
    }

    #[test]
    fn test_backend_config() {
        let settings = Settings {
            ai_service: "openai".to_string(),
            alt_service_key: Some("sk-123".to_string()),
            request_timeout_secs: 7,
            ..Settings::default()
        };
        let config = settings.backend_config();
        assert_eq!(config.service, "openai");
        assert_eq!(config.timeout, Duration::from_secs(7));
        assert_eq!(config.model, settings.backend_model);
    }

    #[test]
    fn test_account_defaults() {
        let account: AccountConfig = serde_json::from_str(
            r#"{"id": "acct1", "host": "imap.example.com", "username": "me@example.com",
                "auth": {"passwordEnvVar": "MAIL_PW"}}"#,
        )
        .unwrap();
        assert_eq!(account.port, 993);
        assert_eq!(account.display_name(), "me@example.com");
        assert_eq!(account.auth.password_env_var.as_deref(), Some("MAIL_PW"));
        assert!(account.auth.source().is_configured());
    }

    #[test]
    fn test_direct_password() {
        let auth = AccountAuth {
            password: Some("hunter2".to_string()),
            ..AccountAuth::default()
        };
        assert_eq!(auth.resolve_password().unwrap().expose_secret(), "hunter2");
    }
}
