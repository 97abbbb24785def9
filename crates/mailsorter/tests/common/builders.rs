//! Builders for settings documents and model answers.

#![allow(dead_code)]

use mailsorter::config::{AccountConfig, Settings};

pub const TEST_PROMPT: &str = "Pick a folder.\n\nFolders:\n{available_folders}\n\nEmail:\n{email_content}\n";

/// A well-formed model answer.
pub fn answer(summary: &str, folder_token: &str) -> String {
    format!(
        "Sure, here you go.\n---START---\n#ZUSAMMENFASSUNG\n{}\n#ORDNER\n{}\n---ENDE---\n",
        summary, folder_token
    )
}

/// Builder for `Settings` used by batch tests.
pub struct SettingsBuilder {
    settings: Settings,
}

impl SettingsBuilder {
    /// Settings with the test prompt and nothing else configured.
    pub fn new() -> Self {
        Self {
            settings: Settings {
                processing_prompt: TEST_PROMPT.to_string(),
                ..Settings::default()
            },
        }
    }

    pub fn source(mut self, token: &str) -> Self {
        self.settings.source_folders.push(token.to_string());
        self
    }

    pub fn target(mut self, token: &str) -> Self {
        self.settings.target_folders.push(token.to_string());
        self
    }

    pub fn summary_folder(mut self, token: &str) -> Self {
        self.settings.summary_folder_id = Some(token.to_string());
        self
    }

    pub fn unread_only(mut self, unread_only: bool) -> Self {
        self.settings.unread_only = unread_only;
        self
    }

    pub fn prompt(mut self, prompt: &str) -> Self {
        self.settings.processing_prompt = prompt.to_string();
        self
    }

    pub fn account(mut self, id: &str, name: &str) -> Self {
        self.settings.accounts.push(AccountConfig {
            id: id.to_string(),
            name: name.to_string(),
            host: "imap.example.com".to_string(),
            port: 993,
            username: name.to_string(),
            auth: Default::default(),
        });
        self
    }

    pub fn build(self) -> Settings {
        self.settings
    }
}

impl Default for SettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
