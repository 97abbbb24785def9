pub mod ai;
pub mod assist;
pub mod categorizer;
pub mod config;
pub mod db;
pub mod email;
pub mod error;
pub mod folder;
pub mod logging;
pub mod pipeline;
pub mod secrets;

pub use ai::{backend_from_settings, ModelBackend, ModelError, OllamaBackend};
pub use assist::{analyze_message, summarize_message};
pub use categorizer::FolderMatcher;
pub use config::{load_settings, JsonFileStore, Settings, SettingsStore};
pub use db::Database;
pub use email::{ImapMailHost, MailHost, MemoryMailHost, MessageTracker};
pub use error::{ConfigError, MailsorterError, Result};
pub use folder::{FolderAddress, FolderResolver};
pub use logging::{init_logging, LogFormat};
pub use pipeline::{run_batch, BatchRunner, RunOutcome, RunReport};
pub use secrets::{SecretError, SecretSource};
