pub mod loader;
pub mod schema;

pub use loader::{
    default_settings_path, load_settings, load_settings_from_str, JsonFileStore, SettingsStore,
};
pub use schema::{AccountAuth, AccountConfig, Settings, SETTINGS_VERSION};
