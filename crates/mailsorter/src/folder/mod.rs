//! Folder addressing: tokens, catalogue formatting and tree resolution.

pub mod address;
pub mod catalogue;
pub mod resolver;

pub use address::{normalize_path, serialize, FolderAddress};
pub use catalogue::format_folder_catalogue;
pub use resolver::{find_folder_by_path, FolderResolver, MAX_FOLDER_DEPTH};
