//! Locates live folder nodes for a [`FolderAddress`].

use tracing::{debug, warn};

use crate::email::error::Result;
use crate::email::host::{FolderNode, MailHost};

use super::address::{normalize_path, FolderAddress};

/// Deepest folder level visited by the tree walk.
pub const MAX_FOLDER_DEPTH: usize = 32;

/// Resolves addresses against a host's folder trees.
///
/// Nothing is cached: every call fetches and walks the account's tree again.
pub struct FolderResolver<'a> {
    host: &'a dyn MailHost,
}

impl<'a> FolderResolver<'a> {
    pub fn new(host: &'a dyn MailHost) -> Self {
        Self { host }
    }

    /// Returns the folder node for `address`, or `None` when the account or
    /// the path does not exist.
    pub async fn resolve(&self, address: &FolderAddress) -> Result<Option<FolderNode>> {
        let Some(account) = self.host.get_account(address.account_id()).await? else {
            debug!("Account '{}' not known to host", address.account_id());
            return Ok(None);
        };

        let tree = self.host.folder_tree(&account).await?;
        Ok(find_folder_by_path(&tree, address.normalized_path()).cloned())
    }
}

/// Depth-first, pre-order search for the first folder whose normalized path
/// equals the normalized `target`.
pub fn find_folder_by_path<'t>(folders: &'t [FolderNode], target: &str) -> Option<&'t FolderNode> {
    let target = normalize_path(target);
    search(folders, &target, 0)
}

fn search<'t>(folders: &'t [FolderNode], target: &str, depth: usize) -> Option<&'t FolderNode> {
    if depth >= MAX_FOLDER_DEPTH {
        warn!(
            "Folder tree deeper than {} levels, not descending further",
            MAX_FOLDER_DEPTH
        );
        return None;
    }

    for folder in folders {
        if normalize_path(&folder.path) == target {
            return Some(folder);
        }

        if !folder.sub_folders.is_empty() {
            if let Some(found) = search(&folder.sub_folders, target, depth + 1) {
                return Some(found);
            }
        }
    }
    None
}
