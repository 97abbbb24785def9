//! The mail host seam.
//!
//! Everything the pipeline needs from a mail store goes through [`MailHost`]:
//! accounts, folder trees, message listing and details, content, moves and
//! report drafts. The pipeline never talks to IMAP (or anything else) directly.

use async_trait::async_trait;

use super::error::Result;

/// A mail account known to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// Opaque id used in folder tokens.
    pub id: String,
    /// Display name, typically the email address.
    pub name: String,
}

/// A node of an account's folder tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderNode {
    pub account_id: String,
    /// Last path segment.
    pub name: String,
    /// Full path, `/`-separated with a leading `/` (e.g. `/INBOX/Invoices`).
    pub path: String,
    pub sub_folders: Vec<FolderNode>,
}

impl FolderNode {
    pub fn new(account_id: impl Into<String>, path: impl Into<String>) -> Self {
        let path = path.into();
        let name = path
            .rsplit('/')
            .find(|segment| !segment.is_empty())
            .unwrap_or_default()
            .to_string();
        Self {
            account_id: account_id.into(),
            name,
            path,
            sub_folders: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<FolderNode>) -> Self {
        self.sub_folders = children;
        self
    }
}

/// Inserts `path` (`/`-separated) into a folder forest, creating missing parents.
///
/// Existing nodes are matched by name at each level, so inserting `/A/B` and
/// then `/A/C` yields one `A` node with two children. Order of first insertion
/// is kept.
pub fn insert_folder_path(nodes: &mut Vec<FolderNode>, account_id: &str, path: &str) {
    let mut level = nodes;
    let mut prefix = String::new();
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        prefix.push('/');
        prefix.push_str(segment);
        let index = match level.iter().position(|n| n.name == segment) {
            Some(index) => index,
            None => {
                level.push(FolderNode::new(account_id, prefix.clone()));
                level.len() - 1
            }
        };
        level = &mut level[index].sub_folders;
    }
}

/// A message as listed in a folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHeader {
    /// Opaque, host-assigned identifier. Stable across runs.
    pub id: String,
    pub author: String,
    pub subject: String,
}

/// Per-message details fetched separately from the listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDetails {
    pub id: String,
    pub read: bool,
}

/// A plain-text draft stored into a folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub subject: String,
    pub body: String,
}

/// Host collaborator surface consumed by the pipeline.
#[async_trait]
pub trait MailHost: Send + Sync {
    async fn list_accounts(&self) -> Result<Vec<Account>>;

    /// Returns `Ok(None)` when no account has this id.
    async fn get_account(&self, account_id: &str) -> Result<Option<Account>>;

    /// Top-level folders of the account, each with its subtree.
    async fn folder_tree(&self, account: &Account) -> Result<Vec<FolderNode>>;

    async fn list_messages(&self, folder: &FolderNode) -> Result<Vec<MessageHeader>>;

    async fn message_details(&self, message_id: &str) -> Result<MessageDetails>;

    /// Plain-text content of the message.
    async fn message_content(&self, message_id: &str) -> Result<String>;

    async fn move_message(&self, message_id: &str, destination: &FolderNode) -> Result<()>;

    /// Stores `draft` as a draft message inside `folder`.
    async fn store_draft(&self, draft: &Draft, folder: &FolderNode) -> Result<()>;
}
