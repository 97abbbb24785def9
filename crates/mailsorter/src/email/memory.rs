//! In-memory [`MailHost`] for dry runs and tests.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::folder::normalize_path;

use super::error::{EmailError, Result};
use super::host::{
    insert_folder_path, Account, Draft, FolderNode, MailHost, MessageDetails, MessageHeader,
};

/// A message held by [`MemoryMailHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryMessage {
    pub id: String,
    pub author: String,
    pub subject: String,
    pub read: bool,
    pub content: String,
}

impl MemoryMessage {
    pub fn new(id: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            author: String::new(),
            subject: subject.into(),
            read: false,
            content: String::new(),
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn with_read(mut self, read: bool) -> Self {
        self.read = read;
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }
}

/// A move performed through the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedMove {
    pub message_id: String,
    pub account_id: String,
    pub path: String,
}

/// A draft stored through the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedDraft {
    pub account_id: String,
    pub path: String,
    pub draft: Draft,
}

#[derive(Debug, Clone)]
struct Stored {
    account_id: String,
    /// Normalized folder path.
    folder: String,
    message: MemoryMessage,
}

#[derive(Default)]
struct MemoryState {
    accounts: Vec<Account>,
    trees: Vec<(String, Vec<FolderNode>)>,
    messages: Vec<Stored>,
    moves: Vec<RecordedMove>,
    drafts: Vec<RecordedDraft>,
    failing_folders: HashSet<(String, String)>,
    failing_details: HashSet<String>,
    failing_content: HashSet<String>,
    failing_moves: HashSet<String>,
    failing_drafts: bool,
}

impl MemoryState {
    fn tree_mut(&mut self, account_id: &str) -> &mut Vec<FolderNode> {
        let index = match self.trees.iter().position(|(id, _)| id == account_id) {
            Some(index) => index,
            None => {
                self.trees.push((account_id.to_string(), Vec::new()));
                self.trees.len() - 1
            }
        };
        &mut self.trees[index].1
    }

    fn message(&self, message_id: &str) -> Result<&Stored> {
        self.messages
            .iter()
            .find(|s| s.message.id == message_id)
            .ok_or_else(|| EmailError::MessageNotFound(message_id.to_string()))
    }
}

/// Accounts, folders and messages kept in memory.
///
/// Moves relocate messages between folders and are recorded, as are stored
/// drafts. Individual operations can be made to fail.
#[derive(Default)]
pub struct MemoryMailHost {
    state: Mutex<MemoryState>,
}

impl MemoryMailHost {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| EmailError::ProtocolError("memory host lock poisoned".to_string()))
    }

    fn state_unchecked(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn add_account(&self, id: impl Into<String>, name: impl Into<String>) {
        let account = Account {
            id: id.into(),
            name: name.into(),
        };
        let mut state = self.state_unchecked();
        state.tree_mut(&account.id);
        state.accounts.push(account);
    }

    /// Adds a folder and any missing parents.
    pub fn add_folder(&self, account_id: &str, path: &str) {
        insert_folder_path(self.state_unchecked().tree_mut(account_id), account_id, path);
    }

    /// Adds a message, creating its folder if needed.
    pub fn add_message(&self, account_id: &str, path: &str, message: MemoryMessage) {
        let mut state = self.state_unchecked();
        insert_folder_path(state.tree_mut(account_id), account_id, path);
        state.messages.push(Stored {
            account_id: account_id.to_string(),
            folder: normalize_path(path),
            message,
        });
    }

    /// Ids of the messages currently in a folder, in insertion order.
    pub fn messages_in(&self, account_id: &str, path: &str) -> Vec<String> {
        let folder = normalize_path(path);
        self.state_unchecked()
            .messages
            .iter()
            .filter(|s| s.account_id == account_id && s.folder == folder)
            .map(|s| s.message.id.clone())
            .collect()
    }

    pub fn moves(&self) -> Vec<RecordedMove> {
        self.state_unchecked().moves.clone()
    }

    pub fn drafts(&self) -> Vec<RecordedDraft> {
        self.state_unchecked().drafts.clone()
    }

    /// Makes listing the folder fail.
    pub fn fail_listing(&self, account_id: &str, path: &str) {
        self.state_unchecked()
            .failing_folders
            .insert((account_id.to_string(), normalize_path(path)));
    }

    pub fn fail_details(&self, message_id: &str) {
        self.state_unchecked()
            .failing_details
            .insert(message_id.to_string());
    }

    pub fn fail_content(&self, message_id: &str) {
        self.state_unchecked()
            .failing_content
            .insert(message_id.to_string());
    }

    pub fn fail_move(&self, message_id: &str) {
        self.state_unchecked()
            .failing_moves
            .insert(message_id.to_string());
    }

    pub fn fail_drafts(&self) {
        self.state_unchecked().failing_drafts = true;
    }
}

fn injected(what: &str, target: &str) -> EmailError {
    EmailError::ProtocolError(format!("{} failed for '{}'", what, target))
}

#[async_trait]
impl MailHost for MemoryMailHost {
    async fn list_accounts(&self) -> Result<Vec<Account>> {
        Ok(self.state()?.accounts.clone())
    }

    async fn get_account(&self, account_id: &str) -> Result<Option<Account>> {
        Ok(self
            .state()?
            .accounts
            .iter()
            .find(|a| a.id == account_id)
            .cloned())
    }

    async fn folder_tree(&self, account: &Account) -> Result<Vec<FolderNode>> {
        let state = self.state()?;
        state
            .trees
            .iter()
            .find(|(id, _)| *id == account.id)
            .map(|(_, tree)| tree.clone())
            .ok_or_else(|| EmailError::AccountNotFound(account.id.clone()))
    }

    async fn list_messages(&self, folder: &FolderNode) -> Result<Vec<MessageHeader>> {
        let state = self.state()?;
        let path = normalize_path(&folder.path);
        if state
            .failing_folders
            .contains(&(folder.account_id.clone(), path.clone()))
        {
            return Err(injected("listing", &folder.path));
        }

        Ok(state
            .messages
            .iter()
            .filter(|s| s.account_id == folder.account_id && s.folder == path)
            .map(|s| MessageHeader {
                id: s.message.id.clone(),
                author: s.message.author.clone(),
                subject: s.message.subject.clone(),
            })
            .collect())
    }

    async fn message_details(&self, message_id: &str) -> Result<MessageDetails> {
        let state = self.state()?;
        if state.failing_details.contains(message_id) {
            return Err(injected("details", message_id));
        }
        let stored = state.message(message_id)?;
        Ok(MessageDetails {
            id: message_id.to_string(),
            read: stored.message.read,
        })
    }

    async fn message_content(&self, message_id: &str) -> Result<String> {
        let state = self.state()?;
        if state.failing_content.contains(message_id) {
            return Err(injected("content", message_id));
        }
        Ok(state.message(message_id)?.message.content.clone())
    }

    async fn move_message(&self, message_id: &str, destination: &FolderNode) -> Result<()> {
        let mut state = self.state()?;
        if state.failing_moves.contains(message_id) {
            return Err(injected("move", message_id));
        }

        let stored = state
            .messages
            .iter_mut()
            .find(|s| s.message.id == message_id)
            .ok_or_else(|| EmailError::MessageNotFound(message_id.to_string()))?;
        stored.account_id = destination.account_id.clone();
        stored.folder = normalize_path(&destination.path);

        state.moves.push(RecordedMove {
            message_id: message_id.to_string(),
            account_id: destination.account_id.clone(),
            path: destination.path.clone(),
        });
        Ok(())
    }

    async fn store_draft(&self, draft: &Draft, folder: &FolderNode) -> Result<()> {
        let mut state = self.state()?;
        if state.failing_drafts {
            return Err(injected("draft", &folder.path));
        }
        state.drafts.push(RecordedDraft {
            account_id: folder.account_id.clone(),
            path: folder.path.clone(),
            draft: draft.clone(),
        });
        Ok(())
    }
}
