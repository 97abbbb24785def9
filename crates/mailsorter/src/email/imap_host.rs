//! [`MailHost`] over IMAP, one lazily connected session per account.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::AccountConfig;
use crate::folder::normalize_path;

use super::client::{ImapClient, RemoteMailbox};
use super::error::{EmailError, Result};
use super::host::{
    insert_folder_path, Account, Draft, FolderNode, MailHost, MessageDetails, MessageHeader,
};
use super::parser::{extract_text_content, parse_headers};

const DEFAULT_DELIMITER: &str = "/";

/// Host message id: `account:mailbox:uidvalidity:uid`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImapMessageId {
    pub account_id: String,
    pub mailbox: String,
    pub uidvalidity: u32,
    pub uid: u32,
}

impl ImapMessageId {
    pub fn encode(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.account_id, self.mailbox, self.uidvalidity, self.uid
        )
    }

    /// Mailbox names may contain `:`, account ids may not.
    pub fn decode(id: &str) -> Option<Self> {
        let mut tail = id.rsplitn(3, ':');
        let uid = tail.next()?.parse().ok()?;
        let uidvalidity = tail.next()?.parse().ok()?;
        let (account_id, mailbox) = tail.next()?.split_once(':')?;
        if account_id.is_empty() || mailbox.is_empty() {
            return None;
        }
        Some(Self {
            account_id: account_id.to_string(),
            mailbox: mailbox.to_string(),
            uidvalidity,
            uid,
        })
    }
}

/// Server mailbox name to `/A/B` path.
pub fn mailbox_to_path(name: &str, delimiter: Option<&str>) -> String {
    match delimiter {
        Some(d) if !d.is_empty() && d != DEFAULT_DELIMITER => {
            format!("/{}", name.split(d).collect::<Vec<_>>().join("/"))
        }
        _ => format!("/{}", name.trim_start_matches('/')),
    }
}

/// `/A/B` path to server mailbox name.
pub fn path_to_mailbox(path: &str, delimiter: &str) -> String {
    normalize_path(path).split('/').collect::<Vec<_>>().join(delimiter)
}

/// Builds the folder forest of an account from its `LIST` result.
pub fn build_folder_tree(account_id: &str, mailboxes: &[RemoteMailbox]) -> Vec<FolderNode> {
    let mut tree = Vec::new();
    for mailbox in mailboxes {
        let path = mailbox_to_path(&mailbox.name, mailbox.delimiter.as_deref());
        insert_folder_path(&mut tree, account_id, &path);
    }
    tree
}

/// Plain-text RFC 5322 message for `APPEND`.
pub fn compose_draft(from: &str, draft: &Draft) -> Vec<u8> {
    let body = draft.body.replace("\r\n", "\n").replace('\n', "\r\n");
    format!(
        "From: {}\r\nSubject: {}\r\nDate: {}\r\nMIME-Version: 1.0\r\nContent-Type: text/plain; charset=utf-8\r\nContent-Transfer-Encoding: 8bit\r\n\r\n{}\r\n",
        from,
        draft.subject,
        Utc::now().to_rfc2822(),
        body
    )
    .into_bytes()
}

#[derive(Default)]
struct HostState {
    clients: HashMap<String, ImapClient>,
    /// Server mailbox names by (account id, normalized path), from the last listing.
    mailbox_names: HashMap<(String, String), String>,
    delimiters: HashMap<String, String>,
}

impl HostState {
    fn mailbox_name(&self, account_id: &str, path: &str) -> String {
        let normalized = normalize_path(path);
        if let Some(name) = self
            .mailbox_names
            .get(&(account_id.to_string(), normalized.clone()))
        {
            return name.clone();
        }
        let delimiter = self
            .delimiters
            .get(account_id)
            .map(String::as_str)
            .unwrap_or(DEFAULT_DELIMITER);
        path_to_mailbox(&normalized, delimiter)
    }
}

pub struct ImapMailHost {
    accounts: Vec<AccountConfig>,
    state: Mutex<HostState>,
}

impl ImapMailHost {
    pub fn new(accounts: Vec<AccountConfig>) -> Self {
        Self {
            accounts,
            state: Mutex::new(HostState::default()),
        }
    }

    fn account_config(&self, account_id: &str) -> Result<&AccountConfig> {
        self.accounts
            .iter()
            .find(|a| a.id == account_id)
            .ok_or_else(|| EmailError::AccountNotFound(account_id.to_string()))
    }

    async fn client<'a>(
        &self,
        clients: &'a mut HashMap<String, ImapClient>,
        account_id: &str,
    ) -> Result<&'a mut ImapClient> {
        if !clients.contains_key(account_id) {
            let config = self.account_config(account_id)?.clone();
            clients.insert(account_id.to_string(), ImapClient::new(config));
        }
        let client = clients
            .get_mut(account_id)
            .ok_or_else(|| EmailError::AccountNotFound(account_id.to_string()))?;
        client.connect().await?;
        Ok(client)
    }

    fn decode_id(message_id: &str) -> Result<ImapMessageId> {
        ImapMessageId::decode(message_id)
            .ok_or_else(|| EmailError::MessageNotFound(message_id.to_string()))
    }

    /// Selects the message's mailbox and checks the id is still valid there.
    async fn select_message(client: &mut ImapClient, id: &ImapMessageId) -> Result<()> {
        let uidvalidity = client.select(&id.mailbox).await?;
        if uidvalidity != id.uidvalidity {
            warn!(
                "UIDVALIDITY of '{}' changed ({} -> {})",
                id.mailbox, id.uidvalidity, uidvalidity
            );
            return Err(EmailError::MessageNotFound(id.encode()));
        }
        Ok(())
    }

    /// Logs out of every open session.
    pub async fn disconnect_all(&self) {
        let mut state = self.state.lock().await;
        for (account_id, client) in state.clients.iter_mut() {
            if let Err(e) = client.disconnect().await {
                warn!("Failed to disconnect account '{}': {}", account_id, e);
            }
        }
        state.clients.clear();
    }
}

#[async_trait]
impl MailHost for ImapMailHost {
    async fn list_accounts(&self) -> Result<Vec<Account>> {
        Ok(self
            .accounts
            .iter()
            .map(|a| Account {
                id: a.id.clone(),
                name: a.display_name().to_string(),
            })
            .collect())
    }

    async fn get_account(&self, account_id: &str) -> Result<Option<Account>> {
        Ok(self.accounts.iter().find(|a| a.id == account_id).map(|a| Account {
            id: a.id.clone(),
            name: a.display_name().to_string(),
        }))
    }

    async fn folder_tree(&self, account: &Account) -> Result<Vec<FolderNode>> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let client = self.client(&mut state.clients, &account.id).await?;
        let mailboxes = client.list_mailboxes().await?;

        for mailbox in &mailboxes {
            let path = mailbox_to_path(&mailbox.name, mailbox.delimiter.as_deref());
            state.mailbox_names.insert(
                (account.id.clone(), normalize_path(&path)),
                mailbox.name.clone(),
            );
            if let Some(delimiter) = &mailbox.delimiter {
                state
                    .delimiters
                    .entry(account.id.clone())
                    .or_insert_with(|| delimiter.clone());
            }
        }

        Ok(build_folder_tree(&account.id, &mailboxes))
    }

    async fn list_messages(&self, folder: &FolderNode) -> Result<Vec<MessageHeader>> {
        let mut guard = self.state.lock().await;
        let mailbox = guard.mailbox_name(&folder.account_id, &folder.path);
        let client = self.client(&mut guard.clients, &folder.account_id).await?;

        let uidvalidity = client.select(&mailbox).await?;
        let uids = client.search_all().await?;
        let headers = client.fetch_headers(&uids).await?;
        debug!("Listed {} messages in '{}'", headers.len(), mailbox);

        Ok(headers
            .into_iter()
            .map(|fetched| {
                let info = parse_headers(&fetched.header);
                MessageHeader {
                    id: ImapMessageId {
                        account_id: folder.account_id.clone(),
                        mailbox: mailbox.clone(),
                        uidvalidity,
                        uid: fetched.uid,
                    }
                    .encode(),
                    author: info.author,
                    subject: info.subject,
                }
            })
            .collect())
    }

    async fn message_details(&self, message_id: &str) -> Result<MessageDetails> {
        let id = Self::decode_id(message_id)?;
        let mut state = self.state.lock().await;
        let client = self.client(&mut state.clients, &id.account_id).await?;
        Self::select_message(client, &id).await?;
        let read = client.fetch_seen(id.uid).await?;
        Ok(MessageDetails {
            id: message_id.to_string(),
            read,
        })
    }

    async fn message_content(&self, message_id: &str) -> Result<String> {
        let id = Self::decode_id(message_id)?;
        let mut state = self.state.lock().await;
        let client = self.client(&mut state.clients, &id.account_id).await?;
        Self::select_message(client, &id).await?;
        let raw = client.fetch_body_peek(id.uid).await?;
        extract_text_content(&raw)
    }

    async fn move_message(&self, message_id: &str, destination: &FolderNode) -> Result<()> {
        let id = Self::decode_id(message_id)?;
        if destination.account_id != id.account_id {
            return Err(EmailError::ConfigError(format!(
                "Cannot move message of account '{}' into account '{}'",
                id.account_id, destination.account_id
            )));
        }

        let mut guard = self.state.lock().await;
        let target = guard.mailbox_name(&destination.account_id, &destination.path);
        let client = self.client(&mut guard.clients, &id.account_id).await?;
        Self::select_message(client, &id).await?;
        client.move_uid(id.uid, &target).await?;
        info!("Moved message {} to '{}'", message_id, target);
        Ok(())
    }

    async fn store_draft(&self, draft: &Draft, folder: &FolderNode) -> Result<()> {
        let mut guard = self.state.lock().await;
        let mailbox = guard.mailbox_name(&folder.account_id, &folder.path);
        let client = self.client(&mut guard.clients, &folder.account_id).await?;
        let from = client.account().username.clone();
        client
            .append_draft(&mailbox, &compose_draft(&from, draft))
            .await?;
        info!("Stored draft '{}' in '{}'", draft.subject, mailbox);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_id_roundtrip() {
        let id = ImapMessageId {
            account_id: "acct1".to_string(),
            mailbox: "INBOX/Work:2026".to_string(),
            uidvalidity: 1700000000,
            uid: 42,
        };
        let encoded = id.encode();
        assert_eq!(encoded, "acct1:INBOX/Work:2026:1700000000:42");
        assert_eq!(ImapMessageId::decode(&encoded), Some(id));
    }

    #[test]
    fn test_message_id_rejects_garbage() {
        assert_eq!(ImapMessageId::decode("nope"), None);
        assert_eq!(ImapMessageId::decode("acct:INBOX:x:1"), None);
        assert_eq!(ImapMessageId::decode("acct:1:2"), None);
        assert_eq!(ImapMessageId::decode(":INBOX:1:2"), None);
    }

    #[test]
    fn test_mailbox_path_mapping() {
        assert_eq!(mailbox_to_path("INBOX", Some("/")), "/INBOX");
        assert_eq!(mailbox_to_path("INBOX.Invoices.2026", Some(".")), "/INBOX/Invoices/2026");
        assert_eq!(mailbox_to_path("INBOX/Work", Some("/")), "/INBOX/Work");
        assert_eq!(mailbox_to_path("Flat", None), "/Flat");

        assert_eq!(path_to_mailbox("/INBOX/Invoices/2026", "."), "INBOX.Invoices.2026");
        assert_eq!(path_to_mailbox("INBOX//Work/", "/"), "INBOX/Work");
    }

    #[test]
    fn test_build_folder_tree_from_listing() {
        let listing = vec![
            RemoteMailbox {
                name: "INBOX".to_string(),
                delimiter: Some(".".to_string()),
                selectable: true,
            },
            RemoteMailbox {
                name: "INBOX.Invoices".to_string(),
                delimiter: Some(".".to_string()),
                selectable: true,
            },
            RemoteMailbox {
                name: "Archive".to_string(),
                delimiter: Some(".".to_string()),
                selectable: false,
            },
        ];

        let tree = build_folder_tree("acct1", &listing);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].sub_folders[0].path, "/INBOX/Invoices");
        assert_eq!(tree[0].sub_folders[0].account_id, "acct1");
        assert_eq!(tree[1].name, "Archive");
    }

    #[test]
    fn test_mailbox_name_prefers_listing() {
        let mut state = HostState::default();
        state.mailbox_names.insert(
            ("acct1".to_string(), "INBOX/Invoices".to_string()),
            "INBOX.Invoices".to_string(),
        );
        state
            .delimiters
            .insert("acct1".to_string(), ".".to_string());

        assert_eq!(state.mailbox_name("acct1", "/INBOX/Invoices"), "INBOX.Invoices");
        assert_eq!(state.mailbox_name("acct1", "/INBOX/New"), "INBOX.New");
        assert_eq!(state.mailbox_name("other", "/INBOX/New"), "INBOX/New");
    }

    #[test]
    fn test_compose_draft() {
        let raw = compose_draft(
            "me@example.com",
            &Draft {
                subject: "Report".to_string(),
                body: "line 1\nline 2".to_string(),
            },
        );
        let text = String::from_utf8(raw).unwrap();
        assert!(text.starts_with("From: me@example.com\r\nSubject: Report\r\n"));
        assert!(text.ends_with("\r\n\r\nline 1\r\nline 2\r\n"));
    }

    #[tokio::test]
    async fn test_accounts_from_config() {
        let host = ImapMailHost::new(vec![AccountConfig {
            id: "acct1".to_string(),
            name: String::new(),
            host: "imap.example.com".to_string(),
            port: 993,
            username: "me@example.com".to_string(),
            auth: Default::default(),
        }]);

        let accounts = host.list_accounts().await.unwrap();
        assert_eq!(accounts[0].name, "me@example.com");
        assert!(host.get_account("acct1").await.unwrap().is_some());
        assert!(host.get_account("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unknown_message_id() {
        let host = ImapMailHost::new(Vec::new());
        let err = host.message_details("garbage").await.unwrap_err();
        assert!(matches!(err, EmailError::MessageNotFound(_)));
    }
}
