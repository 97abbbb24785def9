//! IMAP client for one configured account.

use async_imap::types::{Flag, NameAttribute};
use async_imap::Session;
use async_native_tls::TlsConnector;
use futures_util::StreamExt;
use log::{debug, info, warn};
use secrecy::ExposeSecret;

use crate::config::AccountConfig;

use super::error::{EmailError, Result};

/// Type alias for the underlying async stream (using async-std compatible TcpStream).
type AsyncTcpStream = async_io::Async<std::net::TcpStream>;

/// Type alias for the TLS stream used by the IMAP session.
type TlsStream = async_native_tls::TlsStream<AsyncTcpStream>;

/// A mailbox as returned by `LIST`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteMailbox {
    /// Server-side mailbox name, e.g. `INBOX.Invoices`.
    pub name: String,
    pub delimiter: Option<String>,
    pub selectable: bool,
}

/// Listing data of one message.
#[derive(Debug, Clone)]
pub struct FetchedHeader {
    pub uid: u32,
    pub seen: bool,
    pub header: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SelectedMailbox {
    name: String,
    uidvalidity: u32,
}

/// IMAP client for listing, reading and moving messages of one account.
pub struct ImapClient {
    session: Option<Session<TlsStream>>,
    account: AccountConfig,
    selected: Option<SelectedMailbox>,
}

impl ImapClient {
    pub fn new(account: AccountConfig) -> Self {
        Self {
            session: None,
            account,
            selected: None,
        }
    }

    pub fn account(&self) -> &AccountConfig {
        &self.account
    }

    /// Connects over TLS and logs in. A no-op when already connected.
    pub async fn connect(&mut self) -> Result<()> {
        if self.session.is_some() {
            debug!("Already connected to IMAP server");
            return Ok(());
        }

        let password = self
            .account
            .auth
            .resolve_password()
            .map_err(|e| EmailError::CredentialsNotFound(format!("{}: {}", self.account.id, e)))?;
        if self.account.auth.password.is_some() {
            warn!(
                "Account '{}' uses a direct password value. Consider passwordEnvVar or passwordFile instead.",
                self.account.id
            );
        }

        let addr = format!("{}:{}", self.account.host, self.account.port);
        info!("Connecting to IMAP server at {}", addr);

        // Establish TCP connection using std::net and wrap with async-io
        let std_stream = std::net::TcpStream::connect(&addr)
            .map_err(|e| EmailError::ConnectionFailed(e.to_string()))?;
        std_stream
            .set_nonblocking(true)
            .map_err(|e| EmailError::ConnectionFailed(e.to_string()))?;
        let tcp_stream = async_io::Async::new(std_stream)
            .map_err(|e| EmailError::ConnectionFailed(e.to_string()))?;

        let tls_stream = TlsConnector::new()
            .connect(&self.account.host, tcp_stream)
            .await
            .map_err(|e| EmailError::TlsError(e.to_string()))?;

        let client = async_imap::Client::new(tls_stream);
        let session = client
            .login(&self.account.username, password.expose_secret())
            .await
            .map_err(|(e, _)| EmailError::AuthenticationFailed(e.to_string()))?;

        info!("Authenticated to IMAP server as {}", self.account.username);
        self.session = Some(session);
        Ok(())
    }

    fn session(&mut self) -> Result<&mut Session<TlsStream>> {
        self.session
            .as_mut()
            .ok_or_else(|| EmailError::ConnectionFailed("Not connected".to_string()))
    }

    /// Lists every mailbox of the account.
    pub async fn list_mailboxes(&mut self) -> Result<Vec<RemoteMailbox>> {
        let session = self.session()?;
        let mut names = session.list(Some(""), Some("*")).await?;

        let mut mailboxes = Vec::new();
        while let Some(name) = names.next().await {
            let name = name?;
            mailboxes.push(RemoteMailbox {
                name: name.name().to_string(),
                delimiter: name.delimiter().map(|d| d.to_string()),
                selectable: !name
                    .attributes()
                    .iter()
                    .any(|a| matches!(a, NameAttribute::NoSelect)),
            });
        }

        debug!("Listed {} mailboxes", mailboxes.len());
        Ok(mailboxes)
    }

    /// Selects a mailbox read-write, reusing the current selection.
    ///
    /// Returns the mailbox UIDVALIDITY.
    pub async fn select(&mut self, mailbox: &str) -> Result<u32> {
        if let Some(selected) = &self.selected {
            if selected.name == mailbox {
                return Ok(selected.uidvalidity);
            }
        }

        let session = self.session()?;
        let status = session.select(mailbox).await.map_err(|e| {
            if e.to_string().contains("NO") {
                EmailError::FolderNotFound(mailbox.to_string())
            } else {
                EmailError::ProtocolError(e.to_string())
            }
        })?;

        let uidvalidity = status.uid_validity.ok_or_else(|| {
            EmailError::ProtocolError("Server did not provide UIDVALIDITY".to_string())
        })?;

        debug!("Selected '{}' (UIDVALIDITY={})", mailbox, uidvalidity);
        self.selected = Some(SelectedMailbox {
            name: mailbox.to_string(),
            uidvalidity,
        });
        Ok(uidvalidity)
    }

    /// All UIDs of the selected mailbox in ascending order.
    pub async fn search_all(&mut self) -> Result<Vec<u32>> {
        let session = self.session()?;
        let uids = session.uid_search("ALL").await?;
        let mut uids: Vec<u32> = uids.into_iter().collect();
        uids.sort_unstable();
        Ok(uids)
    }

    /// Fetches header blocks and seen flags without touching `\Seen`.
    pub async fn fetch_headers(&mut self, uids: &[u32]) -> Result<Vec<FetchedHeader>> {
        if uids.is_empty() {
            return Ok(Vec::new());
        }

        let uid_set = uid_set(uids);
        let session = self.session()?;
        let mut messages = session
            .uid_fetch(&uid_set, "(UID FLAGS BODY.PEEK[HEADER])")
            .await?;

        let mut results = Vec::new();
        while let Some(message) = messages.next().await {
            match message {
                Ok(fetch) => {
                    let Some(uid) = fetch.uid else {
                        warn!("Fetched message without UID");
                        continue;
                    };
                    results.push(FetchedHeader {
                        uid,
                        seen: fetch.flags().any(|f| matches!(f, Flag::Seen)),
                        header: fetch.header().unwrap_or_default().to_vec(),
                    });
                }
                Err(e) => warn!("Error fetching message header: {}", e),
            }
        }

        results.sort_by_key(|h| h.uid);
        Ok(results)
    }

    /// Whether the message carries `\Seen`.
    pub async fn fetch_seen(&mut self, uid: u32) -> Result<bool> {
        let session = self.session()?;
        let mut messages = session.uid_fetch(uid.to_string(), "(UID FLAGS)").await?;

        let mut seen = None;
        while let Some(message) = messages.next().await {
            let fetch = message?;
            if seen.is_none() {
                seen = Some(fetch.flags().any(|f| matches!(f, Flag::Seen)));
            }
        }
        seen.ok_or_else(|| EmailError::MessageNotFound(format!("UID {}", uid)))
    }

    /// Fetches a full message using BODY.PEEK[] to avoid marking it as read.
    pub async fn fetch_body_peek(&mut self, uid: u32) -> Result<Vec<u8>> {
        let session = self.session()?;
        debug!("Fetching message body with UID {}", uid);

        let mut messages = session.uid_fetch(uid.to_string(), "BODY.PEEK[]").await?;

        // Drain the whole stream so no untagged data is left for the next command.
        let mut body = None;
        while let Some(message) = messages.next().await {
            let fetch = message?;
            if body.is_none() {
                body = fetch.body().map(|b| b.to_vec());
            }
        }

        body.ok_or_else(|| EmailError::MessageNotFound(format!("UID {}", uid)))
    }

    /// Moves a message of the selected mailbox with `UID MOVE`.
    pub async fn move_uid(&mut self, uid: u32, target_mailbox: &str) -> Result<()> {
        let session = self.session()?;
        session.uid_mv(uid.to_string(), target_mailbox).await?;
        debug!("Moved UID {} to '{}'", uid, target_mailbox);
        Ok(())
    }

    /// Appends a message flagged `\Draft` to a mailbox.
    pub async fn append_draft(&mut self, mailbox: &str, content: &[u8]) -> Result<()> {
        let session = self.session()?;
        session
            .append(mailbox, Some("(\\Draft)"), None, content)
            .await?;
        debug!("Appended {} byte draft to '{}'", content.len(), mailbox);
        Ok(())
    }

    /// Disconnects from the IMAP server gracefully.
    pub async fn disconnect(&mut self) -> Result<()> {
        if let Some(mut session) = self.session.take() {
            info!("Disconnecting from IMAP server {}", self.account.host);
            session
                .logout()
                .await
                .map_err(|e| EmailError::ProtocolError(e.to_string()))?;
        }
        self.selected = None;
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }
}

impl Drop for ImapClient {
    fn drop(&mut self) {
        if self.session.is_some() {
            warn!("ImapClient dropped without explicit disconnect - session will be closed");
        }
    }
}

fn uid_set(uids: &[u32]) -> String {
    uids.iter()
        .map(|u| u.to_string())
        .collect::<Vec<_>>()
        .join(",")
}
