//! Mail access: the [`MailHost`] seam, its IMAP and in-memory hosts, message
//! parsing and the processed-message tracker.

pub mod client;
pub mod error;
pub mod host;
pub mod imap_host;
pub mod memory;
pub mod parser;
pub mod tracker;

pub use client::ImapClient;
pub use error::EmailError;
pub use host::{Account, Draft, FolderNode, MailHost, MessageDetails, MessageHeader};
pub use imap_host::{ImapMailHost, ImapMessageId};
pub use memory::{MemoryMailHost, MemoryMessage, RecordedDraft, RecordedMove};
pub use parser::{extract_text_content, parse_headers, HeaderInfo};
pub use tracker::{MessageTracker, ProcessedIdSet, ProcessedMessage, TrackerStats};
