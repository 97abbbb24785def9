//! Mail host error types.

use thiserror::Error;

/// Errors raised by a mail host while listing, reading or moving messages.
#[derive(Error, Debug)]
pub enum EmailError {
    /// Failed to connect to the IMAP server.
    #[error("IMAP connection failed: {0}")]
    ConnectionFailed(String),

    /// TLS/SSL error during connection.
    #[error("TLS error: {0}")]
    TlsError(String),

    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// No usable password source for an account.
    #[error("Credentials not found: {0}")]
    CredentialsNotFound(String),

    /// IMAP protocol error.
    #[error("IMAP protocol error: {0}")]
    ProtocolError(String),

    /// Failed to parse email message.
    #[error("Failed to parse email: {0}")]
    ParseError(String),

    /// No account with this id is configured on the host.
    #[error("Account '{0}' not found")]
    AccountNotFound(String),

    /// Folder not found.
    #[error("Folder '{0}' not found")]
    FolderNotFound(String),

    /// Message id unknown to the host.
    #[error("Message '{0}' not found")]
    MessageNotFound(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<async_native_tls::Error> for EmailError {
    fn from(err: async_native_tls::Error) -> Self {
        EmailError::TlsError(err.to_string())
    }
}

impl From<async_imap::error::Error> for EmailError {
    fn from(err: async_imap::error::Error) -> Self {
        EmailError::ProtocolError(err.to_string())
    }
}

/// Result type for mail host operations.
pub type Result<T> = std::result::Result<T, EmailError>;
