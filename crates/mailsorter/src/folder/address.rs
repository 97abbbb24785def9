//! Composite folder identifiers (`accountId|path`).
//!
//! Folder selections are persisted in settings as plain string tokens. Inside
//! the crate they are handled as [`FolderAddress`] values, which carry the
//! normalized path used for every comparison.
//!
//! Account ids containing `|` are not supported: the token is split on the
//! first separator and nothing is escaped.

use std::fmt;

/// Separator between account id and folder path in a token.
pub const TOKEN_SEPARATOR: char = '|';

/// A folder identified by account and path.
#[derive(Debug, Clone)]
pub struct FolderAddress {
    account_id: String,
    path: String,
    normalized: String,
}

impl FolderAddress {
    pub fn new(account_id: impl Into<String>, path: impl Into<String>) -> Self {
        let path = path.into();
        let normalized = normalize_path(&path);
        Self {
            account_id: account_id.into(),
            path,
            normalized,
        }
    }

    /// Parses a settings token, splitting on the first `|`.
    ///
    /// A token without separator is taken as a bare account id with an empty path.
    pub fn parse(token: &str) -> Self {
        match token.split_once(TOKEN_SEPARATOR) {
            Some((account_id, path)) => Self::new(account_id, path),
            None => Self::new(token, ""),
        }
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    /// The path exactly as it appeared in the token.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn normalized_path(&self) -> &str {
        &self.normalized
    }

    /// Serializes back to the `accountId|path` token.
    pub fn token(&self) -> String {
        serialize(&self.account_id, &self.path)
    }
}

impl PartialEq for FolderAddress {
    fn eq(&self, other: &Self) -> bool {
        self.account_id == other.account_id && self.normalized == other.normalized
    }
}

impl Eq for FolderAddress {}

impl fmt::Display for FolderAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.account_id, TOKEN_SEPARATOR, self.path)
    }
}

/// Joins account id and path into a token.
pub fn serialize(account_id: &str, path: &str) -> String {
    format!("{}{}{}", account_id, TOKEN_SEPARATOR, path)
}

/// Collapses repeated `/` and strips one leading and one trailing `/`.
pub fn normalize_path(path: &str) -> String {
    let mut collapsed = String::with_capacity(path.len());
    let mut previous_slash = false;
    for ch in path.chars() {
        if ch == '/' {
            if previous_slash {
                continue;
            }
            previous_slash = true;
        } else {
            previous_slash = false;
        }
        collapsed.push(ch);
    }

    let trimmed = collapsed.strip_prefix('/').unwrap_or(&collapsed);
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
    trimmed.to_string()
}
