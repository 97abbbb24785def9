use std::sync::LazyLock;

use regex::Regex;

use crate::folder::{normalize_path, FolderAddress};

/// `<email> - /<path>`, the shape of a catalogue line echoed back by the model.
static RE_CATALOGUE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([^@\s]+@[^@\s]+\.[^@\s]+)\s*-\s*(/.+)").unwrap());

/// Maps a model's target label onto one of the configured candidate folders.
pub struct FolderMatcher {
    candidates: Vec<FolderAddress>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// The label equals a candidate token.
    Exact,
    /// The label looked like a catalogue line and matched by email and path.
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderMatch {
    pub address: FolderAddress,
    pub kind: MatchKind,
}

impl FolderMatcher {
    /// `candidates` keep their order; the first matching candidate wins.
    pub fn new(candidates: Vec<FolderAddress>) -> Self {
        Self { candidates }
    }

    pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> Self {
        Self::new(
            tokens
                .iter()
                .map(|token| FolderAddress::parse(token.as_ref()))
                .collect(),
        )
    }

    pub fn candidates(&self) -> &[FolderAddress] {
        &self.candidates
    }

    /// Returns the candidate the label points at, if any.
    pub fn match_target(&self, target: &str) -> Option<FolderAddress> {
        self.find(target).map(|m| m.address)
    }

    /// Like [`match_target`](Self::match_target) but reports which pass matched.
    pub fn find(&self, target: &str) -> Option<FolderMatch> {
        let target = target.trim();
        if target.is_empty() {
            return None;
        }

        // The exact pass compares raw account ids, while the catalogue shows
        // display names. Only the fallback pass can bridge the two.
        if let Some(candidate) = self.candidates.iter().find(|c| c.token() == target) {
            log::debug!("Exact folder match: {}", candidate);
            return Some(FolderMatch {
                address: candidate.clone(),
                kind: MatchKind::Exact,
            });
        }

        let caps = RE_CATALOGUE_LINE.captures(target)?;
        let email = &caps[1];
        let path = normalize_path(&caps[2]);

        let found = self.candidates.iter().find(|c| {
            c.normalized_path() == path
                && (c.account_id().contains(email) || email.contains(c.account_id()))
        })?;

        log::debug!("Fallback folder match for '{}': {}", target, found);
        Some(FolderMatch {
            address: found.clone(),
            kind: MatchKind::Fallback,
        })
    }
}
