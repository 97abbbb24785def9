pub mod matcher;

pub use matcher::{FolderMatch, FolderMatcher, MatchKind};
