//! Tracking of processed messages and completed runs.

use std::collections::HashSet;

use chrono::Utc;
use log::{debug, info};

use crate::db::{processed_repo, run_repo, Database, DatabaseError};

pub use processed_repo::ProcessedMessageRow;
pub use run_repo::RunRow;

/// Snapshot of already handled message ids, read once at run start.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessedIdSet {
    ids: HashSet<String>,
}

impl ProcessedIdSet {
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Returns `true` if the id was not present yet.
    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        self.ids.insert(id.into())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl FromIterator<String> for ProcessedIdSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

/// What gets recorded when a message has been moved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedMessage<'a> {
    pub id: &'a str,
    pub source_folder: &'a str,
    pub target_folder: &'a str,
    pub subject: &'a str,
}

/// Persists the processed message set and the run history.
///
/// The set only grows during runs. Removing entries is an explicit operator
/// action through [`forget`](Self::forget) or [`reset`](Self::reset).
#[derive(Clone)]
pub struct MessageTracker {
    db: Database,
}

impl MessageTracker {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn load_processed(&self) -> Result<ProcessedIdSet, DatabaseError> {
        let ids: ProcessedIdSet = processed_repo::list_ids(&self.db)?.into_iter().collect();
        debug!("Loaded {} processed message ids", ids.len());
        Ok(ids)
    }

    pub fn is_processed(&self, id: &str) -> Result<bool, DatabaseError> {
        processed_repo::exists(&self.db, id)
    }

    /// Records a moved message. Recording the same id twice keeps the first row.
    pub fn mark_processed(&self, message: &ProcessedMessage<'_>) -> Result<(), DatabaseError> {
        let row = ProcessedMessageRow {
            id: message.id.to_string(),
            source_folder: Some(message.source_folder.to_string()),
            target_folder: Some(message.target_folder.to_string()),
            subject: Some(message.subject.to_string()),
            processed_at: Utc::now().to_rfc3339(),
        };
        processed_repo::insert(&self.db, &row)?;
        debug!("Marked message {} as processed", message.id);
        Ok(())
    }

    /// Removes one id so the next run picks the message up again.
    pub fn forget(&self, id: &str) -> Result<bool, DatabaseError> {
        let removed = processed_repo::delete(&self.db, id)?;
        if removed {
            info!("Forgot processed message {}", id);
        }
        Ok(removed)
    }

    /// Clears the whole processed set.
    pub fn reset(&self) -> Result<u64, DatabaseError> {
        let deleted = processed_repo::delete_all(&self.db)?;
        info!("Cleared {} processed message records", deleted);
        Ok(deleted)
    }

    pub fn recent(&self, limit: u32) -> Result<Vec<ProcessedMessageRow>, DatabaseError> {
        processed_repo::list_recent(&self.db, limit)
    }

    pub fn stats(&self) -> Result<TrackerStats, DatabaseError> {
        Ok(TrackerStats {
            total_processed: processed_repo::count(&self.db)?,
            last_processed_at: processed_repo::find_last_processed_at(&self.db)?,
        })
    }

    pub fn record_run(&self, run: &RunRow) -> Result<(), DatabaseError> {
        run_repo::insert(&self.db, run)
    }

    pub fn recent_runs(&self, limit: u32) -> Result<Vec<RunRow>, DatabaseError> {
        run_repo::list_recent(&self.db, limit)
    }
}

/// Statistics about processed messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerStats {
    pub total_processed: u64,
    pub last_processed_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> MessageTracker {
        MessageTracker::new(Database::open_in_memory().unwrap())
    }

    fn moved(id: &str) -> ProcessedMessage<'_> {
        ProcessedMessage {
            id,
            source_folder: "acct1|/INBOX",
            target_folder: "acct1|/Work",
            subject: "Hello",
        }
    }

    #[test]
    fn test_mark_and_load() {
        let tracker = tracker();
        assert!(tracker.load_processed().unwrap().is_empty());

        tracker.mark_processed(&moved("m1")).unwrap();
        tracker.mark_processed(&moved("m2")).unwrap();

        let set = tracker.load_processed().unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains("m1"));
        assert!(tracker.is_processed("m2").unwrap());
        assert!(!tracker.is_processed("m3").unwrap());
    }

    #[test]
    fn test_mark_twice_keeps_one_entry() {
        let tracker = tracker();
        tracker.mark_processed(&moved("m1")).unwrap();
        tracker.mark_processed(&moved("m1")).unwrap();
        assert_eq!(tracker.stats().unwrap().total_processed, 1);
    }

    #[test]
    fn test_processed_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.db");

        MessageTracker::new(Database::open(&path).unwrap())
            .mark_processed(&moved("m1"))
            .unwrap();

        let reopened = MessageTracker::new(Database::open(&path).unwrap());
        assert!(reopened.load_processed().unwrap().contains("m1"));
    }

    #[test]
    fn test_forget_and_reset() {
        let tracker = tracker();
        tracker.mark_processed(&moved("m1")).unwrap();
        tracker.mark_processed(&moved("m2")).unwrap();

        assert!(tracker.forget("m1").unwrap());
        assert!(!tracker.forget("m1").unwrap());
        assert!(!tracker.is_processed("m1").unwrap());

        assert_eq!(tracker.reset().unwrap(), 1);
        assert!(tracker.load_processed().unwrap().is_empty());
    }

    #[test]
    fn test_stats() {
        let tracker = tracker();
        let stats = tracker.stats().unwrap();
        assert_eq!(stats.total_processed, 0);
        assert!(stats.last_processed_at.is_none());

        tracker.mark_processed(&moved("m1")).unwrap();
        let stats = tracker.stats().unwrap();
        assert_eq!(stats.total_processed, 1);
        assert!(stats.last_processed_at.is_some());
    }

    #[test]
    fn test_run_history() {
        let tracker = tracker();
        tracker
            .record_run(&RunRow {
                id: "run-1".to_string(),
                started_at: "2026-01-01T08:00:00Z".to_string(),
                finished_at: "2026-01-01T08:01:00Z".to_string(),
                processed_count: 4,
                error_count: 1,
                success: false,
            })
            .unwrap();

        let runs = tracker.recent_runs(5).unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].processed_count, 4);
    }

    #[test]
    fn test_processed_id_set() {
        let mut set = ProcessedIdSet::default();
        assert!(set.insert("a"));
        assert!(!set.insert("a"));
        assert!(set.contains("a"));
        assert_eq!(set.len(), 1);
    }
}
