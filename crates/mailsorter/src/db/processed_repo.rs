//! Processed message repository for the `processed_messages` table.

use rusqlite::{params, OptionalExtension};

use super::{Database, DatabaseError};

/// A processed message row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedMessageRow {
    /// Opaque host message id.
    pub id: String,
    pub source_folder: Option<String>,
    pub target_folder: Option<String>,
    pub subject: Option<String>,
    pub processed_at: String,
}

/// Inserts a processed message. Re-inserting an existing id is a no-op.
pub fn insert(db: &Database, row: &ProcessedMessageRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT OR IGNORE INTO processed_messages (id, source_folder, target_folder, subject, processed_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                row.id,
                row.source_folder,
                row.target_folder,
                row.subject,
                row.processed_at,
            ],
        )?;
        Ok(())
    })
}

pub fn exists(db: &Database, id: &str) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let found = conn
            .query_row(
                "SELECT 1 FROM processed_messages WHERE id = ?1",
                params![id],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    })
}

/// Returns every processed id.
pub fn list_ids(db: &Database) -> Result<Vec<String>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT id FROM processed_messages")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    })
}

/// Returns the most recently processed rows, newest first.
pub fn list_recent(db: &Database, limit: u32) -> Result<Vec<ProcessedMessageRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT id, source_folder, target_folder, subject, processed_at
             FROM processed_messages ORDER BY processed_at DESC LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![limit], |row| {
                Ok(ProcessedMessageRow {
                    id: row.get(0)?,
                    source_folder: row.get(1)?,
                    target_folder: row.get(2)?,
                    subject: row.get(3)?,
                    processed_at: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

pub fn count(db: &Database) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 =
            conn.query_row("SELECT COUNT(*) FROM processed_messages", [], |r| r.get(0))?;
        Ok(count)
    })
}

pub fn find_last_processed_at(db: &Database) -> Result<Option<String>, DatabaseError> {
    db.with_conn(|conn| {
        let last = conn.query_row(
            "SELECT MAX(processed_at) FROM processed_messages",
            [],
            |r| r.get::<_, Option<String>>(0),
        )?;
        Ok(last)
    })
}

/// Deletes one id. Returns whether a row was removed.
pub fn delete(db: &Database, id: &str) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let count = conn.execute("DELETE FROM processed_messages WHERE id = ?1", params![id])?;
        Ok(count > 0)
    })
}

/// Deletes every row. Returns the number of rows deleted.
pub fn delete_all(db: &Database) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count = conn.execute("DELETE FROM processed_messages", [])?;
        Ok(count as u64)
    })
}
