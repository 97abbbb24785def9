//! Run history repository: one row per completed batch run.

use rusqlite::params;

use super::{Database, DatabaseError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRow {
    pub id: String,
    pub started_at: String,
    pub finished_at: String,
    pub processed_count: u32,
    pub error_count: u32,
    pub success: bool,
}

pub fn insert(db: &Database, row: &RunRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO runs (id, started_at, finished_at, processed_count, error_count, success)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                row.id,
                row.started_at,
                row.finished_at,
                row.processed_count,
                row.error_count,
                row.success,
            ],
        )?;
        Ok(())
    })
}

/// Returns the latest runs, newest first.
pub fn list_recent(db: &Database, limit: u32) -> Result<Vec<RunRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT id, started_at, finished_at, processed_count, error_count, success
             FROM runs ORDER BY started_at DESC LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![limit], |row| {
                Ok(RunRow {
                    id: row.get(0)?,
                    started_at: row.get(1)?,
                    finished_at: row.get(2)?,
                    processed_count: row.get(3)?,
                    error_count: row.get(4)?,
                    success: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}
