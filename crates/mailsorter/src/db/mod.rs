//! Persistent state: the processed message set and the run history.
//!
//! One SQLite file (rusqlite) behind a cloneable [`Database`] handle. Schema
//! changes are applied by [`migrations::run_all`] whenever a handle is opened.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

pub mod error;
pub mod migrations;
pub mod processed_repo;
pub mod run_repo;

pub use error::DatabaseError;

/// Shared handle on the state database.
///
/// Clones share one connection; calls are serialized through a mutex.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Opens or creates the database file, creating parent directories, and
    /// brings the schema up to date.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| DatabaseError::CreateDir {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA busy_timeout=5000;")?;
        let db = Self::migrated(conn)?;

        log::info!("State database at {}", path.display());
        Ok(db)
    }

    /// Opens the database at [`default_database_path`].
    pub fn open_default() -> Result<Self, DatabaseError> {
        let path = default_database_path().ok_or(DatabaseError::NoHomeDirectory)?;
        Self::open(&path)
    }

    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        Self::migrated(Connection::open_in_memory()?)
    }

    fn migrated(conn: Connection) -> Result<Self, DatabaseError> {
        migrations::run_all(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs `f` with the connection locked.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, DatabaseError>
    where
        F: FnOnce(&Connection) -> Result<T, DatabaseError>,
    {
        let conn = self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        f(&conn)
    }
}

/// `~/.mailsorter/data/mailsorter.db`
pub fn default_database_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".mailsorter").join("data").join("mailsorter.db"))
}
