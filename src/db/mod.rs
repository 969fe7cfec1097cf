//! SQLite persistence.
//!
//! Raw SQL with rusqlite, no ORM. A single connection is shared behind a
//! mutex; every repository call holds the lock only for its own statements.

use anyhow::{anyhow, Result};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};

pub mod init;
pub mod insights;
pub mod recordings;
pub mod status;


pub use init::{init_db, migrate};
pub use insights::{InsightsRepository, NewTask, TaskOwner, TaskRecord};
pub use recordings::{RecordingRepository, SqliteRecordingLookup};
pub use status::{SqliteStatusStore, WorkflowStatusRepository};

/// Shared handle to the database connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::from_connection(init_db(path)?))
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        migrate(&conn)?;
        Ok(Self::from_connection(conn))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Run `f` with exclusive access to the connection.
    pub fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| anyhow!("Database connection lock poisoned"))?;
        f(&conn)
    }

    /// Async variant of [`Database::with_conn`]: runs `f` on the blocking
    /// pool so SQLite work never stalls a runtime worker.
    pub async fn call<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let db = self.clone();
        tokio::task::spawn_blocking(move || db.with_conn(f))
            .await
            .map_err(|e| anyhow!("Database task failed: {}", e))?
    }
}
