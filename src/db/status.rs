//! Workflow status persistence. One row per recording, last write wins.

use anyhow::{Context, Result};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use crate::workflow::{StatusStore, WorkflowState, WorkflowStatus};

use super::Database;

pub struct WorkflowStatusRepository;

impl WorkflowStatusRepository {
    /// Overwrite the status row for a recording.
    ///
    /// `progress_percent = None` keeps the stored progress. `started_at` is
    /// stamped when a run enters `running`; `completed_at` when it leaves it.
    pub fn write(
        conn: &Connection,
        recording_id: &str,
        state: WorkflowState,
        error_message: Option<&str>,
        progress_percent: Option<u8>,
    ) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();
        let started_at = (state == WorkflowState::Running).then(|| now.clone());
        let completed_at = state.is_terminal().then(|| now.clone());

        conn.execute(
            "INSERT INTO workflow_status \
             (recording_id, state, error_message, progress_percent, started_at, updated_at, completed_at) \
             VALUES (?1, ?2, ?3, COALESCE(?4, 0), ?5, ?6, ?7) \
             ON CONFLICT(recording_id) DO UPDATE SET \
             state = excluded.state, \
             error_message = excluded.error_message, \
             progress_percent = COALESCE(?4, workflow_status.progress_percent), \
             started_at = COALESCE(excluded.started_at, workflow_status.started_at), \
             updated_at = excluded.updated_at, \
             completed_at = excluded.completed_at",
            params![
                recording_id,
                state.as_str(),
                error_message,
                progress_percent,
                started_at,
                now,
                completed_at,
            ],
        )
        .context("Failed to write workflow status")?;
        Ok(())
    }

    pub fn get(conn: &Connection, recording_id: &str) -> Result<Option<WorkflowStatus>> {
        let row = conn
            .query_row(
                "SELECT recording_id, state, error_message, progress_percent, started_at, \
                 updated_at, completed_at FROM workflow_status WHERE recording_id = ?1",
                params![recording_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, Option<String>>(4)?,
                        row.get::<_, String>(5)?,
                        row.get::<_, Option<String>>(6)?,
                    ))
                },
            )
            .optional()
            .context("Failed to query workflow status")?;

        let Some((recording_id, state, error_message, progress, started_at, updated_at, completed_at)) =
            row
        else {
            return Ok(None);
        };

        Ok(Some(WorkflowStatus {
            recording_id,
            state: WorkflowState::parse(&state)?,
            error_message,
            progress_percent: progress.clamp(0, 100) as u8,
            started_at,
            updated_at,
            completed_at,
        }))
    }
}

/// `StatusStore` backed by the `workflow_status` table.
#[derive(Clone)]
pub struct SqliteStatusStore {
    db: Database,
}

impl SqliteStatusStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl StatusStore for SqliteStatusStore {
    async fn write(
        &self,
        recording_id: &str,
        state: WorkflowState,
        error_message: Option<&str>,
        progress_percent: Option<u8>,
    ) -> Result<()> {
        let id = recording_id.to_string();
        let message = error_message.map(str::to_string);
        self.db
            .call(move |conn| {
                WorkflowStatusRepository::write(conn, &id, state, message.as_deref(), progress_percent)
            })
            .await
    }

    async fn read(&self, recording_id: &str) -> Result<Option<WorkflowStatus>> {
        let id = recording_id.to_string();
        self.db
            .call(move |conn| WorkflowStatusRepository::get(conn, &id))
            .await
    }
}
