//! Summary and task persistence.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

/// A task as produced by the extraction service, before it is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub id: i64,
    pub recording_id: String,
    pub project_id: String,
    pub title: String,
    pub description: Option<String>,
    pub assignee: Option<String>,
    pub due_date: Option<String>,
    pub created_at: String,
}

/// Owner fields stamped onto every task of a recording.
pub struct TaskOwner<'a> {
    pub recording_id: &'a str,
    pub project_id: &'a str,
    pub organization_id: &'a str,
    pub created_by_id: &'a str,
}

pub struct InsightsRepository;

impl InsightsRepository {
    pub fn upsert_summary(conn: &Connection, recording_id: &str, summary: &str) -> Result<()> {
        conn.execute(
            "INSERT INTO summaries (recording_id, summary) VALUES (?1, ?2) \
             ON CONFLICT(recording_id) DO UPDATE SET \
             summary = excluded.summary, updated_at = CURRENT_TIMESTAMP",
            params![recording_id, summary],
        )
        .context("Failed to store summary")?;
        Ok(())
    }

    pub fn get_summary(conn: &Connection, recording_id: &str) -> Result<Option<String>> {
        conn.query_row(
            "SELECT summary FROM summaries WHERE recording_id = ?1",
            params![recording_id],
            |row| row.get(0),
        )
        .optional()
        .context("Failed to query summary")
    }

    /// Replace the recording's tasks with `tasks`, so reprocessing never
    /// duplicates them. Returns how many were stored.
    pub fn replace_tasks(conn: &Connection, owner: &TaskOwner<'_>, tasks: &[NewTask]) -> Result<usize> {
        let tx = conn
            .unchecked_transaction()
            .context("Failed to start task transaction")?;

        tx.execute(
            "DELETE FROM tasks WHERE recording_id = ?1",
            params![owner.recording_id],
        )
        .context("Failed to clear previous tasks")?;

        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO tasks \
                     (recording_id, project_id, organization_id, created_by_id, title, description, assignee, due_date) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                )
                .context("Failed to prepare task insert")?;

            for task in tasks {
                stmt.execute(params![
                    owner.recording_id,
                    owner.project_id,
                    owner.organization_id,
                    owner.created_by_id,
                    task.title,
                    task.description,
                    task.assignee,
                    task.due_date,
                ])
                .context("Failed to insert task")?;
            }
        }

        tx.commit().context("Failed to commit tasks")?;
        Ok(tasks.len())
    }

    pub fn list_tasks(conn: &Connection, recording_id: &str) -> Result<Vec<TaskRecord>> {
        let mut stmt = conn
            .prepare(
                "SELECT id, recording_id, project_id, title, description, assignee, due_date, created_at \
                 FROM tasks WHERE recording_id = ?1 ORDER BY id ASC",
            )
            .context("Failed to prepare tasks query")?;

        let tasks = stmt
            .query_map(params![recording_id], |row| {
                Ok(TaskRecord {
                    id: row.get(0)?,
                    recording_id: row.get(1)?,
                    project_id: row.get(2)?,
                    title: row.get(3)?,
                    description: row.get(4)?,
                    assignee: row.get(5)?,
                    due_date: row.get(6)?,
                    created_at: row.get(7)?,
                })
            })
            .context("Failed to query tasks")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("Failed to map tasks")?;

        Ok(tasks)
    }
}
