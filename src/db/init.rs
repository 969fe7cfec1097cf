use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;

pub fn init_db(db_path: &Path) -> Result<Connection> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create database directory")?;
    }

    let conn = Connection::open(db_path).context("Failed to open database connection")?;

    migrate(&conn)?;

    Ok(conn)
}

pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS recordings (
            id TEXT PRIMARY KEY,
            file_url TEXT NOT NULL,
            transcription_text TEXT,
            project_id TEXT NOT NULL,
            organization_id TEXT NOT NULL,
            created_by_id TEXT NOT NULL,
            title TEXT NOT NULL DEFAULT '',
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )
    .context("Failed to create recordings table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS utterances (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            recording_id TEXT NOT NULL,
            speaker TEXT NOT NULL,
            text TEXT NOT NULL,
            start_ms INTEGER NOT NULL
        )",
        [],
    )
    .context("Failed to create utterances table")?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_utterances_recording ON utterances(recording_id, start_ms)",
        [],
    )
    .context("Failed to create utterances recording index")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS summaries (
            recording_id TEXT PRIMARY KEY,
            summary TEXT NOT NULL,
            updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )
    .context("Failed to create summaries table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS tasks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            recording_id TEXT NOT NULL,
            project_id TEXT NOT NULL,
            organization_id TEXT NOT NULL,
            created_by_id TEXT NOT NULL,
            title TEXT NOT NULL,
            description TEXT,
            assignee TEXT,
            due_date TEXT,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )
    .context("Failed to create tasks table")?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_tasks_recording ON tasks(recording_id)",
        [],
    )
    .context("Failed to create tasks recording index")?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_tasks_project ON tasks(project_id)",
        [],
    )
    .context("Failed to create tasks project index")?;

    // One row per recording, overwritten on every checkpoint
    conn.execute(
        "CREATE TABLE IF NOT EXISTS workflow_status (
            recording_id TEXT PRIMARY KEY,
            state TEXT NOT NULL,
            error_message TEXT,
            progress_percent INTEGER NOT NULL DEFAULT 0,
            started_at TEXT,
            updated_at TEXT NOT NULL,
            completed_at TEXT
        )",
        [],
    )
    .context("Failed to create workflow_status table")?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_workflow_status_state ON workflow_status(state)",
        [],
    )
    .context("Failed to create workflow_status state index")?;

    Ok(())
}
