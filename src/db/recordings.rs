//! Recording and utterance persistence.

use anyhow::{Context, Result};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use crate::workflow::{Recording, RecordingLookup, Utterance};

use super::Database;

/// Repository for recordings and their utterances.
pub struct RecordingRepository;

impl RecordingRepository {
    /// Insert a recording, replacing any existing row with the same id.
    pub fn upsert(conn: &Connection, recording: &Recording) -> Result<()> {
        conn.execute(
            "INSERT INTO recordings \
             (id, file_url, transcription_text, project_id, organization_id, created_by_id, title) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) \
             ON CONFLICT(id) DO UPDATE SET \
             file_url = excluded.file_url, transcription_text = excluded.transcription_text, \
             project_id = excluded.project_id, organization_id = excluded.organization_id, \
             created_by_id = excluded.created_by_id, title = excluded.title",
            params![
                recording.id,
                recording.file_url,
                recording.transcription_text,
                recording.project_id,
                recording.organization_id,
                recording.created_by_id,
                recording.title,
            ],
        )
        .context("Failed to upsert recording")?;
        Ok(())
    }

    pub fn get(conn: &Connection, id: &str) -> Result<Option<Recording>> {
        conn.query_row(
            "SELECT id, file_url, transcription_text, project_id, organization_id, created_by_id, title \
             FROM recordings WHERE id = ?1",
            params![id],
            |row| {
                Ok(Recording {
                    id: row.get(0)?,
                    file_url: row.get(1)?,
                    transcription_text: row.get(2)?,
                    project_id: row.get(3)?,
                    organization_id: row.get(4)?,
                    created_by_id: row.get(5)?,
                    title: row.get(6)?,
                })
            },
        )
        .optional()
        .context("Failed to query recording")
    }

    /// Store the transcript. Returns false when the recording does not exist.
    pub fn set_transcription(conn: &Connection, id: &str, text: &str) -> Result<bool> {
        let updated = conn
            .execute(
                "UPDATE recordings SET transcription_text = ?1 WHERE id = ?2",
                params![text, id],
            )
            .context("Failed to store transcription")?;
        Ok(updated > 0)
    }

    /// Replace all utterances of a recording.
    pub fn replace_utterances(
        conn: &Connection,
        recording_id: &str,
        utterances: &[Utterance],
    ) -> Result<()> {
        let tx = conn
            .unchecked_transaction()
            .context("Failed to start utterance transaction")?;

        tx.execute(
            "DELETE FROM utterances WHERE recording_id = ?1",
            params![recording_id],
        )
        .context("Failed to clear utterances")?;

        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO utterances (recording_id, speaker, text, start_ms) \
                     VALUES (?1, ?2, ?3, ?4)",
                )
                .context("Failed to prepare utterance insert")?;

            for utterance in utterances {
                stmt.execute(params![
                    recording_id,
                    utterance.speaker,
                    utterance.text,
                    utterance.start_ms as i64,
                ])
                .context("Failed to insert utterance")?;
            }
        }

        tx.commit().context("Failed to commit utterances")?;
        Ok(())
    }

    pub fn utterances(conn: &Connection, recording_id: &str) -> Result<Vec<Utterance>> {
        let mut stmt = conn
            .prepare(
                "SELECT speaker, text, start_ms FROM utterances \
                 WHERE recording_id = ?1 ORDER BY start_ms ASC, id ASC",
            )
            .context("Failed to prepare utterances query")?;

        let utterances = stmt
            .query_map(params![recording_id], |row| {
                let start_ms: i64 = row.get(2)?;
                Ok(Utterance {
                    speaker: row.get(0)?,
                    text: row.get(1)?,
                    start_ms: start_ms.max(0) as u64,
                })
            })
            .context("Failed to query utterances")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("Failed to map utterances")?;

        Ok(utterances)
    }
}

/// `RecordingLookup` backed by the `recordings` and `utterances` tables.
#[derive(Clone)]
pub struct SqliteRecordingLookup {
    db: Database,
}

impl SqliteRecordingLookup {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RecordingLookup for SqliteRecordingLookup {
    async fn find(&self, recording_id: &str) -> Result<Option<Recording>> {
        let id = recording_id.to_string();
        self.db
            .call(move |conn| RecordingRepository::get(conn, &id))
            .await
    }

    async fn utterances(&self, recording_id: &str) -> Result<Vec<Utterance>> {
        let id = recording_id.to_string();
        self.db
            .call(move |conn| RecordingRepository::utterances(conn, &id))
            .await
    }
}
