//! Boundaries to the services the pipeline drives.
//!
//! Everything behind these traits is external to the orchestrator: storage,
//! the AI providers, caches and notification delivery. All of them are
//! injected into [`InsightsWorkflow`](super::InsightsWorkflow) so tests can
//! swap in fakes.

use anyhow::Result;
use async_trait::async_trait;

use super::status::{WorkflowState, WorkflowStatus};
use super::types::{Recording, Utterance};

#[async_trait]
pub trait RecordingLookup: Send + Sync {
    /// `Ok(None)` when no recording has this id.
    async fn find(&self, recording_id: &str) -> Result<Option<Recording>>;

    /// Speaker turns from an earlier transcription. Empty when there are none.
    async fn utterances(&self, _recording_id: &str) -> Result<Vec<Utterance>> {
        Ok(Vec::new())
    }
}

/// Produces the transcript and commits it to the recording.
#[async_trait]
pub trait TranscriptionProvider: Send + Sync {
    async fn transcribe(&self, recording_id: &str, file_url: &str) -> Result<()>;
}

#[async_trait]
pub trait SummaryProvider: Send + Sync {
    async fn summarize(
        &self,
        recording_id: &str,
        text: &str,
        utterances: Option<&[Utterance]>,
    ) -> Result<()>;
}

#[async_trait]
pub trait TaskExtractionProvider: Send + Sync {
    /// Returns how many tasks were created.
    async fn extract_tasks(
        &self,
        recording_id: &str,
        project_id: &str,
        text: &str,
        organization_id: &str,
        created_by_id: &str,
        utterances: Option<&[Utterance]>,
    ) -> Result<u32>;
}

/// Durable home of the one status row per recording. Last write wins.
#[async_trait]
pub trait StatusStore: Send + Sync {
    async fn write(
        &self,
        recording_id: &str,
        state: WorkflowState,
        error_message: Option<&str>,
        progress_percent: Option<u8>,
    ) -> Result<()>;

    async fn read(&self, recording_id: &str) -> Result<Option<WorkflowStatus>>;
}

#[async_trait]
pub trait CacheInvalidator: Send + Sync {
    async fn invalidate(
        &self,
        recording_id: &str,
        project_id: &str,
        organization_id: &str,
    ) -> Result<()>;
}

/// Everything a "recording processed" notification carries.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub recording_id: String,
    pub title: String,
    pub project_id: String,
    pub user_id: String,
    pub organization_id: String,
    pub tasks_extracted: u32,
    pub duration_ms: u64,
    pub is_reprocessing: bool,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &Notification) -> Result<()>;
}
