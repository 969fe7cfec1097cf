//! Workflow status types and the tracker that persists checkpoints.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use super::collaborators::StatusStore;

/// Externally visible state of a recording's processing run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowState {
    Running,
    Completed,
    Failed,
}

impl WorkflowState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => bail!("Invalid workflow state: {}", s),
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running)
    }
}

/// The persisted status row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStatus {
    pub recording_id: String,
    pub state: WorkflowState,
    pub error_message: Option<String>,
    pub progress_percent: u8,
    pub started_at: Option<String>,
    pub updated_at: String,
    pub completed_at: Option<String>,
}

/// Writes status checkpoints for a run.
///
/// Only the orchestrator decides when a checkpoint happens; the tracker never
/// advances progress on its own.
#[derive(Clone)]
pub struct StatusTracker {
    store: Arc<dyn StatusStore>,
}

impl StatusTracker {
    pub fn new(store: Arc<dyn StatusStore>) -> Self {
        Self { store }
    }

    pub async fn write(
        &self,
        recording_id: &str,
        state: WorkflowState,
        error_message: Option<&str>,
        progress_percent: Option<u8>,
    ) -> Result<()> {
        debug!(
            recording_id = %recording_id,
            state = state.as_str(),
            "Writing workflow status"
        );
        self.store
            .write(
                recording_id,
                state,
                error_message,
                progress_percent.map(|p| p.min(100)),
            )
            .await
    }

    pub async fn started(&self, recording_id: &str) -> Result<()> {
        self.write(recording_id, WorkflowState::Running, None, Some(0))
            .await
    }

    pub async fn failed(&self, recording_id: &str, message: &str) -> Result<()> {
        self.write(recording_id, WorkflowState::Failed, Some(message), None)
            .await
    }

    pub async fn completed(&self, recording_id: &str) -> Result<()> {
        self.write(recording_id, WorkflowState::Completed, None, Some(100))
            .await
    }

    pub async fn read(&self, recording_id: &str) -> Result<Option<WorkflowStatus>> {
        self.store.read(recording_id).await
    }
}
