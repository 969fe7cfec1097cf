//! Data carried through the recording pipeline.

use serde::{Deserialize, Serialize};

use super::error::WorkflowError;

/// A recording as seen by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recording {
    pub id: String,
    pub file_url: String,
    pub transcription_text: Option<String>,
    pub project_id: String,
    pub organization_id: String,
    pub created_by_id: String,
    pub title: String,
}

impl Recording {
    /// The committed transcript, if it is non-empty.
    pub fn transcript(&self) -> Option<&str> {
        self.transcription_text
            .as_deref()
            .filter(|text| !text.is_empty())
    }
}

/// One speaker turn from a previous transcription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Utterance {
    pub speaker: String,
    pub text: String,
    pub start_ms: u64,
}

/// Outcome of a single pipeline step.
pub type StepResult<T> = Result<T, WorkflowError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowOutcome {
    Completed,
    Failed,
}

/// What a pipeline run reports back to its caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowResult {
    pub recording_id: String,
    pub transcription_completed: bool,
    pub summary_completed: bool,
    pub tasks_extracted: u32,
    pub status: WorkflowOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WorkflowResult {
    pub fn completed(recording_id: impl Into<String>, tasks_extracted: u32) -> Self {
        Self {
            recording_id: recording_id.into(),
            transcription_completed: true,
            summary_completed: true,
            tasks_extracted,
            status: WorkflowOutcome::Completed,
            error: None,
        }
    }

    /// Render a failed run for callers that report outcomes instead of errors.
    pub fn failed(recording_id: impl Into<String>, error: &WorkflowError) -> Self {
        Self {
            recording_id: recording_id.into(),
            transcription_completed: error.reached_branches(),
            summary_completed: false,
            tasks_extracted: 0,
            status: WorkflowOutcome::Failed,
            error: Some(error.to_string()),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == WorkflowOutcome::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::error::Step;

    fn recording(text: Option<&str>) -> Recording {
        Recording {
            id: "r1".to_string(),
            file_url: "s3://bucket/r1.mp3".to_string(),
            transcription_text: text.map(String::from),
            project_id: "p1".to_string(),
            organization_id: "o1".to_string(),
            created_by_id: "u1".to_string(),
            title: "Weekly sync".to_string(),
        }
    }

    #[test]
    fn test_transcript_requires_non_empty_text() {
        assert_eq!(recording(None).transcript(), None);
        assert_eq!(recording(Some("")).transcript(), None);
        assert_eq!(recording(Some("  \n")).transcript(), Some("  \n"));
        assert_eq!(recording(Some("hello")).transcript(), Some("hello"));
    }

    #[test]
    fn test_completed_result_serialization() {
        let result = WorkflowResult::completed("r2", 3);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "recordingId": "r2",
                "transcriptionCompleted": true,
                "summaryCompleted": true,
                "tasksExtracted": 3,
                "status": "completed",
            })
        );
    }

    #[test]
    fn test_failed_result_from_error() {
        let not_found = WorkflowResult::failed(
            "r1",
            &WorkflowError::NotFound {
                recording_id: "r1".to_string(),
            },
        );
        assert_eq!(not_found.status, WorkflowOutcome::Failed);
        assert!(!not_found.transcription_completed);
        assert_eq!(not_found.tasks_extracted, 0);
        assert_eq!(not_found.error.as_deref(), Some("Recording not found"));

        let branches = WorkflowResult::failed(
            "r1",
            &WorkflowError::AggregateBranchFailure {
                message: "Summary: boom".to_string(),
                failures: vec![],
            },
        );
        assert!(branches.transcription_completed);
        assert!(!branches.summary_completed);

        let step = WorkflowResult::failed(
            "r1",
            &WorkflowError::step_failure(Step::Transcription, anyhow::anyhow!("timeout")),
        );
        assert!(!step.transcription_completed);
        assert_eq!(step.error.as_deref(), Some("Transcription failed: timeout"));
    }
}
