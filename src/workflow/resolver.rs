//! Loads the recording a run operates on.

use tracing::{debug, error, warn};

use super::collaborators::RecordingLookup;
use super::error::WorkflowError;
use super::types::{Recording, StepResult, Utterance};

/// A recording plus whatever transcript context is already known.
#[derive(Debug, Clone)]
pub struct ResolvedRecording {
    pub recording: Recording,
    pub utterances: Option<Vec<Utterance>>,
}

/// Load the recording, failing with `NotFound` when it is missing or the
/// lookup errors. Utterances are best-effort.
pub async fn resolve_recording(
    lookup: &dyn RecordingLookup,
    recording_id: &str,
) -> StepResult<ResolvedRecording> {
    let recording = match lookup.find(recording_id).await {
        Ok(Some(recording)) => recording,
        Ok(None) => {
            error!(recording_id = %recording_id, step = "resolve", "Recording not found");
            return Err(not_found(recording_id));
        }
        Err(e) => {
            error!(
                recording_id = %recording_id,
                step = "resolve",
                "Recording lookup failed: {:#}",
                e
            );
            return Err(not_found(recording_id));
        }
    };

    let utterances = load_utterances(lookup, recording_id).await;

    Ok(ResolvedRecording {
        recording,
        utterances,
    })
}

/// Best-effort utterance load: errors and empty results both yield `None`.
pub async fn load_utterances(
    lookup: &dyn RecordingLookup,
    recording_id: &str,
) -> Option<Vec<Utterance>> {
    match lookup.utterances(recording_id).await {
        Ok(utterances) if utterances.is_empty() => None,
        Ok(utterances) => {
            debug!(
                recording_id = %recording_id,
                "Loaded {} utterances for prompt context",
                utterances.len()
            );
            Some(utterances)
        }
        Err(e) => {
            warn!(
                recording_id = %recording_id,
                "Could not load utterances, continuing without them: {:#}",
                e
            );
            None
        }
    }
}

fn not_found(recording_id: &str) -> WorkflowError {
    WorkflowError::NotFound {
        recording_id: recording_id.to_string(),
    }
}
