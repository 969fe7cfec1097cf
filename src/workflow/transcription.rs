//! Transcription step.
//!
//! Reprocessing a recording that already has a transcript skips the provider
//! entirely, so a rerun never pays for (or re-triggers the side effects of)
//! a second transcription.

use anyhow::{anyhow, Context};
use tracing::{error, info};

use super::collaborators::{RecordingLookup, TranscriptionProvider};
use super::error::{Step, WorkflowError};
use super::retry::{with_retry, RetryPolicy};
use super::types::{Recording, StepResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptSource {
    /// Reprocessing reused the transcript already on the recording.
    Existing,
    /// The provider produced a fresh transcript during this run.
    Transcribed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    pub text: String,
    pub source: TranscriptSource,
}

pub async fn run_transcription_step(
    provider: &dyn TranscriptionProvider,
    lookup: &dyn RecordingLookup,
    policy: &RetryPolicy,
    recording: &Recording,
    is_reprocessing: bool,
) -> StepResult<Transcript> {
    let recording_id = recording.id.as_str();

    if is_reprocessing {
        if let Some(text) = recording.transcript() {
            info!(
                recording_id = %recording_id,
                step = Step::Transcription.label(),
                "Reprocessing with existing transcript ({} chars), skipping transcription",
                text.len()
            );
            return Ok(Transcript {
                text: text.to_string(),
                source: TranscriptSource::Existing,
            });
        }
    }

    with_retry(policy, Step::Transcription, recording_id, |_| {
        provider.transcribe(recording_id, &recording.file_url)
    })
    .await
    .map_err(|e| WorkflowError::step_failure(Step::Transcription, e))?;

    // The provider commits the text on its side; read back what was stored.
    let refreshed = lookup
        .find(recording_id)
        .await
        .context("Failed to reload recording after transcription")
        .and_then(|found| found.ok_or_else(|| anyhow!("Recording disappeared after transcription")))
        .map_err(|e| fail(recording_id, e))?;

    // A fresh transcript must carry actual words, not just whitespace.
    match refreshed.transcript().filter(|text| !text.trim().is_empty()) {
        Some(text) => {
            info!(
                recording_id = %recording_id,
                step = Step::Transcription.label(),
                "Transcription complete: {} chars",
                text.len()
            );
            Ok(Transcript {
                text: text.to_string(),
                source: TranscriptSource::Transcribed,
            })
        }
        None => Err(fail(
            recording_id,
            anyhow!("Transcription reported success but no transcript text was saved"),
        )),
    }
}

fn fail(recording_id: &str, cause: anyhow::Error) -> WorkflowError {
    error!(
        recording_id = %recording_id,
        step = Step::Transcription.label(),
        "{:#}",
        cause
    );
    WorkflowError::step_failure(Step::Transcription, cause)
}
