//! Recording processing orchestrator.
//!
//! Runs the full pipeline for one recording:
//! resolve → transcribe (skipped when reprocessing) → summary ‖ tasks →
//! validate → finalize → complete → notify
//!
//! All collaborators are injected via constructor, nothing concrete is
//! hardcoded.

use std::fmt;
use std::sync::{Arc, OnceLock};

use tokio::time::Instant;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::branches::{run_branches, validate_branches, BranchInput};
use super::collaborators::{
    CacheInvalidator, Notification, Notifier, RecordingLookup, StatusStore, SummaryProvider,
    TaskExtractionProvider, TranscriptionProvider,
};
use super::error::{Step, WorkflowError};
use super::finalize::finalize;
use super::resolver::{load_utterances, resolve_recording};
use super::retry::RetryPolicy;
use super::status::StatusTracker;
use super::transcription::{run_transcription_step, TranscriptSource};
use super::types::WorkflowResult;

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowPhase {
    Start,
    Resolving,
    Transcribing,
    Branching,
    Validating,
    Finalizing,
    Notifying,
    Done,
    Failed,
}

impl WorkflowPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Resolving => "resolving",
            Self::Transcribing => "transcribing",
            Self::Branching => "branching",
            Self::Validating => "validating",
            Self::Finalizing => "finalizing",
            Self::Notifying => "notifying",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    /// Allowed edges of the run state machine. Transcribing may be skipped,
    /// so Resolving can move straight to Branching. Unexpected errors can end
    /// a run from any non-terminal phase.
    pub fn can_transition_to(&self, next: WorkflowPhase) -> bool {
        use WorkflowPhase::*;
        match (self, next) {
            (Done, _) | (Failed, _) => false,
            (_, Failed) => true,
            (Start, Resolving)
            | (Resolving, Transcribing)
            | (Resolving, Branching)
            | (Transcribing, Branching)
            | (Branching, Validating)
            | (Validating, Finalizing)
            | (Finalizing, Notifying)
            | (Notifying, Done) => true,
            _ => false,
        }
    }
}

impl fmt::Display for WorkflowPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The external services a run talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub recordings: Arc<dyn RecordingLookup>,
    pub transcription: Arc<dyn TranscriptionProvider>,
    pub summary: Arc<dyn SummaryProvider>,
    pub tasks: Arc<dyn TaskExtractionProvider>,
    pub status: Arc<dyn StatusStore>,
    pub cache: Arc<dyn CacheInvalidator>,
    pub notifier: Arc<dyn Notifier>,
}

/// Cheap to clone; clones share the same collaborators.
#[derive(Clone)]
pub struct InsightsWorkflow {
    inner: Arc<Inner>,
}

struct Inner {
    collaborators: Collaborators,
    status: StatusTracker,
    retry: RetryPolicy,
}

/// Per-run bookkeeping.
struct Run {
    phase: WorkflowPhase,
    started: Instant,
}

impl Run {
    fn new() -> Self {
        Self {
            phase: WorkflowPhase::Start,
            started: Instant::now(),
        }
    }

    fn enter(&mut self, next: WorkflowPhase) {
        debug_assert!(
            self.phase.can_transition_to(next),
            "invalid workflow transition {} -> {}",
            self.phase,
            next
        );
        debug!("Workflow phase {} -> {}", self.phase, next);
        self.phase = next;
    }
}

impl InsightsWorkflow {
    pub fn new(collaborators: Collaborators, retry: RetryPolicy) -> Self {
        let status = StatusTracker::new(collaborators.status.clone());
        Self {
            inner: Arc::new(Inner {
                collaborators,
                status,
                retry,
            }),
        }
    }

    pub fn status_tracker(&self) -> &StatusTracker {
        &self.inner.status
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.inner.retry
    }

    /// Turn a recording into a transcript, a summary and extracted tasks.
    ///
    /// Every failure is logged, persisted as a failed status and returned.
    /// Nothing escapes this boundary: a panic inside the run comes back as
    /// `WorkflowError::Unknown`, unless the completed checkpoint was already
    /// written, in which case the completed result stands.
    pub async fn convert_recording_into_ai_insights(
        &self,
        recording_id: &str,
        is_reprocessing: bool,
    ) -> Result<WorkflowResult, WorkflowError> {
        let run_id = Uuid::new_v4();
        let span = info_span!("workflow", recording_id = %recording_id, run_id = %run_id);

        let this = self.clone();
        let id = recording_id.to_string();
        let committed: Arc<OnceLock<WorkflowResult>> = Arc::new(OnceLock::new());
        let checkpoint = committed.clone();
        let joined = tokio::spawn(
            async move { this.run(&id, is_reprocessing, &checkpoint).await }
                .instrument(span.clone()),
        )
        .await;

        match joined {
            Ok(outcome) => outcome,
            Err(e) => {
                if let Some(result) = committed.get() {
                    error!(
                        parent: &span,
                        recording_id = %recording_id,
                        "Workflow aborted after completion, keeping completed status: {}",
                        e
                    );
                    return Ok(result.clone());
                }
                let err = WorkflowError::unknown(format!("Workflow aborted unexpectedly: {}", e));
                self.record_failure(recording_id, WorkflowPhase::Failed, &err)
                    .instrument(span)
                    .await;
                Err(err)
            }
        }
    }

    async fn run(
        &self,
        recording_id: &str,
        is_reprocessing: bool,
        committed: &OnceLock<WorkflowResult>,
    ) -> Result<WorkflowResult, WorkflowError> {
        let mut run = Run::new();
        info!(
            "Processing recording {} (reprocessing: {})",
            recording_id, is_reprocessing
        );

        match self
            .execute(&mut run, recording_id, is_reprocessing, committed)
            .await
        {
            Ok(result) => Ok(result),
            Err(err) => {
                let failed_in = run.phase;
                run.enter(WorkflowPhase::Failed);
                self.record_failure(recording_id, failed_in, &err).await;
                Err(err)
            }
        }
    }

    async fn execute(
        &self,
        run: &mut Run,
        recording_id: &str,
        is_reprocessing: bool,
        committed: &OnceLock<WorkflowResult>,
    ) -> Result<WorkflowResult, WorkflowError> {
        let deps = &self.inner.collaborators;
        let retry = &self.inner.retry;

        self.inner.status.started(recording_id).await?;

        run.enter(WorkflowPhase::Resolving);
        let resolved = resolve_recording(deps.recordings.as_ref(), recording_id).await?;
        let recording = resolved.recording;
        let mut utterances = resolved.utterances;

        if !(is_reprocessing && recording.transcript().is_some()) {
            run.enter(WorkflowPhase::Transcribing);
        }
        let transcript = run_transcription_step(
            deps.transcription.as_ref(),
            deps.recordings.as_ref(),
            retry,
            &recording,
            is_reprocessing,
        )
        .await?;
        if transcript.source == TranscriptSource::Transcribed {
            utterances = load_utterances(deps.recordings.as_ref(), recording_id).await;
        }

        run.enter(WorkflowPhase::Branching);
        let settled = run_branches(
            deps.summary.clone(),
            deps.tasks.clone(),
            retry,
            BranchInput {
                recording_id: recording.id.clone(),
                transcript: transcript.text,
                utterances,
                project_id: recording.project_id.clone(),
                organization_id: recording.organization_id.clone(),
                created_by_id: recording.created_by_id.clone(),
            },
        )
        .await;

        run.enter(WorkflowPhase::Validating);
        let validated = validate_branches(recording_id, settled)?;

        run.enter(WorkflowPhase::Finalizing);
        let cache = deps.cache.clone();
        let finalized = recording.clone();
        let invalidation = tokio::spawn(
            async move { finalize(cache.as_ref(), &finalized).await }.in_current_span(),
        );
        if let Err(e) = invalidation.await {
            warn!(
                recording_id = %recording_id,
                step = Step::Finalize.label(),
                "Cache invalidation aborted: {}",
                e
            );
        }

        self.inner.status.completed(recording_id).await?;
        let result = WorkflowResult::completed(recording_id, validated.tasks_created);
        let _ = committed.set(result.clone());

        run.enter(WorkflowPhase::Notifying);
        let notification = Notification {
            recording_id: recording.id.clone(),
            title: recording.title.clone(),
            project_id: recording.project_id.clone(),
            user_id: recording.created_by_id.clone(),
            organization_id: recording.organization_id.clone(),
            tasks_extracted: validated.tasks_created,
            duration_ms: run.started.elapsed().as_millis() as u64,
            is_reprocessing,
        };
        let notifier = deps.notifier.clone();
        let sent = notification.clone();
        let delivery =
            tokio::spawn(async move { notifier.notify(&sent).await }.in_current_span());
        match delivery.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(
                recording_id = %recording_id,
                step = Step::Notify.label(),
                "Notification failed: {:#}",
                e
            ),
            Err(e) => warn!(
                recording_id = %recording_id,
                step = Step::Notify.label(),
                "Notification aborted: {}",
                e
            ),
        }

        run.enter(WorkflowPhase::Done);
        info!(
            "Recording {} processed: {} tasks extracted in {}ms",
            recording_id, validated.tasks_created, notification.duration_ms
        );

        Ok(result)
    }

    async fn record_failure(&self, recording_id: &str, phase: WorkflowPhase, err: &WorkflowError) {
        error!(
            recording_id = %recording_id,
            step = err.step_label(),
            phase = phase.as_str(),
            "Workflow failed: {}",
            err
        );

        if let Err(e) = self.inner.status.failed(recording_id, &err.to_string()).await {
            error!(
                recording_id = %recording_id,
                "Failed to persist failed workflow status: {:#}",
                e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_happy_path_is_allowed() {
        use WorkflowPhase::*;
        let path = [
            Start,
            Resolving,
            Transcribing,
            Branching,
            Validating,
            Finalizing,
            Notifying,
            Done,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_transcribing_can_be_skipped() {
        assert!(WorkflowPhase::Resolving.can_transition_to(WorkflowPhase::Branching));
        assert!(!WorkflowPhase::Start.can_transition_to(WorkflowPhase::Branching));
    }

    #[test]
    fn test_terminal_phases_are_absorbing() {
        assert!(!WorkflowPhase::Failed.can_transition_to(WorkflowPhase::Resolving));
        assert!(!WorkflowPhase::Done.can_transition_to(WorkflowPhase::Failed));
        assert!(WorkflowPhase::Validating.can_transition_to(WorkflowPhase::Failed));
    }

    #[test]
    fn test_phase_labels() {
        assert_eq!(WorkflowPhase::Branching.as_str(), "branching");
        assert_eq!(WorkflowPhase::Failed.to_string(), "failed");
    }
}
