//! Recording processing workflow.
//!
//! Turns a recording into a transcript, a summary and extracted tasks. Each
//! external call is retried with backoff, the summary and task branches run
//! concurrently, and the run's status is persisted at every observable
//! checkpoint.

pub mod branches;
pub mod collaborators;
pub mod error;
pub mod finalize;
pub mod orchestrator;
pub mod resolver;
pub mod retry;
pub mod status;
pub mod transcription;
pub mod types;

pub use branches::{BranchInput, Settled, SettledBranches, ValidatedBranches};
pub use collaborators::{
    CacheInvalidator, Notification, Notifier, RecordingLookup, StatusStore, SummaryProvider,
    TaskExtractionProvider, TranscriptionProvider,
};
pub use error::{BranchFailure, BranchFailureKind, Step, WorkflowError};
pub use orchestrator::{Collaborators, InsightsWorkflow, WorkflowPhase};
pub use retry::{with_retry, RetryPolicy};
pub use status::{StatusTracker, WorkflowState, WorkflowStatus};
pub use transcription::{Transcript, TranscriptSource};
pub use types::{Recording, StepResult, Utterance, WorkflowOutcome, WorkflowResult};
