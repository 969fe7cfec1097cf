//! Failure taxonomy for a pipeline run.

use std::fmt;

use thiserror::Error;

pub const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error occurred";

/// Named unit of work in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    Resolve,
    Transcription,
    Summary,
    Tasks,
    Validation,
    Finalize,
    Notify,
}

impl Step {
    /// Display name, used in failure messages.
    pub fn name(self) -> &'static str {
        match self {
            Self::Resolve => "Resolve",
            Self::Transcription => "Transcription",
            Self::Summary => "Summary",
            Self::Tasks => "Tasks",
            Self::Validation => "Validation",
            Self::Finalize => "Finalize",
            Self::Notify => "Notify",
        }
    }

    /// Lowercase label for structured log fields.
    pub fn label(self) -> &'static str {
        match self {
            Self::Resolve => "resolve",
            Self::Transcription => "transcription",
            Self::Summary => "summary",
            Self::Tasks => "tasks",
            Self::Validation => "validation",
            Self::Finalize => "finalize",
            Self::Notify => "notify",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a branch failed to produce a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchFailureKind {
    /// The branch ran and returned an error.
    Rejected,
    /// The branch task itself died (panic or abort).
    Crashed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchFailure {
    pub branch: Step,
    pub kind: BranchFailureKind,
    pub reason: String,
}

impl fmt::Display for BranchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.branch, self.reason)
    }
}

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Recording not found")]
    NotFound { recording_id: String },

    #[error("{step} failed: {cause:#}")]
    StepFailure { step: Step, cause: anyhow::Error },

    #[error("{message}")]
    AggregateBranchFailure {
        message: String,
        failures: Vec<BranchFailure>,
    },

    #[error("{0}")]
    Unknown(String),
}

impl WorkflowError {
    pub fn step_failure(step: Step, cause: anyhow::Error) -> Self {
        Self::StepFailure { step, cause }
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.trim().is_empty() {
            Self::Unknown(UNKNOWN_ERROR_MESSAGE.to_string())
        } else {
            Self::Unknown(message)
        }
    }

    /// Build the aggregate error from every failed branch, in branch order.
    pub fn from_branch_failures(failures: Vec<BranchFailure>) -> Self {
        let message = failures
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        Self::AggregateBranchFailure { message, failures }
    }

    /// Label of the step the run died in, for log fields.
    pub fn step_label(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => Step::Resolve.label(),
            Self::StepFailure { step, .. } => step.label(),
            Self::AggregateBranchFailure { .. } => Step::Validation.label(),
            Self::Unknown(_) => "unknown",
        }
    }

    /// Whether the run got past transcription before failing.
    pub fn reached_branches(&self) -> bool {
        matches!(self, Self::AggregateBranchFailure { .. })
    }
}

impl From<anyhow::Error> for WorkflowError {
    fn from(err: anyhow::Error) -> Self {
        Self::unknown(format!("{:#}", err))
    }
}
