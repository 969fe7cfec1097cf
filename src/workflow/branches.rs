//! Summary and task-extraction branches.
//!
//! Both branches run as separate tokio tasks and are always awaited to a
//! terminal outcome before anything looks at either result. A failing branch
//! never cancels its sibling.

use std::sync::Arc;

use tokio::task::JoinError;
use tracing::{error, info};

use super::collaborators::{SummaryProvider, TaskExtractionProvider};
use super::error::{BranchFailure, BranchFailureKind, Step, WorkflowError};
use super::retry::{with_retry, RetryPolicy};
use super::types::{StepResult, Utterance};

/// Owned inputs handed to each branch. Each branch gets its own copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchInput {
    pub recording_id: String,
    pub transcript: String,
    pub utterances: Option<Vec<Utterance>>,
    pub project_id: String,
    pub organization_id: String,
    pub created_by_id: String,
}

/// Terminal outcome of one branch.
#[derive(Debug)]
pub enum Settled<T> {
    /// The branch produced a value.
    Fulfilled(T),
    /// The branch ran to completion and reported an error.
    Rejected(anyhow::Error),
    /// The branch task never finished normally.
    Crashed(String),
}

impl<T> Settled<T> {
    fn from_join(joined: Result<anyhow::Result<T>, JoinError>) -> Self {
        match joined {
            Ok(Ok(value)) => Self::Fulfilled(value),
            Ok(Err(e)) => Self::Rejected(e),
            Err(e) => Self::Crashed(describe_join_error(e)),
        }
    }

    pub fn is_fulfilled(&self) -> bool {
        matches!(self, Self::Fulfilled(_))
    }

    /// Both failure shapes collapse into the same `BranchFailure`.
    pub fn into_outcome(self, branch: Step) -> Result<T, BranchFailure> {
        match self {
            Self::Fulfilled(value) => Ok(value),
            Self::Rejected(e) => Err(BranchFailure {
                branch,
                kind: BranchFailureKind::Rejected,
                reason: format!("{:#}", e),
            }),
            Self::Crashed(reason) => Err(BranchFailure {
                branch,
                kind: BranchFailureKind::Crashed,
                reason,
            }),
        }
    }
}

#[derive(Debug)]
pub struct SettledBranches {
    pub summary: Settled<()>,
    pub tasks: Settled<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatedBranches {
    pub tasks_created: u32,
}

/// Run both branches concurrently and wait for both to settle.
pub async fn run_branches(
    summary: Arc<dyn SummaryProvider>,
    tasks: Arc<dyn TaskExtractionProvider>,
    policy: &RetryPolicy,
    input: BranchInput,
) -> SettledBranches {
    info!(
        recording_id = %input.recording_id,
        "Starting summary and task extraction branches"
    );

    let summary_handle = tokio::spawn(summary_branch(summary, policy.clone(), input.clone()));
    let tasks_handle = tokio::spawn(tasks_branch(tasks, policy.clone(), input));

    let (summary, tasks) = tokio::join!(summary_handle, tasks_handle);

    SettledBranches {
        summary: Settled::from_join(summary),
        tasks: Settled::from_join(tasks),
    }
}

async fn summary_branch(
    provider: Arc<dyn SummaryProvider>,
    policy: RetryPolicy,
    input: BranchInput,
) -> anyhow::Result<()> {
    with_retry(&policy, Step::Summary, &input.recording_id, |_| {
        provider.summarize(
            &input.recording_id,
            &input.transcript,
            input.utterances.as_deref(),
        )
    })
    .await
}

async fn tasks_branch(
    provider: Arc<dyn TaskExtractionProvider>,
    policy: RetryPolicy,
    input: BranchInput,
) -> anyhow::Result<u32> {
    with_retry(&policy, Step::Tasks, &input.recording_id, |_| {
        provider.extract_tasks(
            &input.recording_id,
            &input.project_id,
            &input.transcript,
            &input.organization_id,
            &input.created_by_id,
            input.utterances.as_deref(),
        )
    })
    .await
}

/// Proceed only if both branches succeeded; otherwise build the aggregate
/// error naming every failed branch.
pub fn validate_branches(recording_id: &str, branches: SettledBranches) -> StepResult<ValidatedBranches> {
    let summary = branches.summary.into_outcome(Step::Summary);
    let tasks = branches.tasks.into_outcome(Step::Tasks);

    match (summary, tasks) {
        (Ok(()), Ok(tasks_created)) => Ok(ValidatedBranches { tasks_created }),
        (summary, tasks) => {
            let failures: Vec<BranchFailure> =
                [summary.err(), tasks.err()].into_iter().flatten().collect();
            let err = WorkflowError::from_branch_failures(failures);
            error!(
                recording_id = %recording_id,
                step = Step::Validation.label(),
                "Branch validation failed: {}",
                err
            );
            Err(err)
        }
    }
}

fn describe_join_error(err: JoinError) -> String {
    if err.is_cancelled() {
        return "branch task was cancelled".to_string();
    }

    let payload = err.into_panic();
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned());

    match message {
        Some(message) => format!("branch task panicked: {}", message),
        None => "branch task panicked".to_string(),
    }
}
