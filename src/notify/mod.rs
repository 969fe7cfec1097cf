//! Notification delivery after a recording finishes processing.
//!
//! v1: log line or shell command. Delivery content (emails, push, chat) is
//! the command's business.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::config::NotifyConfig;
use crate::workflow::{Notification, Notifier};

/// Environment variable names for notification fields passed to commands.
pub mod notify_env {
    pub const RECORDING_ID: &str = "INSIGHTFLOW_RECORDING_ID";
    pub const TITLE: &str = "INSIGHTFLOW_TITLE";
    pub const PROJECT_ID: &str = "INSIGHTFLOW_PROJECT_ID";
    pub const USER_ID: &str = "INSIGHTFLOW_USER_ID";
    pub const ORGANIZATION_ID: &str = "INSIGHTFLOW_ORGANIZATION_ID";
    pub const TASKS_EXTRACTED: &str = "INSIGHTFLOW_TASKS_EXTRACTED";
    pub const DURATION_MS: &str = "INSIGHTFLOW_DURATION_MS";
    pub const REPROCESSING: &str = "INSIGHTFLOW_REPROCESSING";
}

/// Pick the notifier described by config.
pub fn from_config(config: &NotifyConfig) -> Box<dyn Notifier> {
    if config.command.trim().is_empty() {
        Box::new(LogNotifier)
    } else {
        Box::new(ShellCommandNotifier::new(
            config.command.clone(),
            config.timeout_seconds,
        ))
    }
}

/// Only writes the notification to the log.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: &Notification) -> Result<()> {
        info!(
            recording_id = %notification.recording_id,
            "Recording \"{}\" processed: {} tasks extracted in {}ms (reprocessing: {})",
            notification.title,
            notification.tasks_extracted,
            notification.duration_ms,
            notification.is_reprocessing
        );
        Ok(())
    }
}

/// How a notify command run ended.
#[derive(Debug, PartialEq, Eq)]
enum CommandOutcome {
    Succeeded { stdout: String },
    Exited { code: Option<i32>, stderr: String },
    TimedOut,
}

/// Runs `sh -c <command>` for each notification, with the notification as
/// JSON on stdin and its fields in `INSIGHTFLOW_*` env vars. Only spawn and
/// serialization errors are returned; exit codes and timeouts are logged.
pub struct ShellCommandNotifier {
    command: String,
    timeout: Duration,
}

impl ShellCommandNotifier {
    pub fn new(command: String, timeout_seconds: u64) -> Self {
        Self {
            command,
            timeout: Duration::from_secs(timeout_seconds),
        }
    }

    async fn run(&self, notification: &Notification) -> Result<CommandOutcome> {
        let payload =
            serde_json::to_vec(notification).context("Failed to serialize notification")?;

        let mut command = tokio::process::Command::new("sh");
        command.arg("-c").arg(&self.command);
        for (key, value) in env_pairs(notification) {
            command.env(key, value);
        }
        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to spawn `{}`", self.command))?;

        if let Some(mut stdin) = child.stdin.take() {
            // Commands that ignore stdin may exit before reading it.
            if let Err(e) = stdin.write_all(&payload).await {
                debug!(recording_id = %notification.recording_id, "stdin closed early: {}", e);
            }
        }

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(output) => output.context("Failed to wait for notify command")?,
            Err(_) => return Ok(CommandOutcome::TimedOut),
        };

        Ok(if output.status.success() {
            CommandOutcome::Succeeded {
                stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            }
        } else {
            CommandOutcome::Exited {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
        })
    }
}

fn env_pairs(notification: &Notification) -> [(&'static str, String); 8] {
    [
        (notify_env::RECORDING_ID, notification.recording_id.clone()),
        (notify_env::TITLE, notification.title.clone()),
        (notify_env::PROJECT_ID, notification.project_id.clone()),
        (notify_env::USER_ID, notification.user_id.clone()),
        (notify_env::ORGANIZATION_ID, notification.organization_id.clone()),
        (
            notify_env::TASKS_EXTRACTED,
            notification.tasks_extracted.to_string(),
        ),
        (notify_env::DURATION_MS, notification.duration_ms.to_string()),
        (notify_env::REPROCESSING, notification.is_reprocessing.to_string()),
    ]
}

#[async_trait]
impl Notifier for ShellCommandNotifier {
    async fn notify(&self, notification: &Notification) -> Result<()> {
        let recording_id = notification.recording_id.as_str();
        debug!(recording_id = %recording_id, command = %self.command, "Sending notification");

        match self.run(notification).await? {
            CommandOutcome::Succeeded { stdout } => {
                info!(
                    recording_id = %recording_id,
                    output = %stdout,
                    "Notification delivered"
                );
            }
            CommandOutcome::Exited { code, stderr } => {
                warn!(
                    recording_id = %recording_id,
                    exit_code = ?code,
                    stderr = %stderr,
                    "Notify command exited unsuccessfully"
                );
            }
            CommandOutcome::TimedOut => {
                warn!(
                    recording_id = %recording_id,
                    timeout_secs = self.timeout.as_secs(),
                    "Notify command killed after timeout"
                );
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification() -> Notification {
        Notification {
            recording_id: "r2".to_string(),
            title: "Design review".to_string(),
            project_id: "p1".to_string(),
            user_id: "u1".to_string(),
            organization_id: "o1".to_string(),
            tasks_extracted: 3,
            duration_ms: 1200,
            is_reprocessing: false,
        }
    }

    #[test]
    fn test_notify_env_constants() {
        assert_eq!(notify_env::RECORDING_ID, "INSIGHTFLOW_RECORDING_ID");
        assert_eq!(notify_env::TASKS_EXTRACTED, "INSIGHTFLOW_TASKS_EXTRACTED");
        assert_eq!(notify_env::REPROCESSING, "INSIGHTFLOW_REPROCESSING");
    }

    #[test]
    fn test_shell_command_notifier_creation() {
        let notifier = ShellCommandNotifier::new("echo hello".to_string(), 30);
        assert_eq!(notifier.command, "echo hello");
        assert_eq!(notifier.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_notification_json_shape() {
        let json = serde_json::to_value(notification()).unwrap();
        assert_eq!(json["recordingId"], "r2");
        assert_eq!(json["tasksExtracted"], 3);
        assert_eq!(json["isReprocessing"], false);
    }

    #[tokio::test]
    async fn test_log_notifier() {
        assert!(LogNotifier.notify(&notification()).await.is_ok());
    }

    #[tokio::test]
    async fn test_shell_command_notifier_success() {
        let notifier = ShellCommandNotifier::new("cat".to_string(), 10);
        assert!(notifier.notify(&notification()).await.is_ok());
    }

    #[tokio::test]
    async fn test_shell_command_notifier_env_vars() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("env.txt");
        let notifier = ShellCommandNotifier::new(
            format!(
                "echo \"$INSIGHTFLOW_RECORDING_ID $INSIGHTFLOW_TASKS_EXTRACTED\" > {}",
                out.display()
            ),
            10,
        );

        notifier.notify(&notification()).await.unwrap();
        let written = std::fs::read_to_string(&out).unwrap();
        assert_eq!(written.trim(), "r2 3");
    }

    #[tokio::test]
    async fn test_shell_command_notifier_nonzero_exit() {
        let notifier = ShellCommandNotifier::new("echo boom >&2; exit 3".to_string(), 10);
        assert_eq!(
            notifier.run(&notification()).await.unwrap(),
            CommandOutcome::Exited {
                code: Some(3),
                stderr: "boom".to_string(),
            }
        );
        // Non-zero exit only logs a warning
        assert!(notifier.notify(&notification()).await.is_ok());
    }

    #[tokio::test]
    async fn test_shell_command_notifier_reads_payload() {
        let notifier = ShellCommandNotifier::new("cat".to_string(), 10);
        let CommandOutcome::Succeeded { stdout } = notifier.run(&notification()).await.unwrap()
        else {
            panic!("cat should succeed");
        };
        let echoed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
        assert_eq!(echoed["recordingId"], "r2");
    }

    #[tokio::test]
    async fn test_shell_command_notifier_timeout() {
        let notifier = ShellCommandNotifier {
            command: "sleep 5".to_string(),
            timeout: Duration::from_millis(100),
        };
        assert_eq!(
            notifier.run(&notification()).await.unwrap(),
            CommandOutcome::TimedOut
        );
    }

    #[test]
    fn test_from_config_picks_notifier() {
        let _log = from_config(&NotifyConfig::default());
        let _shell = from_config(&NotifyConfig {
            command: "cat".to_string(),
            timeout_seconds: 5,
        });
    }
}
