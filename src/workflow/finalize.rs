//! Post-success cleanup. Best-effort: a failure here is logged and the run
//! still completes.

use tracing::{info, warn};

use super::collaborators::CacheInvalidator;
use super::error::Step;
use super::types::Recording;

/// Invalidate cached insights for the recording, its project and its
/// organization. Returns whether the invalidation went through.
pub async fn finalize(invalidator: &dyn CacheInvalidator, recording: &Recording) -> bool {
    match invalidator
        .invalidate(&recording.id, &recording.project_id, &recording.organization_id)
        .await
    {
        Ok(()) => {
            info!(
                recording_id = %recording.id,
                step = Step::Finalize.label(),
                "Invalidated cached insights"
            );
            true
        }
        Err(e) => {
            warn!(
                recording_id = %recording.id,
                step = Step::Finalize.label(),
                "Cache invalidation failed: {:#}",
                e
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeInvalidator {
        fail: bool,
        calls: Mutex<Vec<(String, String, String)>>,
    }

    #[async_trait]
    impl CacheInvalidator for FakeInvalidator {
        async fn invalidate(
            &self,
            recording_id: &str,
            project_id: &str,
            organization_id: &str,
        ) -> Result<()> {
            self.calls.lock().unwrap().push((
                recording_id.to_string(),
                project_id.to_string(),
                organization_id.to_string(),
            ));
            if self.fail {
                Err(anyhow!("redis unreachable"))
            } else {
                Ok(())
            }
        }
    }

    fn recording() -> Recording {
        Recording {
            id: "r1".to_string(),
            file_url: "https://files.example.com/r1.mp3".to_string(),
            transcription_text: Some("text".to_string()),
            project_id: "p1".to_string(),
            organization_id: "o1".to_string(),
            created_by_id: "u1".to_string(),
            title: "Retro".to_string(),
        }
    }

    #[tokio::test]
    async fn test_finalize_passes_recording_keys() {
        let invalidator = FakeInvalidator::default();
        assert!(finalize(&invalidator, &recording()).await);
        assert_eq!(
            invalidator.calls.lock().unwrap().clone(),
            vec![("r1".to_string(), "p1".to_string(), "o1".to_string())]
        );
    }

    #[tokio::test]
    async fn test_finalize_failure_is_swallowed() {
        let invalidator = FakeInvalidator {
            fail: true,
            ..Default::default()
        };
        assert!(!finalize(&invalidator, &recording()).await);
    }
}
