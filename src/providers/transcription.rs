use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::db::{Database, RecordingRepository};
use crate::workflow::{TranscriptionProvider, Utterance};

use super::ProviderClient;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TranscribeRequest<'a> {
    recording_id: &'a str,
    file_url: &'a str,
}

#[derive(Deserialize)]
struct TranscribeResponse {
    text: String,
    #[serde(default)]
    utterances: Vec<Utterance>,
}

/// Sends the audio URL to the speech-to-text service and stores the
/// transcript and utterances on the recording.
pub struct HttpTranscriptionProvider {
    client: ProviderClient,
    url: String,
    db: Database,
}

impl HttpTranscriptionProvider {
    pub fn new(client: ProviderClient, url: impl Into<String>, db: Database) -> Self {
        Self {
            client,
            url: url.into(),
            db,
        }
    }
}

#[async_trait]
impl TranscriptionProvider for HttpTranscriptionProvider {
    async fn transcribe(&self, recording_id: &str, file_url: &str) -> Result<()> {
        let response: TranscribeResponse = self
            .client
            .post_json(
                &self.url,
                &TranscribeRequest {
                    recording_id,
                    file_url,
                },
            )
            .await?;

        debug!(
            recording_id = %recording_id,
            "Transcription returned {} chars, {} utterances",
            response.text.len(),
            response.utterances.len()
        );

        let id = recording_id.to_string();
        self.db
            .call(move |conn| {
                if !RecordingRepository::set_transcription(conn, &id, &response.text)? {
                    return Err(anyhow!("Recording {} disappeared during transcription", id));
                }
                RecordingRepository::replace_utterances(conn, &id, &response.utterances)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::test_server;
    use crate::workflow::Recording;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::time::Duration;

    fn recording() -> Recording {
        Recording {
            id: "r1".to_string(),
            file_url: "https://files.example.com/r1.mp3".to_string(),
            transcription_text: None,
            project_id: "p1".to_string(),
            organization_id: "o1".to_string(),
            created_by_id: "u1".to_string(),
            title: "Standup".to_string(),
        }
    }

    #[tokio::test]
    async fn test_transcribe_persists_text_and_utterances() {
        let app = Router::new().route(
            "/transcribe",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["recordingId"], "r1");
                assert_eq!(body["fileUrl"], "https://files.example.com/r1.mp3");
                Json(json!({
                    "text": "hello team",
                    "utterances": [
                        {"speaker": "A", "text": "hello", "startMs": 0},
                        {"speaker": "B", "text": "team", "startMs": 800}
                    ]
                }))
            }),
        );
        let base = test_server::spawn(app).await;

        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| RecordingRepository::upsert(conn, &recording()))
            .unwrap();

        let provider = HttpTranscriptionProvider::new(
            ProviderClient::new(None, Duration::from_secs(5)).unwrap(),
            format!("{}/transcribe", base),
            db.clone(),
        );
        provider
            .transcribe("r1", "https://files.example.com/r1.mp3")
            .await
            .unwrap();

        let stored = db
            .with_conn(|conn| RecordingRepository::get(conn, "r1"))
            .unwrap()
            .unwrap();
        assert_eq!(stored.transcription_text.as_deref(), Some("hello team"));

        let utterances = db
            .with_conn(|conn| RecordingRepository::utterances(conn, "r1"))
            .unwrap();
        assert_eq!(utterances.len(), 2);
        assert_eq!(utterances[1].speaker, "B");
    }

    #[tokio::test]
    async fn test_transcribe_unknown_recording_fails() {
        let app = Router::new().route(
            "/transcribe",
            post(|| async { Json(json!({"text": "orphan"})) }),
        );
        let base = test_server::spawn(app).await;

        let provider = HttpTranscriptionProvider::new(
            ProviderClient::new(None, Duration::from_secs(5)).unwrap(),
            format!("{}/transcribe", base),
            Database::open_in_memory().unwrap(),
        );

        assert!(provider.transcribe("missing", "x").await.is_err());
    }
}
