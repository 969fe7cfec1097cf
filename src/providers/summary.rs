use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::db::{Database, InsightsRepository};
use crate::workflow::{SummaryProvider, Utterance};

use super::ProviderClient;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SummaryRequest<'a> {
    recording_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    utterances: Option<&'a [Utterance]>,
}

#[derive(Deserialize)]
struct SummaryResponse {
    summary: String,
}

pub struct HttpSummaryProvider {
    client: ProviderClient,
    url: String,
    db: Database,
}

impl HttpSummaryProvider {
    pub fn new(client: ProviderClient, url: impl Into<String>, db: Database) -> Self {
        Self {
            client,
            url: url.into(),
            db,
        }
    }
}

#[async_trait]
impl SummaryProvider for HttpSummaryProvider {
    async fn summarize(
        &self,
        recording_id: &str,
        text: &str,
        utterances: Option<&[Utterance]>,
    ) -> Result<()> {
        let response: SummaryResponse = self
            .client
            .post_json(
                &self.url,
                &SummaryRequest {
                    recording_id,
                    text,
                    utterances,
                },
            )
            .await?;

        if response.summary.trim().is_empty() {
            bail!("Summary service returned an empty summary");
        }

        let id = recording_id.to_string();
        self.db
            .call(move |conn| InsightsRepository::upsert_summary(conn, &id, &response.summary))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::test_server;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::time::Duration;

    fn provider(base: &str, db: Database) -> HttpSummaryProvider {
        HttpSummaryProvider::new(
            ProviderClient::new(None, Duration::from_secs(5)).unwrap(),
            format!("{}/summary", base),
            db,
        )
    }

    #[tokio::test]
    async fn test_summarize_stores_summary() {
        let app = Router::new().route(
            "/summary",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["text"], "we shipped it");
                assert!(body.get("utterances").is_none());
                Json(json!({"summary": "Release went out."}))
            }),
        );
        let base = test_server::spawn(app).await;
        let db = Database::open_in_memory().unwrap();

        provider(&base, db.clone())
            .summarize("r1", "we shipped it", None)
            .await
            .unwrap();

        let stored = db
            .with_conn(|conn| InsightsRepository::get_summary(conn, "r1"))
            .unwrap();
        assert_eq!(stored.as_deref(), Some("Release went out."));
    }

    #[tokio::test]
    async fn test_summarize_rejects_empty_summary() {
        let app = Router::new().route("/summary", post(|| async { Json(json!({"summary": " "})) }));
        let base = test_server::spawn(app).await;

        let err = provider(&base, Database::open_in_memory().unwrap())
            .summarize("r1", "text", None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("empty summary"));
    }
}
