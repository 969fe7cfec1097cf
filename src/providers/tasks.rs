use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::db::{Database, InsightsRepository, NewTask, TaskOwner};
use crate::workflow::{TaskExtractionProvider, Utterance};

use super::ProviderClient;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TasksRequest<'a> {
    recording_id: &'a str,
    project_id: &'a str,
    organization_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    utterances: Option<&'a [Utterance]>,
}

#[derive(Deserialize)]
struct TasksResponse {
    #[serde(default)]
    tasks: Vec<NewTask>,
}

/// Extracts action items and replaces the recording's stored tasks.
pub struct HttpTaskExtractionProvider {
    client: ProviderClient,
    url: String,
    db: Database,
}

impl HttpTaskExtractionProvider {
    pub fn new(client: ProviderClient, url: impl Into<String>, db: Database) -> Self {
        Self {
            client,
            url: url.into(),
            db,
        }
    }
}

#[async_trait]
impl TaskExtractionProvider for HttpTaskExtractionProvider {
    async fn extract_tasks(
        &self,
        recording_id: &str,
        project_id: &str,
        text: &str,
        organization_id: &str,
        created_by_id: &str,
        utterances: Option<&[Utterance]>,
    ) -> Result<u32> {
        let response: TasksResponse = self
            .client
            .post_json(
                &self.url,
                &TasksRequest {
                    recording_id,
                    project_id,
                    organization_id,
                    text,
                    utterances,
                },
            )
            .await?;

        let (recording_id, project_id, organization_id, created_by_id) = (
            recording_id.to_string(),
            project_id.to_string(),
            organization_id.to_string(),
            created_by_id.to_string(),
        );
        let stored = self
            .db
            .call(move |conn| {
                let owner = TaskOwner {
                    recording_id: &recording_id,
                    project_id: &project_id,
                    organization_id: &organization_id,
                    created_by_id: &created_by_id,
                };
                InsightsRepository::replace_tasks(conn, &owner, &response.tasks)
            })
            .await?;

        Ok(u32::try_from(stored)?)
    }
}
