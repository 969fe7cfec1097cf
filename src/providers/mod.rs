//! HTTP-backed AI providers.
//!
//! Each provider POSTs a JSON request to its configured endpoint and stores
//! what comes back in the local database, so the workflow only ever sees
//! success or failure.

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;

use crate::config::ProvidersConfig;

mod summary;
mod tasks;
mod transcription;

pub use summary::HttpSummaryProvider;
pub use tasks::HttpTaskExtractionProvider;
pub use transcription::HttpTranscriptionProvider;

/// Thin JSON client shared by the providers.
#[derive(Clone)]
pub struct ProviderClient {
    client: reqwest::Client,
    api_key: Option<String>,
}

impl ProviderClient {
    pub fn new(api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        })
    }

    pub fn from_config(config: &ProvidersConfig) -> Result<Self> {
        Self::new(
            config.api_key.clone(),
            Duration::from_secs(config.timeout_seconds),
        )
    }

    /// POST `body` as JSON and decode the JSON response.
    pub async fn post_json<B, R>(&self, url: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let mut request = self.client.post(url).json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", url))?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(anyhow::anyhow!("Request failed ({}): {}", status, text));
        }

        serde_json::from_str(&text).with_context(|| format!("Failed to parse response: {}", text))
    }
}
