//! In-process cache for rendered insights.
//!
//! Entries carry tags (`recording:<id>`, `project:<id>`, `organization:<id>`)
//! so a finished run can drop everything that depends on the recording in one
//! call.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::workflow::CacheInvalidator;

pub fn recording_tag(recording_id: &str) -> String {
    format!("recording:{}", recording_id)
}

pub fn project_tag(project_id: &str) -> String {
    format!("project:{}", project_id)
}

pub fn organization_tag(organization_id: &str) -> String {
    format!("organization:{}", organization_id)
}

struct Entry {
    value: Value,
    tags: HashSet<String>,
}

#[derive(Default)]
struct Store {
    entries: HashMap<String, Entry>,
    /// Bumped on every invalidation.
    generation: u64,
}

#[derive(Clone, Default)]
pub struct InsightsCache {
    store: Arc<RwLock<Store>>,
}

impl InsightsCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, key: &str) -> Option<Value> {
        self.store
            .read()
            .await
            .entries
            .get(key)
            .map(|entry| entry.value.clone())
    }

    /// Current invalidation generation. Take it before loading a value and
    /// hand it to [`InsightsCache::insert_if_current`].
    pub async fn generation(&self) -> u64 {
        self.store.read().await.generation
    }

    pub async fn insert(&self, key: impl Into<String>, tags: Vec<String>, value: Value) {
        self.store.write().await.insert(key.into(), tags, value);
    }

    /// Store `value` only if no invalidation ran since `seen` was taken, so a
    /// value loaded before a run finished never outlives that run.
    pub async fn insert_if_current(
        &self,
        key: impl Into<String>,
        tags: Vec<String>,
        value: Value,
        seen: u64,
    ) -> bool {
        let mut store = self.store.write().await;
        if store.generation != seen {
            return false;
        }
        store.insert(key.into(), tags, value);
        true
    }

    /// Drop every entry carrying any of `tags`. Returns how many were removed.
    pub async fn invalidate_tags(&self, tags: &[String]) -> usize {
        let mut store = self.store.write().await;
        store.generation += 1;
        let before = store.entries.len();
        store
            .entries
            .retain(|_, entry| !tags.iter().any(|tag| entry.tags.contains(tag)));
        before - store.entries.len()
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.read().await.entries.is_empty()
    }
}

impl Store {
    fn insert(&mut self, key: String, tags: Vec<String>, value: Value) {
        self.entries.insert(
            key,
            Entry {
                value,
                tags: tags.into_iter().collect(),
            },
        );
    }
}

#[async_trait]
impl CacheInvalidator for InsightsCache {
    async fn invalidate(
        &self,
        recording_id: &str,
        project_id: &str,
        organization_id: &str,
    ) -> Result<()> {
        let removed = self
            .invalidate_tags(&[
                recording_tag(recording_id),
                project_tag(project_id),
                organization_tag(organization_id),
            ])
            .await;
        debug!(
            recording_id = %recording_id,
            "Dropped {} cached insight entries",
            removed
        );
        Ok(())
    }
}
