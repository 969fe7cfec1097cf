use crate::api::{ApiServer, AppState};
use crate::cache::InsightsCache;
use crate::config::Config;
use crate::db::{Database, SqliteRecordingLookup, SqliteStatusStore};
use crate::notify;
use crate::providers::{
    HttpSummaryProvider, HttpTaskExtractionProvider, HttpTranscriptionProvider, ProviderClient,
};
use crate::workflow::{Collaborators, InsightsWorkflow, Notifier};
use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

/// The wired-up service: one database, one cache, one workflow.
#[derive(Clone)]
pub struct Runtime {
    pub db: Database,
    pub cache: InsightsCache,
    pub workflow: InsightsWorkflow,
}

impl Runtime {
    pub fn from_config(config: &Config) -> Result<Self> {
        let db_path = config.database.resolve_path()?;
        info!("Using database at {}", db_path.display());
        let db = Database::open(&db_path)?;
        Self::with_database(config, db)
    }

    pub fn with_database(config: &Config, db: Database) -> Result<Self> {
        let cache = InsightsCache::new();
        let workflow = build_workflow(config, &db, &cache)?;
        Ok(Self {
            db,
            cache,
            workflow,
        })
    }

    pub fn app_state(&self) -> AppState {
        AppState {
            workflow: self.workflow.clone(),
            db: self.db.clone(),
            cache: self.cache.clone(),
        }
    }
}

pub fn build_workflow(
    config: &Config,
    db: &Database,
    cache: &InsightsCache,
) -> Result<InsightsWorkflow> {
    let client = ProviderClient::from_config(&config.providers)?;
    let providers = &config.providers;

    if providers.api_key.is_none() {
        warn!("No provider api_key configured; requests are sent unauthenticated");
    }

    let notifier: Arc<dyn Notifier> = Arc::from(notify::from_config(&config.notify));

    let collaborators = Collaborators {
        recordings: Arc::new(SqliteRecordingLookup::new(db.clone())),
        transcription: Arc::new(HttpTranscriptionProvider::new(
            client.clone(),
            providers.transcription_url.clone(),
            db.clone(),
        )),
        summary: Arc::new(HttpSummaryProvider::new(
            client.clone(),
            providers.summary_url.clone(),
            db.clone(),
        )),
        tasks: Arc::new(HttpTaskExtractionProvider::new(
            client,
            providers.tasks_url.clone(),
            db.clone(),
        )),
        status: Arc::new(SqliteStatusStore::new(db.clone())),
        cache: Arc::new(cache.clone()),
        notifier,
    };

    Ok(InsightsWorkflow::new(collaborators, config.retry.clone()))
}

pub async fn run_service(port_override: Option<u16>) -> Result<()> {
    info!("Starting InsightFlow service");

    let config = Config::load()?;
    let runtime = Runtime::from_config(&config)?;
    let port = port_override.unwrap_or(config.api.port);

    let api_server = ApiServer::new(port, runtime.app_state());

    info!("InsightFlow is ready!");
    info!(
        "Try: curl -X POST http://127.0.0.1:{}/recordings/<id>/process",
        port
    );

    tokio::select! {
        result = api_server.start() => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down");
            Ok(())
        }
    }
}
