use crate::app::Runtime;
use crate::config::Config;
use crate::db::{Database, RecordingRepository};
use crate::workflow::{Recording, WorkflowResult};
use anyhow::Result;
use tracing::info;

pub mod args;

pub use args::{Cli, CliCommand, ImportCliArgs, ProcessCliArgs, ServeCliArgs, StatusCliArgs};

/// Runs the workflow to completion and prints the result. Returns whether
/// the run completed, so the caller can pick the exit code.
pub async fn handle_process_command(args: ProcessCliArgs) -> Result<bool> {
    let config = Config::load()?;
    let runtime = Runtime::from_config(&config)?;

    let result = process_recording(&runtime, &args).await;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(result.is_completed())
}

pub async fn process_recording(runtime: &Runtime, args: &ProcessCliArgs) -> WorkflowResult {
    match runtime
        .workflow
        .convert_recording_into_ai_insights(&args.recording_id, args.reprocess)
        .await
    {
        Ok(result) => result,
        Err(err) => WorkflowResult::failed(args.recording_id.clone(), &err),
    }
}

pub async fn handle_status_command(args: StatusCliArgs) -> Result<()> {
    let config = Config::load()?;
    let runtime = Runtime::from_config(&config)?;

    match runtime
        .workflow
        .status_tracker()
        .read(&args.recording_id)
        .await?
    {
        Some(status) => println!("{}", serde_json::to_string_pretty(&status)?),
        None => println!("No workflow status recorded for {}", args.recording_id),
    }

    Ok(())
}

pub fn handle_import_command(args: ImportCliArgs) -> Result<()> {
    let config = Config::load()?;
    let db = Database::open(&config.database.resolve_path()?)?;

    let recording = import_recording(&db, args)?;
    println!("Imported recording {} ({})", recording.id, recording.title);
    Ok(())
}

pub fn import_recording(db: &Database, args: ImportCliArgs) -> Result<Recording> {
    let recording = Recording {
        id: args.id,
        file_url: args.file_url,
        transcription_text: args.transcript,
        project_id: args.project,
        organization_id: args.organization,
        created_by_id: args.created_by,
        title: args.title,
    };

    db.with_conn(|conn| RecordingRepository::upsert(conn, &recording))?;
    info!("Stored recording {}", recording.id);
    Ok(recording)
}
