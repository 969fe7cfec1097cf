use anyhow::Result;
use clap::Parser;
use insightflow::{
    app,
    cli::{
        handle_import_command, handle_process_command, handle_status_command, Cli, CliCommand,
    },
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_level = if cli.verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Some(CliCommand::Version) => {
            println!("InsightFlow {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Some(CliCommand::Process(args)) => {
            if !handle_process_command(args).await? {
                std::process::exit(1);
            }
            Ok(())
        }
        Some(CliCommand::Status(args)) => handle_status_command(args).await,
        Some(CliCommand::Import(args)) => handle_import_command(args),
        Some(CliCommand::Serve(args)) => app::run_service(args.port).await,
        None => app::run_service(None).await,
    }
}
