use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "insightflow")]
#[command(about = "Turn recordings into transcripts, summaries and tasks", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Process a recording and print the result as JSON
    Process(ProcessCliArgs),
    /// Show the last workflow status of a recording
    Status(StatusCliArgs),
    /// Register a recording in the local database
    Import(ImportCliArgs),
    /// Run the HTTP API (default when no command is given)
    Serve(ServeCliArgs),
    /// Print version information
    Version,
}

#[derive(ClapArgs, Debug)]
pub struct ProcessCliArgs {
    /// Recording to process
    pub recording_id: String,
    /// Reuse an existing transcript instead of transcribing again
    #[arg(long)]
    pub reprocess: bool,
}

#[derive(ClapArgs, Debug)]
pub struct StatusCliArgs {
    pub recording_id: String,
}

#[derive(ClapArgs, Debug)]
pub struct ImportCliArgs {
    #[arg(long)]
    pub id: String,
    /// Location of the audio file
    #[arg(long)]
    pub file_url: String,
    #[arg(long)]
    pub project: String,
    #[arg(long)]
    pub organization: String,
    /// User that created the recording
    #[arg(long)]
    pub created_by: String,
    #[arg(long, default_value = "Untitled recording")]
    pub title: String,
    /// Existing transcript text
    #[arg(long)]
    pub transcript: Option<String>,
}

#[derive(ClapArgs, Debug)]
pub struct ServeCliArgs {
    /// Override the configured API port
    #[arg(short, long)]
    pub port: Option<u16>,
}
