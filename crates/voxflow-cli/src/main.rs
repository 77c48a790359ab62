mod collab;
mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "voxflow", version, about = "Voice dictation pipeline from the terminal")]
struct Cli {
    /// Print verbose diagnostics to stderr
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a recording through the full dictation pipeline
    Transcribe(commands::transcribe::TranscribeArgs),
    /// Manage local speech models
    Models(commands::models::ModelsArgs),
    /// Show or change settings
    Config(commands::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    voxflow_core::set_verbose(cli.verbose);

    match cli.command {
        Command::Transcribe(args) => commands::transcribe::run(args).await,
        Command::Models(args) => commands::models::run(args).await,
        Command::Config(args) => commands::config::run(args),
    }
}
