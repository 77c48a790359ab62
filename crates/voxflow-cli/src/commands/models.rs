//! `voxflow models` — list, download and inspect local speech models.

use anyhow::{Result, anyhow};
use clap::{Args, Subcommand};

use voxflow_core::model::{ModelManager, ModelSize, catalog};
use voxflow_core::settings::Settings;

use super::transcribe::ensure_model_ready;

#[derive(Args)]
pub struct ModelsArgs {
    #[command(subcommand)]
    command: ModelsCommand,
}

#[derive(Subcommand)]
enum ModelsCommand {
    /// List available models and whether they are downloaded
    List,
    /// Download and initialize a model (tiny, base, small, medium)
    Download { size: String },
    /// Show the lifecycle state of the configured model
    Status,
}

pub async fn run(args: ModelsArgs) -> Result<()> {
    match args.command {
        ModelsCommand::List => list(),
        ModelsCommand::Download { size } => download(&size).await,
        ModelsCommand::Status => status(),
    }
}

fn list() -> Result<()> {
    let configured = Settings::load().transcription.local_model_size;
    for info in catalog() {
        let downloaded = info
            .files
            .iter()
            .all(|f| info.size.default_dir().join(f.name).is_file());
        let marker = if info.size == configured { "*" } else { " " };
        let state = if downloaded { "downloaded" } else { "not downloaded" };
        println!("{marker} {:<8} {:<45} [{state}]", info.size, info.description);
    }
    Ok(())
}

async fn download(size: &str) -> Result<()> {
    let size: ModelSize = size.parse().map_err(|e: String| anyhow!(e))?;
    let models = ModelManager::new(size);
    ensure_model_ready(&models).await?;
    println!("Model '{size}' is ready in {}", models.dir().display());
    Ok(())
}

fn status() -> Result<()> {
    let size = Settings::load().transcription.local_model_size;
    let models = ModelManager::new(size);
    println!("Configured model: {size}");
    println!("Directory:        {}", models.dir().display());
    println!("State:            {}", models.state().name());
    println!(
        "Files on disk:    {}",
        if files_on_disk(size) { "complete" } else { "incomplete" }
    );
    Ok(())
}

fn files_on_disk(size: ModelSize) -> bool {
    size.info()
        .files
        .iter()
        .all(|f| size.default_dir().join(f.name).is_file())
}
