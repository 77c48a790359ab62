//! `voxflow transcribe` — run one recording through the full pipeline.

use anyhow::{Result, anyhow, bail};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

use voxflow_core::engine::{Collaborators, DictationEngine, SessionOutcome};
use voxflow_core::model::{
    DEFAULT_POLL_INTERVAL, DEFAULT_POLL_TIMEOUT, ModelEvent, ModelManager, ModelState,
};
use voxflow_core::settings::Settings;
use voxflow_core::SttProvider;

use crate::collab;

#[derive(Args)]
pub struct TranscribeArgs {
    /// Audio recording to transcribe (WAV)
    pub file: PathBuf,

    /// Override the configured STT provider (openai, groq, deepgram, local)
    #[arg(long)]
    pub provider: Option<String>,

    /// Language hint, e.g. "en" (overrides settings)
    #[arg(long)]
    pub language: Option<String>,

    /// Skip LLM cleanup for this run
    #[arg(long)]
    pub no_cleanup: bool,

    /// Foreground process name to match power modes against
    #[arg(long)]
    pub app: Option<String>,

    /// Window title to match power modes against
    #[arg(long)]
    pub title: Option<String>,
}

pub async fn run(args: TranscribeArgs) -> Result<()> {
    let mut settings = Settings::load();
    if let Some(provider) = args.provider.as_deref() {
        settings.transcription.provider = provider.parse().map_err(|e: String| anyhow!(e))?;
    }
    if let Some(language) = args.language.clone() {
        settings.transcription.language = Some(language);
    }
    if args.no_cleanup {
        settings.cleanup.enabled = false;
    }

    let models = ModelManager::new(settings.transcription.local_model_size);
    if settings.transcription.provider == SttProvider::Local {
        ensure_model_ready(&models).await?;
    }

    let engine = DictationEngine::new(
        Collaborators {
            settings: Box::new(collab::SnapshotSettings(settings)),
            capture: Box::new(collab::FileCapture::new(args.file)),
            injector: Box::new(collab::StdoutInjector),
            history: Box::new(collab::JsonHistory::default_path()),
            snippets: Box::new(collab::JsonSnippets::default_path()),
            power_modes: Box::new(collab::JsonPowerModes::default_path()),
            window: Box::new(collab::CliWindow {
                process_name: args.app,
                title: args.title,
            }),
        },
        models,
    );

    engine.start()?;
    match engine.stop().await? {
        SessionOutcome::Completed(record) => {
            eprintln!(
                "Done: {} words from {}s of audio",
                record.word_count, record.duration_secs
            );
            Ok(())
        }
        SessionOutcome::Cancelled => {
            engine.acknowledge();
            eprintln!("Cancelled");
            Ok(())
        }
    }
}

/// Trigger a model load if needed and render its progress until ready.
pub async fn ensure_model_ready(models: &Arc<ModelManager>) -> Result<()> {
    if matches!(models.state(), ModelState::Loaded) {
        return Ok(());
    }

    eprintln!("Preparing local model '{}'...", models.size());
    let mut events = models.subscribe();
    models.request_load();

    let printer = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                ModelEvent::Progress { percent } => {
                    eprint!("\rDownloading... {percent}%");
                }
                ModelEvent::FileDone { file } => {
                    eprintln!("\r{file} complete");
                }
                ModelEvent::Ready => {
                    eprintln!("Model ready");
                    break;
                }
            }
        }
    });

    let state = models
        .wait_until_ready(DEFAULT_POLL_INTERVAL, DEFAULT_POLL_TIMEOUT)
        .await;
    printer.abort();

    match state {
        ModelState::Loaded => Ok(()),
        ModelState::Error { cause } => bail!("Model load failed: {cause}"),
        other => bail!("Model not ready after waiting (state: {})", other.name()),
    }
}
