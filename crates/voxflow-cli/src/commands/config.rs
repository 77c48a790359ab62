//! `voxflow config` — show or change persistent settings.

use anyhow::{Result, anyhow, bail};
use clap::Args;

use voxflow_core::settings::Settings;

#[derive(Args)]
pub struct ConfigArgs {
    /// Set the STT provider (openai, groq, deepgram, local)
    #[arg(long)]
    stt_provider: Option<String>,

    /// Set the cleanup provider (openai, groq, none)
    #[arg(long)]
    cleanup_provider: Option<String>,

    /// Enable or disable LLM cleanup
    #[arg(long)]
    cleanup: Option<bool>,

    /// Store an API key as provider=key, e.g. --api-key openai=sk-...
    #[arg(long)]
    api_key: Option<String>,

    /// Set the language hint ("auto" clears it)
    #[arg(long)]
    language: Option<String>,

    /// Set the local model size (tiny, base, small, medium)
    #[arg(long)]
    model_size: Option<String>,
}

pub fn run(args: ConfigArgs) -> Result<()> {
    let mut settings = Settings::load();
    let mut changed = false;

    if let Some(provider) = args.stt_provider.as_deref() {
        settings.transcription.provider = provider.parse().map_err(|e: String| anyhow!(e))?;
        changed = true;
    }
    if let Some(provider) = args.cleanup_provider.as_deref() {
        settings.cleanup.provider = provider.parse().map_err(|e: String| anyhow!(e))?;
        changed = true;
    }
    if let Some(enabled) = args.cleanup {
        settings.cleanup.enabled = enabled;
        changed = true;
    }
    if let Some(pair) = args.api_key.as_deref() {
        let Some((provider, key)) = pair.split_once('=') else {
            bail!("--api-key expects provider=key, e.g. --api-key openai=sk-...");
        };
        settings
            .transcription
            .api_keys
            .insert(provider.trim().to_lowercase(), key.trim().to_string());
        changed = true;
    }
    if let Some(language) = args.language.as_deref() {
        settings.transcription.language = match language {
            "auto" => None,
            other => Some(other.to_string()),
        };
        changed = true;
    }
    if let Some(size) = args.model_size.as_deref() {
        settings.transcription.local_model_size = size.parse().map_err(|e: String| anyhow!(e))?;
        changed = true;
    }

    if changed {
        settings.save()?;
        println!("Settings saved to {}", Settings::path().display());
        return Ok(());
    }

    show(&settings);
    Ok(())
}

fn show(settings: &Settings) {
    println!("STT provider:     {}", settings.transcription.provider);
    println!("Cleanup provider: {}", settings.cleanup.provider);
    println!(
        "Cleanup enabled:  {}",
        if settings.cleanup.enabled { "yes" } else { "no" }
    );
    println!(
        "Language:         {}",
        settings.transcription.language.as_deref().unwrap_or("auto")
    );
    println!(
        "Local model:      {}",
        settings.transcription.local_model_size
    );
    for provider in voxflow_core::SttProvider::all() {
        if !provider.requires_api_key() {
            continue;
        }
        let configured = settings
            .transcription
            .api_keys
            .get(provider.as_str())
            .is_some_and(|k| !k.is_empty());
        println!(
            "{:<17} {}",
            format!("{} key:", provider.display_name()),
            if configured { "configured" } else { "not set" }
        );
    }
}
