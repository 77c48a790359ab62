//! Local transcription through the managed on-device model.
//!
//! The backend refuses to run unless the model manager reports `Loaded`;
//! callers are expected to trigger a load first and watch its progress.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;

use super::{RawTranscript, SttBackend, SttRequest};
use crate::audio;
use crate::model::{ModelManager, ModelState};

/// Minimum usable recording length: ~0.1s at 16kHz
const MIN_SAMPLES: usize = 1600;
/// RMS below this is treated as silence (muted or dead microphone)
const SILENCE_RMS: f32 = 0.001;

/// Local on-device transcription provider
pub struct LocalSttProvider {
    models: Arc<ModelManager>,
}

impl LocalSttProvider {
    pub fn new(models: Arc<ModelManager>) -> Self {
        Self { models }
    }
}

#[async_trait]
impl SttBackend for LocalSttProvider {
    fn name(&self) -> &'static str {
        "local"
    }

    fn display_name(&self) -> &'static str {
        "Local Whisper"
    }

    async fn transcribe(
        &self,
        _client: &reqwest::Client,
        _api_key: &str,
        request: SttRequest,
    ) -> Result<RawTranscript> {
        let state = self.models.state();
        if !matches!(state, ModelState::Loaded) {
            anyhow::bail!("local speech model is not ready (currently {})", state.name());
        }
        let engine = self
            .models
            .speech_model()
            .context("No speech engine available in this build")?;

        let samples = audio::wav_to_whisper_samples(&request.audio_data)?;

        if samples.len() < MIN_SAMPLES {
            anyhow::bail!("Recording too short: speak for at least a second");
        }
        let rms = (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt();
        if rms < SILENCE_RMS {
            anyhow::bail!("No speech detected: microphone may be muted or too quiet");
        }

        // CPU-bound inference runs on the blocking pool
        let language = request.language.clone();
        let text = tokio::task::spawn_blocking(move || {
            engine.transcribe(&samples, language.as_deref())
        })
        .await
        .context("Transcription task panicked")??;

        if text.trim().is_empty() {
            anyhow::bail!("No speech detected: try speaking more clearly");
        }

        Ok(RawTranscript { text })
    }
}
