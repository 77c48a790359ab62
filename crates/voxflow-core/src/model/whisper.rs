//! Bundled whisper.cpp speech engine via whisper-rs.
//!
//! Compiled only with the `local-inference` feature: building whisper.cpp
//! needs a native toolchain, and every other part of the local model
//! lifecycle works without it through the `SpeechModel` seam.

use anyhow::{Context, Result};
use std::path::Path;
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use super::SpeechModel;

/// whisper.cpp model held in memory for the lifetime of the manager.
pub struct WhisperSpeechModel {
    ctx: WhisperContext,
}

impl WhisperSpeechModel {
    /// Load a ggml model file from disk.
    pub fn load(model_path: &Path) -> Result<Self> {
        // Suppress verbose whisper.cpp logging
        whisper_rs::install_logging_hooks();

        if !model_path.exists() {
            anyhow::bail!(
                "Whisper model not found at: {}",
                model_path.display()
            );
        }

        let path = model_path
            .to_str()
            .context("Model path is not valid UTF-8")?;
        let ctx = WhisperContext::new_with_params(path, WhisperContextParameters::default())
            .context("Failed to load whisper model")?;
        Ok(Self { ctx })
    }
}

impl SpeechModel for WhisperSpeechModel {
    fn transcribe(&self, samples: &[f32], language: Option<&str>) -> Result<String> {
        let mut state = self
            .ctx
            .create_state()
            .context("Failed to create whisper state")?;

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        if let Some(lang) = language {
            params.set_language(Some(lang));
        }

        // Disable printing to stdout
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);

        state
            .full(params, samples)
            .context("Transcription failed")?;

        let num_segments = state.full_n_segments();
        let mut text = String::new();
        for i in 0..num_segments {
            if let Some(segment) = state.get_segment(i)
                && let Ok(segment_text) = segment.to_str()
            {
                text.push_str(segment_text);
            }
        }

        Ok(text.trim().to_string())
    }
}
