//! STT provider abstraction and registry.
//!
//! Each backend implements `SttBackend`; the registry hands out lazily
//! created singletons keyed by `SttProvider`, so a session resolves its
//! backend exactly once at start and never branches on provider kind again.

mod base;
mod deepgram;
mod groq;
mod local;
mod openai;

pub use deepgram::DeepgramSttProvider;
pub use groq::GroqSttProvider;
pub use local::LocalSttProvider;
pub use openai::OpenAiSttProvider;

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::cleanup::{CleanupBackend, GroqCleanupProvider, OpenAiCleanupProvider};
use crate::config::{CleanupProvider, SttProvider};
use crate::model::ModelManager;

/// One audio buffer headed to an STT backend.
#[derive(Debug, Clone)]
pub struct SttRequest {
    /// Encoded audio bytes
    pub audio_data: Vec<u8>,
    /// Language hint (None = auto-detect)
    pub language: Option<String>,
    /// Filename to report in multipart uploads
    pub filename: String,
    /// MIME type of the audio data
    pub mime_type: String,
}

/// Raw transcription text returned by an STT backend.
#[derive(Debug, Clone)]
pub struct RawTranscript {
    pub text: String,
}

/// Contract every STT backend implements.
#[async_trait]
pub trait SttBackend: Send + Sync {
    /// Stable identifier, e.g. "openai"
    fn name(&self) -> &'static str;

    /// Human-readable name, e.g. "OpenAI Whisper"
    fn display_name(&self) -> &'static str;

    /// Transcribe an audio buffer. `api_key` is empty for the local backend.
    async fn transcribe(
        &self,
        client: &reqwest::Client,
        api_key: &str,
        request: SttRequest,
    ) -> Result<RawTranscript>;
}

/// Lazily-built singleton backends, one per provider kind.
///
/// `register_*` replaces a backend, which is how tests substitute scripted
/// providers and how embedders plug in custom ones.
pub struct ProviderRegistry {
    models: Arc<ModelManager>,
    stt: Mutex<HashMap<SttProvider, Arc<dyn SttBackend>>>,
    cleanup: Mutex<HashMap<CleanupProvider, Arc<dyn CleanupBackend>>>,
}

impl ProviderRegistry {
    pub fn new(models: Arc<ModelManager>) -> Self {
        Self {
            models,
            stt: Mutex::new(HashMap::new()),
            cleanup: Mutex::new(HashMap::new()),
        }
    }

    /// Get (or create) the backend for an STT provider.
    pub fn stt(&self, kind: SttProvider) -> Arc<dyn SttBackend> {
        let mut cache = self.stt.lock().unwrap();
        cache
            .entry(kind)
            .or_insert_with(|| match kind {
                SttProvider::OpenAI => Arc::new(OpenAiSttProvider) as Arc<dyn SttBackend>,
                SttProvider::Groq => Arc::new(GroqSttProvider),
                SttProvider::Deepgram => Arc::new(DeepgramSttProvider),
                SttProvider::Local => Arc::new(LocalSttProvider::new(Arc::clone(&self.models))),
            })
            .clone()
    }

    /// Get (or create) the backend for a cleanup provider. `None` has no
    /// backend: cleanup is simply skipped.
    pub fn cleanup(&self, kind: CleanupProvider) -> Option<Arc<dyn CleanupBackend>> {
        if kind == CleanupProvider::None {
            return None;
        }
        let mut cache = self.cleanup.lock().unwrap();
        Some(
            cache
                .entry(kind)
                .or_insert_with(|| match kind {
                    CleanupProvider::OpenAI => {
                        Arc::new(OpenAiCleanupProvider) as Arc<dyn CleanupBackend>
                    }
                    CleanupProvider::Groq => Arc::new(GroqCleanupProvider),
                    CleanupProvider::None => unreachable!(),
                })
                .clone(),
        )
    }

    /// Replace the backend used for an STT provider.
    pub fn register_stt(&self, kind: SttProvider, backend: Arc<dyn SttBackend>) {
        self.stt.lock().unwrap().insert(kind, backend);
    }

    /// Replace the backend used for a cleanup provider.
    pub fn register_cleanup(&self, kind: CleanupProvider, backend: Arc<dyn CleanupBackend>) {
        self.cleanup.lock().unwrap().insert(kind, backend);
    }
}
