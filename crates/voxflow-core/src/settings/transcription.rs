//! Transcription settings: provider choice, credentials, language, model size.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::SttProvider;
use crate::model::ModelSize;

/// Settings for the speech-to-text stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionSettings {
    /// Selected STT provider
    #[serde(default)]
    pub provider: SttProvider,

    /// API keys by provider identifier ("openai", "groq", "deepgram")
    #[serde(default)]
    pub api_keys: HashMap<String, String>,

    /// Language hint passed to providers (None = auto-detect)
    #[serde(default)]
    pub language: Option<String>,

    /// Model size used by the local provider
    #[serde(default)]
    pub local_model_size: ModelSize,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            provider: SttProvider::default(),
            api_keys: HashMap::new(),
            language: None,
            local_model_size: ModelSize::default(),
        }
    }
}

impl TranscriptionSettings {
    /// Get the API key for a provider, falling back to its environment variable.
    ///
    /// Returns None for the local provider, which needs no key.
    pub fn api_key_for(&self, provider: &SttProvider) -> Option<String> {
        if !provider.requires_api_key() {
            return None;
        }
        self.api_keys
            .get(provider.as_str())
            .filter(|k| !k.is_empty())
            .cloned()
            .or_else(|| std::env::var(provider.api_key_env_var()).ok())
    }

    /// Check whether the selected provider has everything it needs configured.
    pub fn is_configured(&self) -> bool {
        if self.provider.requires_api_key() {
            self.api_key_for(&self.provider).is_some()
        } else {
            true
        }
    }
}
