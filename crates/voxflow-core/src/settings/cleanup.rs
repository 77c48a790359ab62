//! Cleanup settings for LLM-based transcript post-processing.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::CleanupProvider;

/// Settings for the transcript cleanup stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupSettings {
    /// Whether cleanup runs at all
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// LLM provider for cleanup (grammar, punctuation, filler removal)
    #[serde(default)]
    pub provider: CleanupProvider,

    /// Custom cleanup instructions (uses the built-in prompt if None)
    #[serde(default)]
    pub prompt: Option<String>,

    /// Strip common filler words before the LLM call
    #[serde(default)]
    pub filler_word_removal: bool,
}

fn default_enabled() -> bool {
    true
}

impl Default for CleanupSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: CleanupProvider::default(),
            prompt: None,
            filler_word_removal: false,
        }
    }
}

impl CleanupSettings {
    /// Get the API key for the configured cleanup provider.
    pub fn api_key(&self, api_keys: &HashMap<String, String>) -> Option<String> {
        Self::api_key_for(self.provider, api_keys)
    }

    /// Get the API key for any cleanup provider from the shared key map,
    /// falling back to the provider's environment variable. Used directly
    /// when a power mode overrides the configured provider.
    pub fn api_key_for(
        provider: CleanupProvider,
        api_keys: &HashMap<String, String>,
    ) -> Option<String> {
        let env_var = provider.api_key_env_var()?;
        api_keys
            .get(provider.as_str())
            .filter(|k| !k.is_empty())
            .cloned()
            .or_else(|| std::env::var(env_var).ok())
    }
}
