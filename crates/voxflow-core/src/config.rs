use serde::{Deserialize, Serialize};
use std::fmt;

/// Available STT providers
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SttProvider {
    #[default]
    OpenAI,
    Groq,
    Deepgram,
    Local,
}

impl SttProvider {
    /// Get the string identifier for this provider
    pub fn as_str(&self) -> &'static str {
        match self {
            SttProvider::OpenAI => "openai",
            SttProvider::Groq => "groq",
            SttProvider::Deepgram => "deepgram",
            SttProvider::Local => "local",
        }
    }

    /// Get the environment variable name for this provider's API key
    pub fn api_key_env_var(&self) -> &'static str {
        match self {
            SttProvider::OpenAI => "OPENAI_API_KEY",
            SttProvider::Groq => "GROQ_API_KEY",
            SttProvider::Deepgram => "DEEPGRAM_API_KEY",
            SttProvider::Local => "VOXFLOW_MODEL_DIR",
        }
    }

    /// List all available providers
    pub fn all() -> &'static [SttProvider] {
        &[
            SttProvider::OpenAI,
            SttProvider::Groq,
            SttProvider::Deepgram,
            SttProvider::Local,
        ]
    }

    /// Human-readable display name for this provider
    pub fn display_name(&self) -> &'static str {
        match self {
            SttProvider::OpenAI => "OpenAI Whisper",
            SttProvider::Groq => "Groq Whisper",
            SttProvider::Deepgram => "Deepgram",
            SttProvider::Local => "Local Whisper",
        }
    }

    /// Whether this provider requires an API key (vs an on-device model)
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, SttProvider::Local)
    }
}

impl fmt::Display for SttProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SttProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(SttProvider::OpenAI),
            "groq" => Ok(SttProvider::Groq),
            "deepgram" => Ok(SttProvider::Deepgram),
            "local" | "local-whisper" | "whisper" => Ok(SttProvider::Local),
            _ => Err(format!(
                "Unknown STT provider: {}. Available: openai, groq, deepgram, local",
                s
            )),
        }
    }
}

/// Available cleanup providers (LLM for transcript cleanup)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CleanupProvider {
    #[default]
    OpenAI,
    Groq,
    None,
}

impl CleanupProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            CleanupProvider::OpenAI => "openai",
            CleanupProvider::Groq => "groq",
            CleanupProvider::None => "none",
        }
    }

    /// Whether this cleanup provider requires an API key
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, CleanupProvider::None)
    }

    /// Environment variable consulted when no key is stored in settings
    pub fn api_key_env_var(&self) -> Option<&'static str> {
        match self {
            CleanupProvider::None => None,
            CleanupProvider::OpenAI => Some("OPENAI_API_KEY"),
            CleanupProvider::Groq => Some("GROQ_API_KEY"),
        }
    }
}

impl fmt::Display for CleanupProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for CleanupProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(CleanupProvider::OpenAI),
            "groq" => Ok(CleanupProvider::Groq),
            "none" => Ok(CleanupProvider::None),
            _ => Err(format!(
                "Unknown cleanup provider: {}. Available: openai, groq, none",
                s
            )),
        }
    }
}
