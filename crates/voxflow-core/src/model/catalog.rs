//! Static catalog of downloadable whisper-class models.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// One file making up a model. A model may consist of several files, each
/// downloaded and verified independently.
#[derive(Debug, Clone, Copy)]
pub struct ModelFile {
    pub name: &'static str,
    pub url: &'static str,
    pub size_mb: u64,
}

/// Catalog entry for one model size.
#[derive(Debug, Clone, Copy)]
pub struct ModelInfo {
    pub size: ModelSize,
    pub description: &'static str,
    pub files: &'static [ModelFile],
}

/// Available local model sizes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ModelSize {
    Tiny,
    #[default]
    Base,
    Small,
    Medium,
}

const CATALOG: &[ModelInfo] = &[
    ModelInfo {
        size: ModelSize::Tiny,
        description: "~75 MB - Fastest, lower quality",
        files: &[ModelFile {
            name: "ggml-tiny.bin",
            url: "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-tiny.bin",
            size_mb: 75,
        }],
    },
    ModelInfo {
        size: ModelSize::Base,
        description: "~142 MB - Fast, decent quality (recommended)",
        files: &[ModelFile {
            name: "ggml-base.bin",
            url: "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-base.bin",
            size_mb: 142,
        }],
    },
    ModelInfo {
        size: ModelSize::Small,
        description: "~466 MB - Balanced quality and speed",
        files: &[ModelFile {
            name: "ggml-small.bin",
            url: "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-small.bin",
            size_mb: 466,
        }],
    },
    ModelInfo {
        size: ModelSize::Medium,
        description: "~1.5 GB - Better quality, slower",
        files: &[ModelFile {
            name: "ggml-medium.bin",
            url: "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-medium.bin",
            size_mb: 1500,
        }],
    },
];

/// All known models, smallest first
pub fn catalog() -> &'static [ModelInfo] {
    CATALOG
}

impl ModelSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelSize::Tiny => "tiny",
            ModelSize::Base => "base",
            ModelSize::Small => "small",
            ModelSize::Medium => "medium",
        }
    }

    pub fn all() -> &'static [ModelSize] {
        &[
            ModelSize::Tiny,
            ModelSize::Base,
            ModelSize::Small,
            ModelSize::Medium,
        ]
    }

    /// Catalog entry for this size
    pub fn info(&self) -> &'static ModelInfo {
        CATALOG
            .iter()
            .find(|info| info.size == *self)
            .expect("every model size has a catalog entry")
    }

    /// Default directory where this model's files are stored
    pub fn default_dir(&self) -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("voxflow")
            .join("models")
            .join(self.as_str())
    }
}

impl fmt::Display for ModelSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ModelSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tiny" => Ok(ModelSize::Tiny),
            "base" => Ok(ModelSize::Base),
            "small" => Ok(ModelSize::Small),
            "medium" => Ok(ModelSize::Medium),
            _ => Err(format!(
                "Unknown model size: {}. Available: tiny, base, small, medium",
                s
            )),
        }
    }
}
