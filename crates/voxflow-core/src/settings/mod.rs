//! Persistent settings, stored as JSON under the user config directory.
//!
//! The dictation engine reads settings once at session start through the
//! `SettingsSource` collaborator; nothing here is watched live.

mod cleanup;
mod transcription;
mod ui;

pub use cleanup::CleanupSettings;
pub use transcription::TranscriptionSettings;
pub use ui::UiSettings;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All persistent voxflow settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub transcription: TranscriptionSettings,

    #[serde(default)]
    pub cleanup: CleanupSettings,

    #[serde(default)]
    pub ui: UiSettings,
}

impl Settings {
    /// Path to the settings file: `<config dir>/voxflow/settings.json`
    pub fn path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("voxflow")
            .join("settings.json")
    }

    /// Load settings from disk, falling back to defaults when the file is
    /// missing or unreadable.
    pub fn load() -> Self {
        let path = Self::path();
        match std::fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                crate::warn!("Settings file {} is invalid ({e}), using defaults", path.display());
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Write settings to disk, creating the config directory if needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}
