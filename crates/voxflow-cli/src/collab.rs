//! CLI implementations of the engine's collaborator seams.
//!
//! Audio comes from a file instead of a microphone, injection prints to
//! stdout, and history/snippets/power modes live in JSON files next to the
//! settings.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Mutex;

use voxflow_core::error::CaptureError;
use voxflow_core::power_mode::{PowerMode, WindowContext};
use voxflow_core::services::{
    AudioCapture, CapturedAudio, HistorySink, InjectionOutcome, PowerModeSource, SettingsSource,
    SnippetSource, TextInjector, WindowContextSource,
};
use voxflow_core::settings::Settings;
use voxflow_core::snippet::Snippet;
use voxflow_core::TranscriptionRecord;

/// Settings snapshot taken when the command started.
pub struct SnapshotSettings(pub Settings);

impl SettingsSource for SnapshotSettings {
    fn snapshot(&self) -> Settings {
        self.0.clone()
    }
}

/// "Capture" that replays an audio file. `open` validates the file, `close`
/// hands over its bytes.
pub struct FileCapture {
    path: PathBuf,
    open: Mutex<bool>,
}

impl FileCapture {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            open: Mutex::new(false),
        }
    }

    fn mime_type(&self) -> &'static str {
        match self
            .path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("wav") => "audio/wav",
            Some("mp3") => "audio/mpeg",
            Some("webm") => "audio/webm",
            _ => "application/octet-stream",
        }
    }

    /// Recording length in whole seconds, when the file is a readable WAV.
    fn duration_secs(&self) -> u64 {
        let Ok(reader) = hound::WavReader::open(&self.path) else {
            return 0;
        };
        let spec = reader.spec();
        if spec.sample_rate == 0 {
            return 0;
        }
        u64::from(reader.duration() / spec.sample_rate)
    }
}

impl AudioCapture for FileCapture {
    fn open(&self) -> Result<(), CaptureError> {
        if !self.path.is_file() {
            return Err(CaptureError::Unavailable(format!(
                "audio file not found: {}",
                self.path.display()
            )));
        }
        *self.open.lock().unwrap() = true;
        Ok(())
    }

    fn close(&self) -> Result<CapturedAudio, CaptureError> {
        let mut open = self.open.lock().unwrap();
        if !*open {
            return Err(CaptureError::Stream("capture was never opened".to_string()));
        }
        *open = false;

        let data = std::fs::read(&self.path)
            .map_err(|e| CaptureError::Stream(format!("{}: {e}", self.path.display())))?;
        Ok(CapturedAudio {
            duration_secs: self.duration_secs(),
            mime_type: self.mime_type().to_string(),
            data,
        })
    }

    fn discard(&self) {
        *self.open.lock().unwrap() = false;
    }
}

/// Prints the finished text to stdout.
pub struct StdoutInjector;

impl TextInjector for StdoutInjector {
    fn inject(&self, text: &str) -> Result<InjectionOutcome> {
        println!("{text}");
        Ok(InjectionOutcome {
            success: true,
            method: "stdout".to_string(),
        })
    }
}

fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("voxflow")
}

fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("voxflow")
}

/// History stored as a JSON array, newest entry last.
pub struct JsonHistory {
    path: PathBuf,
}

impl JsonHistory {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn default_path() -> Self {
        Self::new(data_dir().join("history.json"))
    }
}

impl HistorySink for JsonHistory {
    fn append(&self, record: &TranscriptionRecord) -> Result<()> {
        let mut records: Vec<TranscriptionRecord> = match std::fs::read_to_string(&self.path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_default(),
            Err(_) => Vec::new(),
        };
        records.push(record.clone());

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(&records)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }
}

/// Snippets stored as a JSON array in the config directory.
pub struct JsonSnippets {
    path: PathBuf,
}

impl JsonSnippets {
    pub fn default_path() -> Self {
        Self {
            path: config_dir().join("snippets.json"),
        }
    }
}

impl SnippetSource for JsonSnippets {
    fn list(&self) -> Vec<Snippet> {
        read_json_list(&self.path)
    }
}

/// Power modes stored as a JSON array; file order is match order.
pub struct JsonPowerModes {
    path: PathBuf,
}

impl JsonPowerModes {
    pub fn default_path() -> Self {
        Self {
            path: config_dir().join("power_modes.json"),
        }
    }
}

impl PowerModeSource for JsonPowerModes {
    fn list(&self) -> Vec<PowerMode> {
        read_json_list(&self.path)
    }
}

fn read_json_list<T: serde::de::DeserializeOwned>(path: &PathBuf) -> Vec<T> {
    match std::fs::read_to_string(path) {
        Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
            voxflow_core::warn!("{} is invalid ({e}), ignoring", path.display());
            Vec::new()
        }),
        Err(_) => Vec::new(),
    }
}

/// Window context supplied on the command line. A terminal has no real
/// foreground-window signal, so `--app`/`--title` stand in for it.
pub struct CliWindow {
    pub process_name: Option<String>,
    pub title: Option<String>,
}

impl WindowContextSource for CliWindow {
    fn current_window(&self) -> Option<WindowContext> {
        match (&self.process_name, &self.title) {
            (None, None) => None,
            (process_name, title) => Some(WindowContext {
                process_name: process_name.clone().unwrap_or_default(),
                title: title.clone().unwrap_or_default(),
            }),
        }
    }
}
