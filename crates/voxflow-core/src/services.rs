//! Collaborator seams the dictation engine talks through.
//!
//! Settings, history, snippet/power-mode storage, audio capture, text
//! injection and window-context lookup are all owned by the embedding
//! application. The engine only sees these traits; the CLI wires file-backed
//! implementations and tests wire mocks.

use anyhow::Result;

use crate::engine::TranscriptionRecord;
use crate::error::CaptureError;
use crate::power_mode::{PowerMode, WindowContext};
use crate::settings::Settings;
use crate::snippet::Snippet;

/// Frozen audio produced when a capture stream closes.
#[derive(Debug, Clone)]
pub struct CapturedAudio {
    pub data: Vec<u8>,
    pub mime_type: String,
    pub duration_secs: u64,
}

impl CapturedAudio {
    /// Filename to report when uploading this buffer.
    pub fn suggested_filename(&self) -> &'static str {
        match self.mime_type.as_str() {
            "audio/wav" | "audio/x-wav" => "recording.wav",
            "audio/mpeg" => "recording.mp3",
            "audio/webm" => "recording.webm",
            _ => "recording.bin",
        }
    }
}

/// Result of handing text to the injection collaborator.
#[derive(Debug, Clone)]
pub struct InjectionOutcome {
    pub success: bool,
    /// How the text reached the target, e.g. "paste" or "clipboard-only"
    pub method: String,
}

/// Read-once settings snapshot taken at session start.
pub trait SettingsSource: Send + Sync {
    fn snapshot(&self) -> Settings;
}

/// Audio capture stream. `open` starts recording, `close` stops it and
/// yields the frozen buffer, `discard` drops everything recorded so far.
pub trait AudioCapture: Send + Sync {
    fn open(&self) -> Result<(), CaptureError>;
    fn close(&self) -> Result<CapturedAudio, CaptureError>;
    fn discard(&self);
}

/// Puts finished text into the user's focused application.
pub trait TextInjector: Send + Sync {
    fn inject(&self, text: &str) -> Result<InjectionOutcome>;
}

/// Receives exactly one record per successfully completed session.
pub trait HistorySink: Send + Sync {
    fn append(&self, record: &TranscriptionRecord) -> Result<()>;
}

/// Snippet storage, read at session start.
pub trait SnippetSource: Send + Sync {
    fn list(&self) -> Vec<Snippet>;
}

/// Power-mode storage, read at session start. Order is significant and
/// must be preserved: the first enabled matching mode wins.
pub trait PowerModeSource: Send + Sync {
    fn list(&self) -> Vec<PowerMode>;

    /// Resolve a mode's prompt id to prompt text, if the store knows it.
    fn prompt_text(&self, _prompt_id: &str) -> Option<String> {
        None
    }
}

/// Foreground window lookup, polled once at session start.
pub trait WindowContextSource: Send + Sync {
    fn current_window(&self) -> Option<WindowContext>;
}
