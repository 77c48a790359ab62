//! Session state, the cancellation guard, and the result record.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::watch;

use crate::config::{CleanupProvider, SttProvider};
use crate::snippet::Snippet;

/// Where a dictation session currently is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordingState {
    Idle,
    Recording,
    ProcessingStt,
    ProcessingCleanup,
    Injecting,
    Cancelled,
}

/// One completed dictation, handed to the history collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptionRecord {
    pub raw_text: String,
    pub cleaned_text: String,
    /// Recording duration in seconds
    #[serde(rename = "duration")]
    pub duration_secs: u64,
    /// Completion time, milliseconds since the epoch
    #[serde(rename = "timestamp")]
    pub timestamp_ms: u64,
    pub language: String,
    pub word_count: usize,
}

/// How a `stop()` call ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    /// The pipeline ran to completion; the record was appended to history.
    Completed(TranscriptionRecord),
    /// The session was cancelled; nothing was injected or recorded.
    Cancelled,
}

/// State shared between the engine, the running pipeline, and `cancel()`.
///
/// All transitions funnel through [`SessionShared::transition`], which
/// refuses to move out of `Cancelled`. That single gate is what guarantees
/// an abandoned provider call can never mutate session state after
/// cancellation was observed.
pub(crate) struct SessionShared {
    state: Mutex<RecordingState>,
    cancel_tx: watch::Sender<bool>,
}

impl SessionShared {
    pub(crate) fn new() -> (Arc<Self>, watch::Receiver<bool>) {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let shared = Arc::new(Self {
            state: Mutex::new(RecordingState::Recording),
            cancel_tx,
        });
        (shared, cancel_rx)
    }

    pub(crate) fn state(&self) -> RecordingState {
        *self.state.lock().unwrap()
    }

    /// Move to `to` unless the session was cancelled. Returns whether the
    /// transition happened; on `false` the caller must stop mutating.
    pub(crate) fn transition(&self, to: RecordingState) -> bool {
        let mut state = self.state.lock().unwrap();
        if *state == RecordingState::Cancelled {
            return false;
        }
        *state = to;
        true
    }

    /// Cancel if the session is in a cancellable state. Returns the state
    /// the session was in, or `None` when cancellation is not allowed
    /// (injection already started, or already cancelled).
    pub(crate) fn cancel(&self) -> Option<RecordingState> {
        let mut state = self.state.lock().unwrap();
        match *state {
            RecordingState::Recording
            | RecordingState::ProcessingStt
            | RecordingState::ProcessingCleanup => {
                let previous = *state;
                *state = RecordingState::Cancelled;
                let _ = self.cancel_tx.send(true);
                Some(previous)
            }
            _ => None,
        }
    }
}

/// Everything resolved once at the `IDLE → RECORDING` transition.
///
/// Immutable for the session's lifetime: a window-context change mid-recording
/// must not alter in-flight provider selection.
#[derive(Clone)]
pub(crate) struct ResolvedPipeline {
    pub stt_provider: SttProvider,
    /// API key for the STT provider; empty for local
    pub stt_credential: String,
    pub cleanup_provider: CleanupProvider,
    pub cleanup_credential: Option<String>,
    pub cleanup_enabled: bool,
    pub filler_word_removal: bool,
    pub prompt: String,
    pub language: Option<String>,
    pub snippets: Vec<Snippet>,
    pub auto_inject: bool,
    /// Matched power mode id, for logging only
    pub power_mode_id: Option<String>,
}

/// The engine's record of the one session currently alive.
pub(crate) struct ActiveSession {
    pub shared: Arc<SessionShared>,
    pub cancel_rx: watch::Receiver<bool>,
    pub resolved: ResolvedPipeline,
    pub started_at: Instant,
}

impl ActiveSession {
    pub(crate) fn new(resolved: ResolvedPipeline) -> Self {
        let (shared, cancel_rx) = SessionShared::new();
        Self {
            shared,
            cancel_rx,
            resolved,
            started_at: Instant::now(),
        }
    }
}
