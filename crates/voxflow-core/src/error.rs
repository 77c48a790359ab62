//! Error taxonomy for the dictation pipeline.
//!
//! Every failure is local to the stage that produced it: a capture error
//! aborts before recording starts, a transcription error aborts the session,
//! a cleanup error degrades to the snippet-expanded raw text, an injection
//! error is logged and the session still completes. Cancellation is not an
//! error and has no variant here — it is a distinct terminal session state.

use thiserror::Error;

/// Failures opening or reading the audio capture stream.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no audio input available: {0}")]
    Unavailable(String),
    #[error("audio capture stream failed: {0}")]
    Stream(String),
}

/// Stage-scoped pipeline failures surfaced by the dictation engine.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A session is already running; the pipeline never interleaves two.
    #[error("another dictation session is already active")]
    SessionActive,

    /// `stop()` called with no recording in progress, or `start()` before
    /// a cancelled session was acknowledged.
    #[error("no recording in progress")]
    NotRecording,

    #[error(transparent)]
    Capture(#[from] CaptureError),

    /// STT call failed. Aborts the session; no history entry is written.
    #[error("transcription failed: {source}")]
    Transcription {
        #[source]
        source: anyhow::Error,
    },

    /// Local STT selected while the model is not in the loaded state.
    /// Callers are expected to trigger a load via the model manager first.
    #[error("local speech model is not ready (currently {state})")]
    ModelNotReady { state: &'static str },

    /// Cleanup call failed. Never session-fatal; the engine degrades to
    /// the snippet-expanded raw text and keeps going.
    #[error("transcript cleanup failed: {source}")]
    Cleanup {
        #[source]
        source: anyhow::Error,
    },

    /// Text injection failed. Logged; the session still completes and the
    /// history record is still written.
    #[error("text injection failed: {0}")]
    Injection(String),
}
