//! The recording-to-injection pipeline run by `stop()`.
//!
//! Every await point races against the session's cancellation channel, and
//! every state write goes through the shared transition guard, so a cancel
//! is observed promptly and an abandoned provider call can never touch the
//! session afterwards.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::watch;

use super::DictationEngine;
use super::session::{RecordingState, ResolvedPipeline, SessionOutcome, SessionShared, TranscriptionRecord};
use crate::cleanup::{
    CleanupBackend, DEFAULT_FILLER_WORDS, count_words, filter_transcript, remove_filler_words,
};
use crate::config::SttProvider;
use crate::error::PipelineError;
use crate::http::get_http_client;
use crate::model::ModelState;
use crate::provider::SttRequest;
use crate::services::CapturedAudio;
use crate::snippet::expand;

impl DictationEngine {
    /// End the recording and run the rest of the pipeline.
    ///
    /// Only valid while `RECORDING`; a cancelled session must be
    /// acknowledged instead. Returns the completed record, `Cancelled` when
    /// a cancel was observed anywhere along the way, or the stage error
    /// that aborted the session (which also resets the engine to `IDLE`).
    pub async fn stop(&self) -> Result<SessionOutcome, PipelineError> {
        let (shared, mut cancel_rx, resolved, audio, duration_secs) = {
            let mut slot = self.session.lock().unwrap();
            let (shared, cancel_rx, resolved, started_at) = match slot.as_ref() {
                Some(s) if s.shared.state() == RecordingState::Recording => (
                    Arc::clone(&s.shared),
                    s.cancel_rx.clone(),
                    s.resolved.clone(),
                    s.started_at,
                ),
                _ => return Err(PipelineError::NotRecording),
            };

            // Close the stream and freeze the buffer while still holding the
            // session lock, so cancel() cannot interleave with the handoff.
            let audio = match self.capture.close() {
                Ok(audio) => audio,
                Err(e) => {
                    *slot = None;
                    return Err(PipelineError::Capture(e));
                }
            };

            shared.transition(RecordingState::ProcessingStt);
            let duration_secs = if audio.duration_secs > 0 {
                audio.duration_secs
            } else {
                started_at.elapsed().as_secs()
            };
            (shared, cancel_rx, resolved, audio, duration_secs)
        };

        let result = self
            .run_pipeline(&shared, &mut cancel_rx, resolved, audio, duration_secs)
            .await;

        match result {
            Ok(SessionOutcome::Completed(record)) => {
                self.clear_session();
                Ok(SessionOutcome::Completed(record))
            }
            // Cancelled sessions stay alive until acknowledged
            Ok(SessionOutcome::Cancelled) => Ok(SessionOutcome::Cancelled),
            Err(e) => {
                if shared.state() == RecordingState::Cancelled {
                    // The error came from an abandoned call; cancellation wins
                    Ok(SessionOutcome::Cancelled)
                } else {
                    self.clear_session();
                    Err(e)
                }
            }
        }
    }

    async fn run_pipeline(
        &self,
        shared: &SessionShared,
        cancel_rx: &mut watch::Receiver<bool>,
        resolved: ResolvedPipeline,
        audio: CapturedAudio,
        duration_secs: u64,
    ) -> Result<SessionOutcome, PipelineError> {
        // ── PROCESSING_STT ──
        if resolved.stt_provider == SttProvider::Local {
            let state = self.models.state();
            if state != ModelState::Loaded {
                return Err(PipelineError::ModelNotReady { state: state.name() });
            }
        }

        let client =
            get_http_client().map_err(|e| PipelineError::Transcription { source: e })?;
        let request = SttRequest {
            filename: audio.suggested_filename().to_string(),
            mime_type: audio.mime_type.clone(),
            audio_data: audio.data,
            language: resolved.language.clone(),
        };
        let backend = self.registry.stt(resolved.stt_provider);
        if let Some(mode_id) = &resolved.power_mode_id {
            crate::verbose!("Session running under power mode {mode_id}");
        }
        crate::verbose!(
            "Transcribing {}s of audio via {}",
            duration_secs,
            backend.display_name()
        );

        let stt_result = tokio::select! {
            _ = cancel_rx.changed() => return Ok(SessionOutcome::Cancelled),
            res = backend.transcribe(client, &resolved.stt_credential, request) => res,
        };
        let raw = stt_result.map_err(|e| PipelineError::Transcription { source: e })?;
        // Artifact stripping is part of raw-transcript hygiene, not cleanup
        let raw_text = filter_transcript(&raw.text);

        // ── PROCESSING_CLEANUP (skipped entirely when disabled) ──
        let cleaned_text = if resolved.cleanup_enabled {
            if !shared.transition(RecordingState::ProcessingCleanup) {
                return Ok(SessionOutcome::Cancelled);
            }
            // Snippet expansion always runs, whatever the provider does next
            let mut expanded = expand(&raw_text, &resolved.snippets);
            if resolved.filler_word_removal {
                expanded = remove_filler_words(&expanded, DEFAULT_FILLER_WORDS);
            }

            match self.registry.cleanup(resolved.cleanup_provider) {
                None => expanded,
                Some(cleaner) => {
                    let outcome = {
                        let fut = run_ai_cleanup(
                            cleaner.as_ref(),
                            client,
                            resolved.cleanup_credential.as_deref(),
                            &resolved.prompt,
                            &expanded,
                        );
                        tokio::select! {
                            _ = cancel_rx.changed() => None,
                            res = fut => Some(res),
                        }
                    };
                    let Some(res) = outcome else {
                        return Ok(SessionOutcome::Cancelled);
                    };
                    match res {
                        Ok(cleaned) => cleaned,
                        Err(source) => {
                            // Cleanup is best-effort, never pipeline-fatal
                            let err = PipelineError::Cleanup { source };
                            crate::warn!("{err}; keeping raw transcript");
                            expanded
                        }
                    }
                }
            }
        } else {
            raw_text.clone()
        };

        // ── INJECTING ──
        if !shared.transition(RecordingState::Injecting) {
            return Ok(SessionOutcome::Cancelled);
        }
        let record = TranscriptionRecord {
            word_count: count_words(&cleaned_text),
            raw_text,
            cleaned_text,
            duration_secs,
            timestamp_ms: epoch_ms(),
            language: resolved
                .language
                .clone()
                .unwrap_or_else(|| "auto".to_string()),
        };

        if resolved.auto_inject {
            match self.injector.inject(&record.cleaned_text) {
                Ok(outcome) if !outcome.success => {
                    crate::warn!("Injection incomplete, text left via {}", outcome.method);
                }
                Ok(outcome) => {
                    crate::verbose!("Injected {} words via {}", record.word_count, outcome.method);
                }
                Err(e) => {
                    let err = PipelineError::Injection(format!("{e:#}"));
                    crate::warn!("{err}");
                }
            }
        }

        // Exactly one history append per completed session, injection
        // outcome notwithstanding.
        if let Err(e) = self.history.append(&record) {
            crate::warn!("History append failed: {e:#}");
        }

        shared.transition(RecordingState::Idle);
        Ok(SessionOutcome::Completed(record))
    }
}

async fn run_ai_cleanup(
    cleaner: &dyn CleanupBackend,
    client: &reqwest::Client,
    api_key: Option<&str>,
    prompt: &str,
    text: &str,
) -> anyhow::Result<String> {
    let api_key = api_key
        .ok_or_else(|| anyhow::anyhow!("{} cleanup requires an API key", cleaner.name()))?;
    cleaner.clean(client, api_key, prompt, text).await
}

fn epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
