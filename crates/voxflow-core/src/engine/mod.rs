//! The dictation engine: one recording-to-injection cycle at a time.
//!
//! A single engine instance per process owns at most one active session and
//! one model manager. Triggering follows the state machine
//! `IDLE → RECORDING → PROCESSING_STT → PROCESSING_CLEANUP → INJECTING → IDLE`,
//! with `CANCELLED` reachable from every stage before injection. Provider
//! and power-mode resolution happens exactly once, at the `IDLE → RECORDING`
//! transition, and the snapshot never changes mid-session.

mod pipeline;
mod session;

pub use session::{RecordingState, SessionOutcome, TranscriptionRecord};

use std::sync::{Arc, Mutex};

use session::{ActiveSession, ResolvedPipeline};

use crate::cleanup::DEFAULT_CLEANUP_PROMPT;
use crate::config::CleanupProvider;
use crate::error::PipelineError;
use crate::model::ModelManager;
use crate::power_mode::match_power_mode;
use crate::provider::ProviderRegistry;
use crate::services::{
    AudioCapture, HistorySink, PowerModeSource, SettingsSource, SnippetSource, TextInjector,
    WindowContextSource,
};
use crate::settings::CleanupSettings;

/// The external services a dictation engine is wired to.
pub struct Collaborators {
    pub settings: Box<dyn SettingsSource>,
    pub capture: Box<dyn AudioCapture>,
    pub injector: Box<dyn TextInjector>,
    pub history: Box<dyn HistorySink>,
    pub snippets: Box<dyn SnippetSource>,
    pub power_modes: Box<dyn PowerModeSource>,
    pub window: Box<dyn WindowContextSource>,
}

/// Orchestrates dictation sessions against the collaborator seams.
pub struct DictationEngine {
    settings: Box<dyn SettingsSource>,
    capture: Box<dyn AudioCapture>,
    injector: Box<dyn TextInjector>,
    history: Box<dyn HistorySink>,
    snippets: Box<dyn SnippetSource>,
    power_modes: Box<dyn PowerModeSource>,
    window: Box<dyn WindowContextSource>,
    registry: ProviderRegistry,
    models: Arc<ModelManager>,
    session: Mutex<Option<ActiveSession>>,
}

impl DictationEngine {
    pub fn new(collaborators: Collaborators, models: Arc<ModelManager>) -> Self {
        Self {
            settings: collaborators.settings,
            capture: collaborators.capture,
            injector: collaborators.injector,
            history: collaborators.history,
            snippets: collaborators.snippets,
            power_modes: collaborators.power_modes,
            window: collaborators.window,
            registry: ProviderRegistry::new(Arc::clone(&models)),
            models,
            session: Mutex::new(None),
        }
    }

    /// The provider registry, for swapping in custom backends.
    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// The local model manager this engine consults for local STT.
    pub fn models(&self) -> &Arc<ModelManager> {
        &self.models
    }

    /// Current session state; `Idle` when no session is alive.
    pub fn state(&self) -> RecordingState {
        self.session
            .lock()
            .unwrap()
            .as_ref()
            .map(|s| s.shared.state())
            .unwrap_or(RecordingState::Idle)
    }

    /// Begin a session: resolve the power mode and providers, open the
    /// capture stream, move to `RECORDING`.
    ///
    /// Rejected while another session is active (including a cancelled one
    /// that has not been acknowledged yet).
    pub fn start(&self) -> Result<(), PipelineError> {
        let mut slot = self.session.lock().unwrap();
        if slot.is_some() {
            return Err(PipelineError::SessionActive);
        }

        let settings = self.settings.snapshot();

        // Mode resolution: one window poll, one pass over the stored modes.
        let window = self.window.current_window();
        let modes = if settings.ui.power_modes_enabled {
            self.power_modes.list()
        } else {
            Vec::new()
        };
        let mode = match_power_mode(window.as_ref(), &modes);
        if let Some(mode) = mode {
            crate::verbose!("Power mode '{}' active for this session", mode.name);
        }

        let stt_provider = mode
            .and_then(|m| m.stt_provider)
            .unwrap_or(settings.transcription.provider);
        let cleanup_provider = mode
            .and_then(|m| m.cleanup_provider)
            .unwrap_or(settings.cleanup.provider);
        let cleanup_enabled = settings.cleanup.enabled && cleanup_provider != CleanupProvider::None;

        let prompt = mode
            .and_then(|m| m.selected_prompt_id.as_deref())
            .and_then(|id| self.power_modes.prompt_text(id))
            .or_else(|| settings.cleanup.prompt.clone())
            .unwrap_or_else(|| DEFAULT_CLEANUP_PROMPT.to_string());

        let resolved = ResolvedPipeline {
            stt_provider,
            stt_credential: settings
                .transcription
                .api_key_for(&stt_provider)
                .unwrap_or_default(),
            cleanup_provider,
            cleanup_credential: CleanupSettings::api_key_for(
                cleanup_provider,
                &settings.transcription.api_keys,
            ),
            cleanup_enabled,
            filler_word_removal: settings.cleanup.filler_word_removal,
            prompt,
            language: settings.transcription.language.clone(),
            snippets: self.snippets.list(),
            auto_inject: settings.ui.auto_inject,
            power_mode_id: mode.map(|m| m.id.clone()),
        };

        self.capture.open()?;
        *slot = Some(ActiveSession::new(resolved));
        Ok(())
    }

    /// Cancel the running session. Works during recording and both
    /// processing stages; a no-op once injection started or when idle.
    ///
    /// The session stays in `CANCELLED` until [`acknowledge`] resets it;
    /// any in-flight provider call is abandoned and its result discarded.
    ///
    /// [`acknowledge`]: DictationEngine::acknowledge
    pub fn cancel(&self) -> bool {
        let slot = self.session.lock().unwrap();
        let Some(session) = slot.as_ref() else {
            return false;
        };
        match session.shared.cancel() {
            Some(RecordingState::Recording) => {
                // No provider call was made; drop the buffer right away.
                self.capture.discard();
                true
            }
            Some(_) => true,
            None => false,
        }
    }

    /// Reset a cancelled session back to `IDLE` so the next trigger works.
    pub fn acknowledge(&self) -> bool {
        let mut slot = self.session.lock().unwrap();
        match slot.as_ref().map(|s| s.shared.state()) {
            Some(RecordingState::Cancelled) => {
                *slot = None;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn clear_session(&self) {
        *self.session.lock().unwrap() = None;
    }
}
