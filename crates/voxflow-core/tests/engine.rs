//! End-to-end tests for the dictation engine against mock collaborators
//! and scripted providers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use voxflow_core::config::{CleanupProvider, SttProvider};
use voxflow_core::engine::{Collaborators, DictationEngine, RecordingState, SessionOutcome};
use voxflow_core::error::{CaptureError, PipelineError};
use voxflow_core::model::{ModelManager, ModelSize};
use voxflow_core::power_mode::{PowerMode, WindowContext};
use voxflow_core::services::{
    AudioCapture, CapturedAudio, HistorySink, InjectionOutcome, PowerModeSource, SettingsSource,
    SnippetSource, TextInjector, WindowContextSource,
};
use voxflow_core::settings::Settings;
use voxflow_core::snippet::Snippet;
use voxflow_core::{CleanupBackend, RawTranscript, SttBackend, SttRequest, TranscriptionRecord};

// ─── Mock collaborators ───

#[derive(Clone)]
struct StaticSettings(Settings);

impl SettingsSource for StaticSettings {
    fn snapshot(&self) -> Settings {
        self.0.clone()
    }
}

#[derive(Clone)]
struct MockCapture {
    fail_open: bool,
    discarded: Arc<AtomicUsize>,
}

impl MockCapture {
    fn new() -> Self {
        Self {
            fail_open: false,
            discarded: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn failing() -> Self {
        Self {
            fail_open: true,
            discarded: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl AudioCapture for MockCapture {
    fn open(&self) -> Result<(), CaptureError> {
        if self.fail_open {
            return Err(CaptureError::Unavailable("no input device".to_string()));
        }
        Ok(())
    }

    fn close(&self) -> Result<CapturedAudio, CaptureError> {
        Ok(CapturedAudio {
            data: vec![0u8; 64],
            mime_type: "audio/wav".to_string(),
            duration_secs: 3,
        })
    }

    fn discard(&self) {
        self.discarded.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Clone)]
struct MockInjector {
    fail: bool,
    injected: Arc<Mutex<Vec<String>>>,
}

impl MockInjector {
    fn new() -> Self {
        Self {
            fail: false,
            injected: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            injected: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl TextInjector for MockInjector {
    fn inject(&self, text: &str) -> Result<InjectionOutcome> {
        if self.fail {
            anyhow::bail!("target window went away");
        }
        self.injected.lock().unwrap().push(text.to_string());
        Ok(InjectionOutcome {
            success: true,
            method: "mock".to_string(),
        })
    }
}

#[derive(Clone)]
struct MockHistory(Arc<Mutex<Vec<TranscriptionRecord>>>);

impl MockHistory {
    fn new() -> Self {
        Self(Arc::new(Mutex::new(Vec::new())))
    }
}

impl HistorySink for MockHistory {
    fn append(&self, record: &TranscriptionRecord) -> Result<()> {
        self.0.lock().unwrap().push(record.clone());
        Ok(())
    }
}

#[derive(Clone)]
struct StaticSnippets(Vec<Snippet>);

impl SnippetSource for StaticSnippets {
    fn list(&self) -> Vec<Snippet> {
        self.0.clone()
    }
}

#[derive(Clone)]
struct StaticModes(Vec<PowerMode>);

impl PowerModeSource for StaticModes {
    fn list(&self) -> Vec<PowerMode> {
        self.0.clone()
    }
}

#[derive(Clone)]
struct StaticWindow(Option<WindowContext>);

impl WindowContextSource for StaticWindow {
    fn current_window(&self) -> Option<WindowContext> {
        self.0.clone()
    }
}

// ─── Scripted providers ───

struct ScriptedStt {
    text: String,
    delay: Duration,
    calls: Arc<AtomicUsize>,
}

impl ScriptedStt {
    fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            delay: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn with_delay(text: &str, delay: Duration) -> Self {
        Self {
            text: text.to_string(),
            delay,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl SttBackend for ScriptedStt {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn display_name(&self) -> &'static str {
        "Scripted STT"
    }

    async fn transcribe(
        &self,
        _client: &reqwest::Client,
        _api_key: &str,
        _request: SttRequest,
    ) -> Result<RawTranscript> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(RawTranscript {
            text: self.text.clone(),
        })
    }
}

struct FailingStt;

#[async_trait]
impl SttBackend for FailingStt {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn display_name(&self) -> &'static str {
        "Failing STT"
    }

    async fn transcribe(
        &self,
        _client: &reqwest::Client,
        _api_key: &str,
        _request: SttRequest,
    ) -> Result<RawTranscript> {
        anyhow::bail!("quota exceeded")
    }
}

struct ScriptedCleanup {
    output: String,
    calls: Arc<AtomicUsize>,
}

impl ScriptedCleanup {
    fn new(output: &str) -> Self {
        Self {
            output: output.to_string(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl CleanupBackend for ScriptedCleanup {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn clean(
        &self,
        _client: &reqwest::Client,
        _api_key: &str,
        _system_prompt: &str,
        _text: &str,
    ) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.output.clone())
    }
}

struct FailingCleanup;

#[async_trait]
impl CleanupBackend for FailingCleanup {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn clean(
        &self,
        _client: &reqwest::Client,
        _api_key: &str,
        _system_prompt: &str,
        _text: &str,
    ) -> Result<String> {
        anyhow::bail!("model overloaded")
    }
}

struct HangingCleanup;

#[async_trait]
impl CleanupBackend for HangingCleanup {
    fn name(&self) -> &'static str {
        "hanging"
    }

    async fn clean(
        &self,
        _client: &reqwest::Client,
        _api_key: &str,
        _system_prompt: &str,
        _text: &str,
    ) -> Result<String> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(String::new())
    }
}

// ─── Harness ───

struct Harness {
    engine: Arc<DictationEngine>,
    capture: MockCapture,
    injector: MockInjector,
    history: MockHistory,
}

fn default_settings() -> Settings {
    let mut settings = Settings::default();
    settings
        .transcription
        .api_keys
        .insert("openai".to_string(), "test-key".to_string());
    settings.transcription.language = Some("en".to_string());
    settings
}

struct HarnessBuilder {
    settings: Settings,
    snippets: Vec<Snippet>,
    modes: Vec<PowerMode>,
    window: Option<WindowContext>,
    capture: MockCapture,
    injector: MockInjector,
}

impl HarnessBuilder {
    fn new() -> Self {
        Self {
            settings: default_settings(),
            snippets: Vec::new(),
            modes: Vec::new(),
            window: None,
            capture: MockCapture::new(),
            injector: MockInjector::new(),
        }
    }

    fn settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    fn snippets(mut self, snippets: Vec<Snippet>) -> Self {
        self.snippets = snippets;
        self
    }

    fn modes(mut self, modes: Vec<PowerMode>) -> Self {
        self.modes = modes;
        self
    }

    fn window(mut self, window: WindowContext) -> Self {
        self.window = Some(window);
        self
    }

    fn capture(mut self, capture: MockCapture) -> Self {
        self.capture = capture;
        self
    }

    fn injector(mut self, injector: MockInjector) -> Self {
        self.injector = injector;
        self
    }

    fn build(self) -> Harness {
        let history = MockHistory::new();
        let models = ModelManager::with_layout(
            ModelSize::Base,
            std::env::temp_dir().join("voxflow-test-models"),
            Vec::new(),
            None,
        );
        let engine = DictationEngine::new(
            Collaborators {
                settings: Box::new(StaticSettings(self.settings)),
                capture: Box::new(self.capture.clone()),
                injector: Box::new(self.injector.clone()),
                history: Box::new(history.clone()),
                snippets: Box::new(StaticSnippets(self.snippets)),
                power_modes: Box::new(StaticModes(self.modes)),
                window: Box::new(StaticWindow(self.window)),
            },
            models,
        );
        Harness {
            engine: Arc::new(engine),
            capture: self.capture,
            injector: self.injector,
            history,
        }
    }
}

fn harness() -> Harness {
    HarnessBuilder::new().build()
}

fn sign_off_snippet() -> Snippet {
    Snippet {
        id: "snip-1".to_string(),
        trigger: "sign off".to_string(),
        expansion: "Best regards,\nJon".to_string(),
        description: None,
        created_at: 0,
        updated_at: 0,
    }
}

// ─── Tests ───

#[tokio::test]
async fn completed_session_appends_exactly_one_history_record() {
    let h = harness();
    h.engine
        .registry()
        .register_stt(SttProvider::OpenAI, Arc::new(ScriptedStt::new("um hello world")));
    h.engine.registry().register_cleanup(
        CleanupProvider::OpenAI,
        Arc::new(ScriptedCleanup::new("Hello world.")),
    );

    h.engine.start().unwrap();
    assert_eq!(h.engine.state(), RecordingState::Recording);

    let outcome = h.engine.stop().await.unwrap();
    let SessionOutcome::Completed(record) = outcome else {
        panic!("expected completion");
    };

    assert_eq!(record.raw_text, "um hello world");
    assert_eq!(record.cleaned_text, "Hello world.");
    assert_eq!(record.word_count, 2);
    assert_eq!(record.duration_secs, 3);
    assert_eq!(record.language, "en");

    let records = h.history.0.lock().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0], record);

    let injected = h.injector.injected.lock().unwrap();
    assert_eq!(injected.len(), 1);
    assert_eq!(injected[0], "Hello world.");

    assert_eq!(h.engine.state(), RecordingState::Idle);
}

#[tokio::test]
async fn second_start_is_rejected_while_active() {
    let h = harness();
    h.engine
        .registry()
        .register_stt(SttProvider::OpenAI, Arc::new(ScriptedStt::new("hi")));
    h.engine.registry().register_cleanup(
        CleanupProvider::OpenAI,
        Arc::new(ScriptedCleanup::new("Hi.")),
    );

    h.engine.start().unwrap();
    assert!(matches!(
        h.engine.start(),
        Err(PipelineError::SessionActive)
    ));

    h.engine.stop().await.unwrap();
    // A finished session frees the slot
    h.engine.start().unwrap();
}

#[tokio::test]
async fn capture_failure_aborts_before_recording() {
    let h = HarnessBuilder::new().capture(MockCapture::failing()).build();

    assert!(matches!(h.engine.start(), Err(PipelineError::Capture(_))));
    assert_eq!(h.engine.state(), RecordingState::Idle);
    assert!(h.history.0.lock().unwrap().is_empty());
}

#[tokio::test]
async fn cancel_during_recording_discards_the_buffer() {
    let h = harness();
    h.engine.start().unwrap();

    assert!(h.engine.cancel());
    assert_eq!(h.engine.state(), RecordingState::Cancelled);
    assert_eq!(h.capture.discarded.load(Ordering::SeqCst), 1);

    // Terminal until acknowledged: stop and start are both refused
    assert!(matches!(
        h.engine.stop().await,
        Err(PipelineError::NotRecording)
    ));
    assert!(matches!(
        h.engine.start(),
        Err(PipelineError::SessionActive)
    ));

    assert!(h.engine.acknowledge());
    assert_eq!(h.engine.state(), RecordingState::Idle);
    assert!(h.history.0.lock().unwrap().is_empty());

    h.engine.start().unwrap();
}

#[tokio::test]
async fn cancel_during_stt_abandons_the_call() {
    let h = harness();
    h.engine.registry().register_stt(
        SttProvider::OpenAI,
        Arc::new(ScriptedStt::with_delay("late", Duration::from_secs(60))),
    );

    h.engine.start().unwrap();
    let engine = Arc::clone(&h.engine);
    let stop_task = tokio::spawn(async move { engine.stop().await });

    // Let the pipeline reach the provider call, then cancel
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(h.engine.state(), RecordingState::ProcessingStt);
    assert!(h.engine.cancel());

    let outcome = stop_task.await.unwrap().unwrap();
    assert_eq!(outcome, SessionOutcome::Cancelled);
    assert_eq!(h.engine.state(), RecordingState::Cancelled);
    assert!(h.history.0.lock().unwrap().is_empty());
    assert!(h.injector.injected.lock().unwrap().is_empty());

    assert!(h.engine.acknowledge());
}

#[tokio::test]
async fn late_stt_result_never_mutates_a_cancelled_session() {
    let h = harness();
    h.engine.registry().register_stt(
        SttProvider::OpenAI,
        Arc::new(ScriptedStt::with_delay("late", Duration::from_millis(100))),
    );

    h.engine.start().unwrap();
    let engine = Arc::clone(&h.engine);
    let stop_task = tokio::spawn(async move { engine.stop().await });

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(h.engine.cancel());
    assert_eq!(stop_task.await.unwrap().unwrap(), SessionOutcome::Cancelled);

    // Give the abandoned call time to finish; nothing may change
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(h.engine.state(), RecordingState::Cancelled);
    assert!(h.history.0.lock().unwrap().is_empty());
    assert!(h.injector.injected.lock().unwrap().is_empty());
}

#[tokio::test]
async fn stt_failure_aborts_without_history() {
    let h = harness();
    h.engine
        .registry()
        .register_stt(SttProvider::OpenAI, Arc::new(FailingStt));

    h.engine.start().unwrap();
    let result = h.engine.stop().await;
    assert!(matches!(
        result,
        Err(PipelineError::Transcription { .. })
    ));
    assert_eq!(h.engine.state(), RecordingState::Idle);
    assert!(h.history.0.lock().unwrap().is_empty());

    // The failure is local to that session
    h.engine.start().unwrap();
}

#[tokio::test]
async fn cleanup_failure_degrades_to_snippet_expanded_raw_text() {
    let h = HarnessBuilder::new()
        .snippets(vec![sign_off_snippet()])
        .build();
    h.engine
        .registry()
        .register_stt(SttProvider::OpenAI, Arc::new(ScriptedStt::new("ok sign off now")));
    h.engine
        .registry()
        .register_cleanup(CleanupProvider::OpenAI, Arc::new(FailingCleanup));

    h.engine.start().unwrap();
    let SessionOutcome::Completed(record) = h.engine.stop().await.unwrap() else {
        panic!("expected completion");
    };

    assert_eq!(record.raw_text, "ok sign off now");
    assert_eq!(record.cleaned_text, "ok Best regards,\nJon now");
    assert_eq!(h.history.0.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn disabled_cleanup_skips_the_whole_stage() {
    let mut settings = default_settings();
    settings.cleanup.enabled = false;
    let h = HarnessBuilder::new()
        .settings(settings)
        .snippets(vec![sign_off_snippet()])
        .build();

    let cleanup = Arc::new(ScriptedCleanup::new("never used"));
    h.engine
        .registry()
        .register_stt(SttProvider::OpenAI, Arc::new(ScriptedStt::new("ok sign off now")));
    h.engine
        .registry()
        .register_cleanup(CleanupProvider::OpenAI, Arc::clone(&cleanup) as _);

    h.engine.start().unwrap();
    let SessionOutcome::Completed(record) = h.engine.stop().await.unwrap() else {
        panic!("expected completion");
    };

    // Snippet expansion lives in the skipped stage
    assert_eq!(record.cleaned_text, "ok sign off now");
    assert_eq!(cleanup.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn cancel_during_cleanup_is_terminal() {
    let h = harness();
    h.engine
        .registry()
        .register_stt(SttProvider::OpenAI, Arc::new(ScriptedStt::new("some words")));
    h.engine
        .registry()
        .register_cleanup(CleanupProvider::OpenAI, Arc::new(HangingCleanup));

    h.engine.start().unwrap();
    let engine = Arc::clone(&h.engine);
    let stop_task = tokio::spawn(async move { engine.stop().await });

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(h.engine.state(), RecordingState::ProcessingCleanup);
    assert!(h.engine.cancel());

    assert_eq!(stop_task.await.unwrap().unwrap(), SessionOutcome::Cancelled);
    assert!(h.history.0.lock().unwrap().is_empty());
}

#[tokio::test]
async fn matched_power_mode_overrides_providers_for_one_session() {
    let mode = PowerMode {
        id: "email".to_string(),
        name: "Email".to_string(),
        app_matchers: Vec::new(),
        url_matchers: vec!["mail.google.com".to_string()],
        selected_prompt_id: None,
        stt_provider: Some(SttProvider::Groq),
        cleanup_provider: Some(CleanupProvider::None),
        is_enabled: true,
    };
    let window = WindowContext {
        process_name: "chrome".to_string(),
        title: "Inbox - mail.google.com".to_string(),
    };
    let h = HarnessBuilder::new().modes(vec![mode]).window(window).build();

    // The global default points at a failing backend; only the override works
    h.engine
        .registry()
        .register_stt(SttProvider::OpenAI, Arc::new(FailingStt));
    h.engine
        .registry()
        .register_stt(SttProvider::Groq, Arc::new(ScriptedStt::new("dear team")));

    h.engine.start().unwrap();
    let SessionOutcome::Completed(record) = h.engine.stop().await.unwrap() else {
        panic!("expected completion");
    };

    // Groq override transcribed; cleanup override "none" skipped the stage
    assert_eq!(record.raw_text, "dear team");
    assert_eq!(record.cleaned_text, "dear team");
}

#[tokio::test]
async fn unmatched_window_uses_global_settings() {
    let mode = PowerMode {
        id: "email".to_string(),
        name: "Email".to_string(),
        app_matchers: Vec::new(),
        url_matchers: vec!["mail.google.com".to_string()],
        selected_prompt_id: None,
        stt_provider: Some(SttProvider::Groq),
        cleanup_provider: None,
        is_enabled: true,
    };
    let window = WindowContext {
        process_name: "slack".to_string(),
        title: "general".to_string(),
    };
    let h = HarnessBuilder::new().modes(vec![mode]).window(window).build();

    h.engine
        .registry()
        .register_stt(SttProvider::OpenAI, Arc::new(ScriptedStt::new("global path")));
    h.engine.registry().register_cleanup(
        CleanupProvider::OpenAI,
        Arc::new(ScriptedCleanup::new("Global path.")),
    );

    h.engine.start().unwrap();
    let SessionOutcome::Completed(record) = h.engine.stop().await.unwrap() else {
        panic!("expected completion");
    };
    assert_eq!(record.cleaned_text, "Global path.");
}

#[tokio::test]
async fn local_provider_requires_a_loaded_model() {
    let mut settings = default_settings();
    settings.transcription.provider = SttProvider::Local;
    let h = HarnessBuilder::new().settings(settings).build();

    h.engine.start().unwrap();
    let result = h.engine.stop().await;
    assert!(matches!(
        result,
        Err(PipelineError::ModelNotReady { state: "unloaded" })
    ));
    assert_eq!(h.engine.state(), RecordingState::Idle);
    assert!(h.history.0.lock().unwrap().is_empty());
}

#[tokio::test]
async fn injection_failure_still_completes_and_records() {
    let h = HarnessBuilder::new()
        .injector(MockInjector::failing())
        .build();

    h.engine
        .registry()
        .register_stt(SttProvider::OpenAI, Arc::new(ScriptedStt::new("hello")));
    h.engine.registry().register_cleanup(
        CleanupProvider::OpenAI,
        Arc::new(ScriptedCleanup::new("Hello.")),
    );

    h.engine.start().unwrap();
    let outcome = h.engine.stop().await.unwrap();
    assert!(matches!(outcome, SessionOutcome::Completed(_)));
    assert_eq!(h.history.0.lock().unwrap().len(), 1);
    assert_eq!(h.engine.state(), RecordingState::Idle);
}
