//! Local model lifecycle: download, initialization, readiness.
//!
//! One `ModelManager` tracks one model per process. A load is a long-running
//! operation independent of any dictation session: sessions may start, finish
//! or be cancelled while a load is in flight, and nothing a session does ever
//! cancels the load. Consumers observe progress through a broadcast channel
//! or by polling `state()` directly; a subscriber that arrives after the load
//! finished still learns the truth from the state query.

mod catalog;
mod download;
#[cfg(feature = "local-inference")]
mod whisper;

pub use catalog::{ModelFile, ModelInfo, ModelSize, catalog};
#[cfg(feature = "local-inference")]
pub use whisper::WhisperSpeechModel;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;

/// Recommended polling interval for `wait_until_ready`
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);
/// Recommended polling cap for `wait_until_ready`
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Speech recognition backend over 16kHz mono f32 samples.
///
/// Decouples the model manager from any specific inference engine; the
/// bundled whisper.cpp implementation lives behind the `local-inference`
/// feature, and tests substitute their own.
pub trait SpeechModel: Send + Sync {
    fn transcribe(&self, samples: &[f32], language: Option<&str>) -> Result<String>;
}

/// Builds a `SpeechModel` from a directory of downloaded model files.
pub type SpeechModelFactory =
    Arc<dyn Fn(&Path) -> Result<Box<dyn SpeechModel>> + Send + Sync>;

/// Lifecycle state of the managed model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelState {
    Unloaded,
    Loading { percent: u8 },
    Loaded,
    Error { cause: String },
}

impl ModelState {
    pub fn name(&self) -> &'static str {
        match self {
            ModelState::Unloaded => "unloaded",
            ModelState::Loading { .. } => "loading",
            ModelState::Loaded => "loaded",
            ModelState::Error { .. } => "error",
        }
    }
}

/// Progress events published while a load runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelEvent {
    /// Overall download progress, 0-100
    Progress { percent: u8 },
    /// One of the model's files finished downloading or was already present.
    /// Does not imply the model is ready: a model is several files.
    FileDone { file: String },
    /// The model is fully loaded and ready for transcription
    Ready,
}

/// One file the manager downloads and verifies.
#[derive(Debug, Clone)]
pub struct ManagedFile {
    pub name: String,
    pub url: String,
    pub size_mb: u64,
}

impl From<&ModelFile> for ManagedFile {
    fn from(file: &ModelFile) -> Self {
        Self {
            name: file.name.to_string(),
            url: file.url.to_string(),
            size_mb: file.size_mb,
        }
    }
}

/// Owns the download/initialization lifecycle of one on-device model.
pub struct ModelManager {
    size: ModelSize,
    dir: PathBuf,
    files: Vec<ManagedFile>,
    state: Mutex<ModelState>,
    events: broadcast::Sender<ModelEvent>,
    engine: Mutex<Option<Arc<dyn SpeechModel>>>,
    factory: Option<SpeechModelFactory>,
}

impl ModelManager {
    /// Manager for a catalog model in its default directory, with the
    /// bundled speech engine when the `local-inference` feature is on.
    pub fn new(size: ModelSize) -> Arc<Self> {
        Self::with_layout(
            size,
            size.default_dir(),
            size.info().files.iter().map(ManagedFile::from).collect(),
            default_factory(size),
        )
    }

    /// Manager with an explicit directory, file set and engine factory.
    pub fn with_layout(
        size: ModelSize,
        dir: PathBuf,
        files: Vec<ManagedFile>,
        factory: Option<SpeechModelFactory>,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(64);
        Arc::new(Self {
            size,
            dir,
            files,
            state: Mutex::new(ModelState::Unloaded),
            events,
            engine: Mutex::new(None),
            factory,
        })
    }

    pub fn size(&self) -> ModelSize {
        self.size
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Current lifecycle state
    pub fn state(&self) -> ModelState {
        self.state.lock().unwrap().clone()
    }

    /// Subscribe to progress events. Subscribing and unsubscribing never
    /// affects the load itself.
    pub fn subscribe(&self) -> broadcast::Receiver<ModelEvent> {
        self.events.subscribe()
    }

    /// The loaded speech engine, once ready
    pub fn speech_model(&self) -> Option<Arc<dyn SpeechModel>> {
        self.engine.lock().unwrap().clone()
    }

    /// Whether every model file is on disk and the speech engine (if any
    /// is configured) has been initialized. This is the authoritative
    /// readiness check; progress events are only hints.
    pub fn is_fully_loaded(&self) -> bool {
        self.files_present()
            && (self.factory.is_none() || self.engine.lock().unwrap().is_some())
    }

    /// Begin downloading and initializing the model.
    ///
    /// Idempotent: returns `false` without doing anything when a load is
    /// already running or the model is already loaded, so concurrent calls
    /// result in exactly one underlying download. A previous `Error` state
    /// is cleared and the load restarted.
    pub fn request_load(self: &Arc<Self>) -> bool {
        {
            let mut state = self.state.lock().unwrap();
            match &*state {
                ModelState::Loading { .. } | ModelState::Loaded => return false,
                _ => *state = ModelState::Loading { percent: 0 },
            }
        }

        let manager = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = manager.load_inner().await {
                let cause = format!("{e:#}");
                crate::warn!("Model {} load failed: {cause}", manager.size);
                *manager.state.lock().unwrap() = ModelState::Error { cause };
            }
        });
        true
    }

    /// Poll until the model is loaded, errored, or `max` elapses.
    ///
    /// Exists for consumers that subscribed after the load started (or never
    /// subscribed at all). Giving up returns the current state and does not
    /// disturb the load.
    pub async fn wait_until_ready(&self, poll: Duration, max: Duration) -> ModelState {
        let deadline = tokio::time::Instant::now() + max;
        loop {
            let state = self.state();
            if matches!(state, ModelState::Loaded | ModelState::Error { .. }) {
                return state;
            }
            if tokio::time::Instant::now() >= deadline {
                return state;
            }
            tokio::time::sleep(poll).await;
        }
    }

    async fn load_inner(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;

        let total_bytes = self
            .files
            .iter()
            .map(|f| f.size_mb * 1024 * 1024)
            .sum::<u64>()
            .max(1);
        let mut done_bytes: u64 = 0;

        for file in &self.files {
            let dest = self.dir.join(&file.name);
            let file_bytes = file.size_mb * 1024 * 1024;

            if !file_present(&dest) {
                crate::verbose!("Downloading {} from {}", file.name, file.url);
                let base = done_bytes;
                download::fetch_to_path(&file.url, &dest, |received| {
                    self.set_progress(base + received.min(file_bytes), total_bytes);
                })
                .await
                .with_context(|| format!("Failed to download {}", file.name))?;
            } else {
                crate::verbose!("Model file {} already present", file.name);
            }

            done_bytes += file_bytes;
            self.set_progress(done_bytes, total_bytes);
            let _ = self.events.send(ModelEvent::FileDone {
                file: file.name.clone(),
            });

            // A per-file done event does not make the model ready; re-check
            // the full set before any state change.
            if self.files_present() {
                self.finish_load().await?;
            }
        }

        if !self.is_fully_loaded() {
            anyhow::bail!("model files incomplete after download");
        }
        Ok(())
    }

    async fn finish_load(&self) -> Result<()> {
        if matches!(self.state(), ModelState::Loaded) {
            return Ok(());
        }

        if let Some(factory) = self.factory.clone() {
            if self.engine.lock().unwrap().is_none() {
                let dir = self.dir.clone();
                let model = tokio::task::spawn_blocking(move || factory(&dir))
                    .await
                    .context("Model initialization task panicked")?
                    .context("Failed to initialize speech engine")?;
                *self.engine.lock().unwrap() = Some(Arc::from(model));
            }
        }

        *self.state.lock().unwrap() = ModelState::Loaded;
        let _ = self.events.send(ModelEvent::Ready);
        crate::verbose!("Model {} loaded", self.size);
        Ok(())
    }

    fn set_progress(&self, done: u64, total: u64) {
        let percent = ((done as f64 / total as f64) * 100.0).min(100.0) as u8;
        let mut state = self.state.lock().unwrap();
        if let ModelState::Loading { percent: current } = &*state {
            if *current != percent {
                *state = ModelState::Loading { percent };
                let _ = self.events.send(ModelEvent::Progress { percent });
            }
        }
    }

    fn files_present(&self) -> bool {
        self.files
            .iter()
            .all(|file| file_present(&self.dir.join(&file.name)))
    }
}

fn file_present(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.len() > 0)
        .unwrap_or(false)
}

#[cfg(feature = "local-inference")]
fn default_factory(size: ModelSize) -> Option<SpeechModelFactory> {
    let file_name = size.info().files[0].name;
    Some(Arc::new(move |dir: &Path| {
        let model = WhisperSpeechModel::load(&dir.join(file_name))?;
        Ok(Box::new(model) as Box<dyn SpeechModel>)
    }))
}

#[cfg(not(feature = "local-inference"))]
fn default_factory(_size: ModelSize) -> Option<SpeechModelFactory> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct EchoModel;

    impl SpeechModel for EchoModel {
        fn transcribe(&self, samples: &[f32], _language: Option<&str>) -> Result<String> {
            Ok(format!("{} samples", samples.len()))
        }
    }

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"model-bytes").unwrap();
    }

    fn file(name: &str, url: &str) -> ManagedFile {
        ManagedFile {
            name: name.to_string(),
            url: url.to_string(),
            size_mb: 1,
        }
    }

    #[tokio::test]
    async fn load_with_files_present_completes_without_network() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.bin");
        touch(dir.path(), "b.bin");
        let manager = ModelManager::with_layout(
            ModelSize::Base,
            dir.path().to_path_buf(),
            vec![
                file("a.bin", "http://127.0.0.1:1/a.bin"),
                file("b.bin", "http://127.0.0.1:1/b.bin"),
            ],
            None,
        );
        let mut events = manager.subscribe();

        assert!(manager.request_load());
        let state = manager
            .wait_until_ready(Duration::from_millis(10), Duration::from_secs(5))
            .await;
        assert_eq!(state, ModelState::Loaded);
        assert!(manager.is_fully_loaded());

        let mut seen = Vec::new();
        while let Ok(event) = events.try_recv() {
            seen.push(event);
        }
        assert!(seen.contains(&ModelEvent::FileDone {
            file: "a.bin".to_string()
        }));
        assert!(seen.contains(&ModelEvent::FileDone {
            file: "b.bin".to_string()
        }));
        assert_eq!(
            seen.iter().filter(|e| **e == ModelEvent::Ready).count(),
            1
        );

        // Loading again is a no-op once loaded
        assert!(!manager.request_load());
    }

    #[tokio::test]
    async fn concurrent_requests_run_exactly_one_load() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.bin");

        let calls = Arc::new(AtomicUsize::new(0));
        let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();
        let release_rx = Arc::new(Mutex::new(release_rx));

        let factory: SpeechModelFactory = {
            let calls = Arc::clone(&calls);
            Arc::new(move |_dir: &Path| {
                calls.fetch_add(1, Ordering::SeqCst);
                release_rx.lock().unwrap().recv().ok();
                Ok(Box::new(EchoModel) as Box<dyn SpeechModel>)
            })
        };

        let manager = ModelManager::with_layout(
            ModelSize::Base,
            dir.path().to_path_buf(),
            vec![file("a.bin", "http://127.0.0.1:1/a.bin")],
            Some(factory),
        );

        assert!(manager.request_load());
        assert!(!manager.request_load());
        assert!(!manager.request_load());

        release_tx.send(()).unwrap();
        let state = manager
            .wait_until_ready(Duration::from_millis(10), Duration::from_secs(5))
            .await;
        assert_eq!(state, ModelState::Loaded);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(manager.speech_model().is_some());
    }

    #[tokio::test]
    async fn failed_download_retains_error_until_retry() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ModelManager::with_layout(
            ModelSize::Base,
            dir.path().to_path_buf(),
            vec![file("missing.bin", "http://127.0.0.1:1/missing.bin")],
            None,
        );

        assert!(manager.request_load());
        let state = manager
            .wait_until_ready(Duration::from_millis(10), Duration::from_secs(30))
            .await;
        assert!(matches!(state, ModelState::Error { .. }));
        assert!(!manager.is_fully_loaded());

        // Error is retained until the next load attempt, which is permitted
        assert!(matches!(manager.state(), ModelState::Error { .. }));
        touch(dir.path(), "missing.bin");
        assert!(manager.request_load());
        let state = manager
            .wait_until_ready(Duration::from_millis(10), Duration::from_secs(5))
            .await;
        assert_eq!(state, ModelState::Loaded);
    }

    #[tokio::test]
    async fn file_done_event_does_not_imply_ready() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "present.bin");
        let manager = ModelManager::with_layout(
            ModelSize::Base,
            dir.path().to_path_buf(),
            vec![
                file("present.bin", "http://127.0.0.1:1/present.bin"),
                file("absent.bin", "http://127.0.0.1:1/absent.bin"),
            ],
            None,
        );
        let mut events = manager.subscribe();

        manager.request_load();
        let state = manager
            .wait_until_ready(Duration::from_millis(10), Duration::from_secs(30))
            .await;
        assert!(matches!(state, ModelState::Error { .. }));

        let mut seen = Vec::new();
        while let Ok(event) = events.try_recv() {
            seen.push(event);
        }
        // The first file completed, but the model never became ready
        assert!(seen.contains(&ModelEvent::FileDone {
            file: "present.bin".to_string()
        }));
        assert!(!seen.contains(&ModelEvent::Ready));
    }

    #[tokio::test]
    async fn wait_until_ready_gives_up_without_erroring_the_load() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ModelManager::with_layout(
            ModelSize::Base,
            dir.path().to_path_buf(),
            vec![file("never.bin", "http://127.0.0.1:1/never.bin")],
            None,
        );
        // Never requested: polling bails out with the state unchanged
        let state = manager
            .wait_until_ready(Duration::from_millis(10), Duration::from_millis(50))
            .await;
        assert_eq!(state, ModelState::Unloaded);
    }
}
