pub mod audio;
pub mod cleanup;
pub mod config;
pub mod engine;
pub mod error;
pub mod http;
pub mod model;
pub mod power_mode;
pub mod provider;
pub mod services;
pub mod settings;
pub mod snippet;
pub mod verbose;

pub use cleanup::{CleanupBackend, DEFAULT_CLEANUP_PROMPT, count_words, filter_transcript};
pub use config::{CleanupProvider, SttProvider};
pub use engine::{
    Collaborators, DictationEngine, RecordingState, SessionOutcome, TranscriptionRecord,
};
pub use error::{CaptureError, PipelineError};
pub use http::{DEFAULT_TIMEOUT_SECS, get_http_client};
pub use model::{ModelEvent, ModelManager, ModelSize, ModelState, SpeechModel};
pub use power_mode::{AppMatcher, PowerMode, WindowContext, match_power_mode};
pub use provider::{ProviderRegistry, RawTranscript, SttBackend, SttRequest};
pub use services::{
    AudioCapture, CapturedAudio, HistorySink, InjectionOutcome, PowerModeSource, SettingsSource,
    SnippetSource, TextInjector, WindowContextSource,
};
pub use settings::Settings;
pub use snippet::{Snippet, expand};
pub use verbose::set_verbose;
