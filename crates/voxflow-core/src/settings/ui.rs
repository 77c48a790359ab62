//! User interface and behavior settings.

use serde::{Deserialize, Serialize};

/// Settings for session behavior and device configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiSettings {
    /// Inject the cleaned text into the focused application when done
    #[serde(default = "default_true")]
    pub auto_inject: bool,

    /// Master toggle for power-mode matching at session start
    #[serde(default = "default_true")]
    pub power_modes_enabled: bool,

    /// Selected microphone device name (None = system default)
    #[serde(default)]
    pub microphone_device: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            auto_inject: true,
            power_modes_enabled: true,
            microphone_device: None,
        }
    }
}
