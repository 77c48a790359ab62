//! Power modes: per-application rule sets that override providers and prompt.
//!
//! A mode matches the foreground window by title substring or by process
//! name substring, both case-insensitive. Title matchers are checked first
//! within each mode; modes are evaluated in caller order and the first
//! enabled mode with any match wins.

use serde::{Deserialize, Serialize};

use crate::config::{CleanupProvider, SttProvider};

/// Matches an application by its process name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppMatcher {
    /// Substring matched against the foreground process name, e.g. "chrome"
    pub process_name: String,
    /// Human-readable label, e.g. "Google Chrome"
    #[serde(default)]
    pub display_name: String,
}

/// A named rule set selecting providers and prompt for matching windows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PowerMode {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub app_matchers: Vec<AppMatcher>,
    /// Substrings matched against the window title (browser tabs put the
    /// page URL/host there, hence the original field name)
    #[serde(default)]
    pub url_matchers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_prompt_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stt_provider: Option<SttProvider>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cleanup_provider: Option<CleanupProvider>,
    pub is_enabled: bool,
}

/// Foreground window snapshot taken at session start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowContext {
    pub process_name: String,
    pub title: String,
}

/// Select the first enabled mode matching the window context.
///
/// Title matchers take strict precedence over app matchers within a mode.
/// Empty patterns never match. No window context means no mode.
pub fn match_power_mode<'a>(
    window: Option<&WindowContext>,
    modes: &'a [PowerMode],
) -> Option<&'a PowerMode> {
    let window = window?;
    let title = window.title.to_lowercase();
    let process = window.process_name.to_lowercase();

    for mode in modes {
        if !mode.is_enabled {
            continue;
        }
        for pattern in &mode.url_matchers {
            let pattern = pattern.trim();
            if !pattern.is_empty() && title.contains(&pattern.to_lowercase()) {
                return Some(mode);
            }
        }
        for app in &mode.app_matchers {
            let pattern = app.process_name.trim();
            if !pattern.is_empty() && process.contains(&pattern.to_lowercase()) {
                return Some(mode);
            }
        }
    }
    None
}
