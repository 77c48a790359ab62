//! Shared HTTP client for provider calls.
//!
//! All remote STT and cleanup requests go through one pooled client so
//! repeated sessions reuse connections instead of paying TLS setup per call.

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use std::time::Duration;

/// Default timeout for provider HTTP calls, in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

static HTTP_CLIENT: OnceCell<reqwest::Client> = OnceCell::new();

/// Get the process-wide HTTP client, creating it on first use.
pub fn get_http_client() -> Result<&'static reqwest::Client> {
    HTTP_CLIENT.get_or_try_init(|| {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client")
    })
}
