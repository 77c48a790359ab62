//! Shared implementation for OpenAI-compatible transcription APIs.
//!
//! Both the OpenAI and Groq Whisper endpoints use the same format:
//! - Multipart form upload with `model` and `file` fields
//! - Authorization via `Bearer` token
//! - JSON response with a `text` field

use anyhow::{Context, Result};
use serde::Deserialize;

use super::super::{RawTranscript, SttRequest};

/// Response structure for OpenAI-compatible APIs
#[derive(Deserialize)]
struct OpenAICompatibleResponse {
    text: String,
}

/// Transcribe audio using an OpenAI-compatible API.
///
/// # Parameters
/// - `client`: Shared reqwest client for connection pooling
/// - `api_url`: The API endpoint URL (e.g., "https://api.openai.com/v1/audio/transcriptions")
/// - `model`: The model name to use (e.g., "whisper-1")
/// - `api_key`: Bearer token for authentication
/// - `request`: STT request with audio data and options
pub(crate) async fn openai_compatible_transcribe(
    client: &reqwest::Client,
    api_url: &str,
    model: &str,
    api_key: &str,
    request: SttRequest,
) -> Result<RawTranscript> {
    let mut form = reqwest::multipart::Form::new()
        .text("model", model.to_string())
        .part(
            "file",
            reqwest::multipart::Part::bytes(request.audio_data.clone())
                .file_name(request.filename.clone())
                .mime_str(&request.mime_type)?,
        );

    if let Some(lang) = request.language.clone() {
        form = form.text("language", lang);
    }

    let response = client
        .post(api_url)
        .header("Authorization", format!("Bearer {api_key}"))
        .multipart(form)
        .send()
        .await
        .context("Failed to send request")?;

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        anyhow::bail!("API error ({status}): {error_text}");
    }

    let text = response
        .text()
        .await
        .context("Failed to get response text")?;
    let resp: OpenAICompatibleResponse =
        serde_json::from_str(&text).context("Failed to parse API response")?;

    Ok(RawTranscript { text: resp.text })
}
