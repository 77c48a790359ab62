//! Deepgram pre-recorded transcription provider
//!
//! Deepgram does not use the OpenAI multipart format: audio goes as the raw
//! request body with its MIME type, authentication uses a `Token` header,
//! and the transcript sits nested inside the response JSON.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use super::{RawTranscript, SttBackend, SttRequest};

const API_URL: &str = "https://api.deepgram.com/v1/listen";
const MODEL: &str = "nova-2";

/// Deepgram pre-recorded transcription provider
#[derive(Debug, Default, Clone)]
pub struct DeepgramSttProvider;

#[derive(Deserialize)]
struct DeepgramResponse {
    results: DeepgramResults,
}

#[derive(Deserialize)]
struct DeepgramResults {
    channels: Vec<DeepgramChannel>,
}

#[derive(Deserialize)]
struct DeepgramChannel {
    alternatives: Vec<DeepgramAlternative>,
}

#[derive(Deserialize)]
struct DeepgramAlternative {
    transcript: String,
}

#[async_trait]
impl SttBackend for DeepgramSttProvider {
    fn name(&self) -> &'static str {
        "deepgram"
    }

    fn display_name(&self) -> &'static str {
        "Deepgram"
    }

    async fn transcribe(
        &self,
        client: &reqwest::Client,
        api_key: &str,
        request: SttRequest,
    ) -> Result<RawTranscript> {
        let mut query: Vec<(&str, String)> = vec![
            ("model", MODEL.to_string()),
            ("smart_format", "true".to_string()),
        ];
        if let Some(lang) = request.language.clone() {
            query.push(("language", lang));
        }

        let response = client
            .post(API_URL)
            .query(&query)
            .header("Authorization", format!("Token {api_key}"))
            .header("Content-Type", request.mime_type.clone())
            .body(request.audio_data.clone())
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

        let parsed: DeepgramResponse = response
            .json()
            .await
            .context("Failed to parse API response")?;

        let transcript = parsed
            .results
            .channels
            .first()
            .and_then(|c| c.alternatives.first())
            .map(|a| a.transcript.clone())
            .context("Deepgram returned no transcript")?;

        Ok(RawTranscript { text: transcript })
    }
}
