//! Groq Whisper API transcription provider
//!
//! Groq serves whisper-large-v3-turbo through an OpenAI-compatible endpoint
//! at very low latency, which makes it the usual pick for dictation.

use anyhow::Result;
use async_trait::async_trait;

use super::base::openai_compatible_transcribe;
use super::{RawTranscript, SttBackend, SttRequest};

const API_URL: &str = "https://api.groq.com/openai/v1/audio/transcriptions";
const MODEL: &str = "whisper-large-v3-turbo";

/// Groq Whisper transcription provider
#[derive(Debug, Default, Clone)]
pub struct GroqSttProvider;

#[async_trait]
impl SttBackend for GroqSttProvider {
    fn name(&self) -> &'static str {
        "groq"
    }

    fn display_name(&self) -> &'static str {
        "Groq Whisper"
    }

    async fn transcribe(
        &self,
        client: &reqwest::Client,
        api_key: &str,
        request: SttRequest,
    ) -> Result<RawTranscript> {
        openai_compatible_transcribe(client, API_URL, MODEL, api_key, request).await
    }
}
