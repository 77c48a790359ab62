//! OpenAI Whisper API transcription provider

use anyhow::Result;
use async_trait::async_trait;

use super::base::openai_compatible_transcribe;
use super::{RawTranscript, SttBackend, SttRequest};

const API_URL: &str = "https://api.openai.com/v1/audio/transcriptions";
const MODEL: &str = "whisper-1";

/// OpenAI Whisper transcription provider
#[derive(Debug, Default, Clone)]
pub struct OpenAiSttProvider;

#[async_trait]
impl SttBackend for OpenAiSttProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn display_name(&self) -> &'static str {
        "OpenAI Whisper"
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
