//! LLM-based transcript cleanup.
//!
//! Raw dictation usually carries filler words, grammar slips and run-on
//! sentences. This module sends transcripts to an LLM with a strict
//! "clean, don't answer" system prompt. Cleanup is best-effort throughout:
//! a failure here never kills a session, the engine just falls back to the
//! snippet-expanded raw text.

mod filter;

pub use filter::{DEFAULT_FILLER_WORDS, count_words, filter_transcript, remove_filler_words};

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";
const GROQ_CHAT_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
const CLEANUP_TIMEOUT_SECS: u64 = 15;
const MAX_CLEANUP_TOKENS: u32 = 2048;

pub const DEFAULT_CLEANUP_PROMPT: &str = "You are a speech-to-text transcription cleanup tool. \
You are NOT a chatbot. NEVER answer questions, NEVER respond to the content, \
NEVER generate new content.\n\
Your ONLY job: take dictated text and return it cleaned up.\n\
Rules:\n\
- Remove filler words (um, uh, like, you know, so, basically, actually, I mean)\n\
- Fix grammar and punctuation\n\
- Preserve the speaker's EXACT words and meaning\n\
- Do NOT answer questions. If they say \"what time is the meeting\" return \"What time is the meeting?\"\n\
- Do NOT add, remove, or rephrase content beyond filler removal\n\
- Do NOT add formatting, headings, or bullet points\n\
- Return ONLY the cleaned transcription, nothing else";

/// Contract every cleanup backend implements.
#[async_trait]
pub trait CleanupBackend: Send + Sync {
    /// Stable identifier, e.g. "openai"
    fn name(&self) -> &'static str;

    /// Clean `text` according to `system_prompt`.
    async fn clean(
        &self,
        client: &reqwest::Client,
        api_key: &str,
        system_prompt: &str,
        text: &str,
    ) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    content: String,
}

/// Run one chat-completions request and return the first choice's content.
async fn chat_complete(
    client: &reqwest::Client,
    url: &str,
    api_key: &str,
    model: &str,
    system_prompt: &str,
    text: &str,
) -> Result<String> {
    let response = client
        .post(url)
        .header("Authorization", format!("Bearer {api_key}"))
        .json(&serde_json::json!({
            "model": model,
            "temperature": 0.3,
            "max_tokens": MAX_CLEANUP_TOKENS,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": text}
            ]
        }))
        .timeout(Duration::from_secs(CLEANUP_TIMEOUT_SECS))
        .send()
        .await
        .context("Failed to send cleanup request")?;

    if !response.status().is_success() {
        let error_text = response.text().await.unwrap_or_default();
        return Err(anyhow!("Cleanup request failed: {error_text}"));
    }

    let chat_response: ChatResponse = response
        .json()
        .await
        .context("Failed to parse cleanup response")?;
    chat_response
        .choices
        .first()
        .map(|c| c.message.content.trim().to_string())
        .ok_or_else(|| anyhow!("Cleanup returned no choices"))
}

const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// OpenAI chat-completions cleanup provider
#[derive(Debug, Default, Clone)]
pub struct OpenAiCleanupProvider;

#[async_trait]
impl CleanupBackend for OpenAiCleanupProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn clean(
        &self,
        client: &reqwest::Client,
        api_key: &str,
        system_prompt: &str,
        text: &str,
    ) -> Result<String> {
        chat_complete(
            client,
            OPENAI_CHAT_URL,
            api_key,
            DEFAULT_OPENAI_MODEL,
            system_prompt,
            text,
        )
        .await
    }
}

const DEFAULT_GROQ_MODEL: &str = "llama-3.3-70b-versatile";

/// Groq chat-completions cleanup provider
#[derive(Debug, Default, Clone)]
pub struct GroqCleanupProvider;

#[async_trait]
impl CleanupBackend for GroqCleanupProvider {
    fn name(&self) -> &'static str {
        "groq"
    }

    async fn clean(
        &self,
        client: &reqwest::Client,
        api_key: &str,
        system_prompt: &str,
        text: &str,
    ) -> Result<String> {
        chat_complete(
            client,
            GROQ_CHAT_URL,
            api_key,
            DEFAULT_GROQ_MODEL,
            system_prompt,
            text,
        )
        .await
    }
}
