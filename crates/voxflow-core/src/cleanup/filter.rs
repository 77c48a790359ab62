//! Pre-AI transcript hygiene.
//!
//! Whisper-class models hallucinate bracketed stage directions, XML-ish tag
//! blocks and repeated sentences on silence or noise. This pass strips those
//! artifacts with cheap regex work before any LLM is involved, and always
//! runs, even when AI cleanup is disabled.

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

// Square brackets and curly braces are always artifacts: [music], {noise}
static SQUARE_BRACKETS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[[^\]]*\]").unwrap());
static CURLY_BRACKETS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{[^}]*\}").unwrap());

// Parentheses: only remove known hallucination phrases, not all parenthesized text
static PAREN_HALLUCINATIONS: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(
        r"\(\s*(?:laughing|laughter|applause|music|inaudible|silence|background noise|coughing|sneezing|sighing|breathing|crosstalk|foreign language|phone ringing|bell|beep|buzzing|static)\s*\)",
    )
    .case_insensitive(true)
    .build()
    .unwrap()
});

// XML-style tag blocks hallucinated by some models
static XML_TAG_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<[A-Za-z][A-Za-z0-9:_-]*[^>]*>.*?</[A-Za-z][A-Za-z0-9:_-]*>").unwrap());

static EXTRA_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]{2,}").unwrap());

/// Remove hallucinated artifacts from raw transcript text.
pub fn filter_transcript(text: &str) -> String {
    let mut filtered = XML_TAG_BLOCK.replace_all(text, "").into_owned();
    filtered = SQUARE_BRACKETS.replace_all(&filtered, "").into_owned();
    filtered = CURLY_BRACKETS.replace_all(&filtered, "").into_owned();
    filtered = PAREN_HALLUCINATIONS.replace_all(&filtered, "").into_owned();
    filtered = collapse_repeated_sentences(&filtered, 4);
    filtered = EXTRA_WHITESPACE.replace_all(&filtered, " ").into_owned();
    filtered.trim().to_string()
}

/// Collapse runs of identical sentences ("Thank you. Thank you. Thank you.")
/// down to one instance. Sentences shorter than `min_length` are kept as-is.
fn collapse_repeated_sentences(text: &str, min_length: usize) -> String {
    let sentences = split_sentences(text);
    if sentences.len() < 2 {
        return text.to_string();
    }

    let mut result: Vec<&str> = Vec::with_capacity(sentences.len());
    let mut i = 0;
    while i < sentences.len() {
        let current = sentences[i].trim();
        result.push(current);
        if current.len() < min_length {
            i += 1;
            continue;
        }
        let mut count = 1;
        while i + count < sentences.len() && sentences[i + count].trim() == current {
            count += 1;
        }
        i += count;
    }

    result.join(" ")
}

/// Split after sentence-ending punctuation followed by whitespace.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if matches!(bytes[i], b'.' | b'!' | b'?') {
            let mut end = i + 1;
            let mut saw_space = false;
            while end < bytes.len() && bytes[end].is_ascii_whitespace() {
                saw_space = true;
                end += 1;
            }
            if saw_space && end < bytes.len() {
                sentences.push(text[start..i + 1].trim());
                start = end;
                i = end;
                continue;
            }
        }
        i += 1;
    }
    if start < text.len() {
        sentences.push(text[start..].trim());
    }
    sentences
}

/// Default filler words stripped when the toggle is on.
pub const DEFAULT_FILLER_WORDS: &[&str] = &[
    "um", "uh", "like", "you know", "so", "basically", "actually", "I mean", "right", "yeah",
    "well",
];

/// Remove common filler words from a transcript.
///
/// Separate from `filter_transcript` because this one is user-togglable.
pub fn remove_filler_words(text: &str, filler_words: &[&str]) -> String {
    let mut filtered = text.to_string();

    for filler in filler_words {
        let pattern = format!(r"\b{}\b[,.]?\s*", regex::escape(filler));
        let Ok(re) = RegexBuilder::new(&pattern).case_insensitive(true).build() else {
            continue;
        };
        filtered = re.replace_all(&filtered, "").into_owned();
    }

    filtered = EXTRA_WHITESPACE.replace_all(&filtered, " ").into_owned();
    let filtered = filtered.trim();

    // Re-capitalize if a leading filler got stripped
    let mut chars = filtered.chars();
    match chars.next() {
        Some(first) if first.is_lowercase() && filtered != text.trim_start() => {
            first.to_uppercase().collect::<String>() + chars.as_str()
        }
        _ => filtered.to_string(),
    }
}

/// Whitespace-delimited token count, used for history records.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}
