//! Snippet expansion: user-defined trigger words replaced with expansion text.
//!
//! Matching is whole-word and case-insensitive. Each snippet is applied in
//! collection order against the text produced so far; expansion output is
//! never rescanned for further triggers in the same pass, so a snippet can
//! safely expand to text containing another snippet's trigger.

use regex::RegexBuilder;
use serde::{Deserialize, Serialize};

/// A user-defined trigger → expansion substitution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
    pub id: String,
    /// Word or phrase that fires the expansion
    pub trigger: String,
    /// Replacement text, may span multiple lines
    pub expansion: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: u64,
    #[serde(default)]
    pub updated_at: u64,
}

/// One segment of the text being expanded. Segments produced by an earlier
/// snippet's expansion are frozen so later triggers cannot fire inside them.
struct Segment {
    text: String,
    frozen: bool,
}

/// Expand every snippet trigger found in `text`.
///
/// An empty snippet collection is the identity function. Triggers are
/// regex-escaped before matching, so metacharacters like `.` or `(` in a
/// trigger match themselves instead of breaking the pattern.
pub fn expand(text: &str, snippets: &[Snippet]) -> String {
    if snippets.is_empty() {
        return text.to_string();
    }

    let mut segments = vec![Segment {
        text: text.to_string(),
        frozen: false,
    }];

    for snippet in snippets {
        if snippet.trigger.trim().is_empty() {
            continue;
        }
        let pattern = format!(r"\b{}\b", regex::escape(&snippet.trigger));
        let re = match RegexBuilder::new(&pattern).case_insensitive(true).build() {
            Ok(re) => re,
            Err(_) => continue,
        };

        let mut next = Vec::with_capacity(segments.len());
        for segment in segments {
            if segment.frozen {
                next.push(segment);
                continue;
            }
            let mut last = 0;
            for m in re.find_iter(&segment.text) {
                if m.start() > last {
                    next.push(Segment {
                        text: segment.text[last..m.start()].to_string(),
                        frozen: false,
                    });
                }
                next.push(Segment {
                    text: snippet.expansion.clone(),
                    frozen: true,
                });
                last = m.end();
            }
            if last < segment.text.len() {
                next.push(Segment {
                    text: segment.text[last..].to_string(),
                    frozen: false,
                });
            }
        }
        segments = next;
    }

    segments.into_iter().map(|s| s.text).collect()
}
