//! Model inference layer.
//!
//! Defines the [`InferenceClient`] contract every agent talks to, plus the
//! JSON-extraction helper for model responses. The concrete Gemini-backed
//! client lives in [`gemini`].

mod client;
pub mod gemini;

pub use client::{Completion, InferenceClient, LlmError};

use serde_json::Value;

/// Extract a JSON object from a model response.
///
/// Models frequently wrap JSON in markdown fences or surround it with
/// prose. Tries, in order: direct parse, fenced code block, first
/// brace-delimited span.
pub fn extract_json(text: &str) -> Option<Value> {
    let trimmed = text.trim();

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        if value.is_object() {
            return Some(value);
        }
    }

    // Markdown code fence, with or without a language tag.
    if let Some(start) = trimmed.find("```") {
        let after = &trimmed[start + 3..];
        let body_start = after.find('\n').map(|i| i + 1).unwrap_or(0);
        if let Some(end) = after[body_start..].find("```") {
            let body = after[body_start..body_start + end].trim();
            if let Ok(value) = serde_json::from_str::<Value>(body) {
                if value.is_object() {
                    return Some(value);
                }
            }
        }
    }

    // Bare object embedded in prose.
    if let (Some(open), Some(close)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if open < close {
            if let Ok(value) = serde_json::from_str::<Value>(&trimmed[open..=close]) {
                if value.is_object() {
                    return Some(value);
                }
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_direct_json() {
        let value = extract_json(r#"{"score": 80, "findings": []}"#).unwrap();
        assert_eq!(value["score"], 80);
    }

    #[test]
    fn test_extract_fenced_json() {
        let text = "Here you go:\n```json\n{\"score\": 72}\n```\nHope that helps.";
        let value = extract_json(text).unwrap();
        assert_eq!(value["score"], 72);
    }

    #[test]
    fn test_extract_fence_without_language_tag() {
        let text = "```\n{\"score\": 55}\n```";
        let value = extract_json(text).unwrap();
        assert_eq!(value["score"], 55);
    }

    #[test]
    fn test_extract_embedded_json() {
        let text = "The analysis result is {\"score\": 64, \"summary\": \"ok\"} as requested.";
        let value = extract_json(text).unwrap();
        assert_eq!(value["score"], 64);
    }

    #[test]
    fn test_extract_rejects_garbage() {
        assert!(extract_json("no json here at all").is_none());
        assert!(extract_json("{broken json").is_none());
        assert!(extract_json("[1, 2, 3]").is_none());
    }
}
