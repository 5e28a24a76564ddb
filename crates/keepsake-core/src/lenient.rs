// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lenient extraction of classification JSON from LLM free text.
//!
//! Classification calls expect a small JSON object, but models wrap it in
//! markdown fences, prose, or both. The policy is fixed: strip an optional
//! code fence, find the first balanced `{...}` span, parse it. Any failure
//! yields `None` so callers take their conservative default.

use serde::de::DeserializeOwned;
use tracing::debug;

/// Extract and parse the first balanced JSON object found in `text`.
///
/// Returns `None` on any failure; never panics.
pub fn extract_json_object(text: &str) -> Option<serde_json::Value> {
    let stripped = strip_code_fence(text.trim());
    let span = first_balanced_object(stripped)?;
    match serde_json::from_str(span) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!(error = %e, "failed to parse extracted JSON span");
            None
        }
    }
}

/// Extract the first balanced JSON object and deserialize it into `T`.
pub fn extract_classification<T: DeserializeOwned>(text: &str) -> Option<T> {
    let value = extract_json_object(text)?;
    match serde_json::from_value(value) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            debug!(error = %e, "classification JSON did not match expected shape");
            None
        }
    }
}

/// Strip a leading/trailing markdown code fence (```json or ```), if present.
fn strip_code_fence(text: &str) -> &str {
    let mut s = text;
    if let Some(rest) = s.strip_prefix("```json") {
        s = rest;
    } else if let Some(rest) = s.strip_prefix("```") {
        s = rest;
    }
    if let Some(rest) = s.strip_suffix("```") {
        s = rest;
    }
    s.trim()
}

/// Find the first `{...}` span with balanced braces, honoring JSON string
/// literals and escapes so braces inside strings do not count.
fn first_balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Decision {
        search_needed: bool,
        search_query: Option<String>,
    }

    #[test]
    fn parses_bare_object() {
        let value = extract_json_object(r#"{"a": 1}"#).unwrap();
        assert_eq!(value["a"], 1);
    }

    #[test]
    fn parses_fenced_object() {
        let text = "```json\n{\"search_needed\": true, \"search_query\": \"rust 1.85\"}\n```";
        let d: Decision = extract_classification(text).unwrap();
        assert!(d.search_needed);
        assert_eq!(d.search_query.as_deref(), Some("rust 1.85"));
    }

    #[test]
    fn parses_object_with_surrounding_prose() {
        let text = "Sure! Here is my decision:\n{\"search_needed\": false, \"search_query\": null}\nHope that helps.";
        let d: Decision = extract_classification(text).unwrap();
        assert!(!d.search_needed);
        assert!(d.search_query.is_none());
    }

    #[test]
    fn ignores_braces_inside_strings() {
        let text = r#"{"reason": "contains {braces} and \"quotes\"", "search_needed": true, "search_query": "q"}"#;
        let d: Decision = extract_classification(text).unwrap();
        assert!(d.search_needed);
    }

    #[test]
    fn nested_objects_balance() {
        let value = extract_json_object(r#"noise {"outer": {"inner": 2}} trailing"#).unwrap();
        assert_eq!(value["outer"]["inner"], 2);
    }

    #[test]
    fn malformed_inputs_yield_none() {
        for text in ["", "   ", "not json", "{unbalanced", "{\"a\": }", "```\n```", "[1, 2, 3]"] {
            assert!(
                extract_json_object(text).is_none(),
                "expected None for {text:?}"
            );
        }
    }

    #[test]
    fn shape_mismatch_yields_none() {
        // Valid JSON, wrong shape for the target struct.
        let text = r#"{"search_needed": "definitely"}"#;
        assert!(extract_classification::<Decision>(text).is_none());
    }

    #[test]
    fn fence_without_language_tag() {
        let text = "```\n{\"search_needed\": true, \"search_query\": \"x\"}\n```";
        let d: Decision = extract_classification(text).unwrap();
        assert!(d.search_needed);
    }
}
