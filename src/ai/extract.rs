//! JSON payload extraction from free-form AI responses
//!
//! Providers often wrap the requested JSON in prose or markdown fences.
//! `extract_json` scans for the first balanced top-level object or array,
//! skipping brackets that occur inside string literals, and falls back to
//! parsing the whole response when no balanced span is found.

use crate::{Error, Result};
use serde_json::Value;

/// Extract and parse the first JSON object or array embedded in `response`
pub fn extract_json(response: &str) -> Result<Value> {
    if let Some(span) = balanced_span(response) {
        if let Ok(value) = serde_json::from_str(span) {
            return Ok(value);
        }
    }
    serde_json::from_str(response.trim()).map_err(|e| Error::Parse {
        message: format!("No parseable JSON in AI response: {e}"),
        raw: response.to_string(),
    })
}

/// Find the first balanced `{...}` or `[...]` span outside string literals
fn balanced_span(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let start = bytes.iter().position(|&b| b == b'{' || b == b'[')?;
    let open = bytes[start];
    let close = if open == b'{' { b'}' } else { b']' };

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
            _ if b == open => depth += 1,
            _ if b == close => {
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
    use serde_json::json;

    #[test]
    fn extracts_object_from_prose() {
        let response = "Sure! Here is the vocabulary:\n```json\n{\"items\": [1, 2]}\n```\nLet me know.";
        assert_eq!(extract_json(response).unwrap(), json!({"items": [1, 2]}));
    }

    #[test]
    fn extracts_array() {
        let response = "[{\"word\": \"back\"}] trailing text";
        assert_eq!(extract_json(response).unwrap(), json!([{"word": "back"}]));
    }

    #[test]
    fn brackets_inside_strings_do_not_close_the_span() {
        let response = r#"note {"text": "a } inside \" and {", "n": 1} done"#;
        assert_eq!(
            extract_json(response).unwrap(),
            json!({"text": "a } inside \" and {", "n": 1})
        );
    }

    #[test]
    fn bare_json_parses_via_fallback() {
        // no prose at all, but leading whitespace
        let response = "  \n {\"ok\": true} ";
        assert_eq!(extract_json(response).unwrap(), json!({"ok": true}));
    }

    #[test]
    fn unparseable_response_reports_raw_text() {
        let response = "I could not produce JSON today.";
        match extract_json(response) {
            Err(Error::Parse { raw, .. }) => assert_eq!(raw, response),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn unbalanced_span_falls_through_to_error() {
        let response = "{\"truncated\": ";
        assert!(matches!(extract_json(response), Err(Error::Parse { .. })));
    }
}
