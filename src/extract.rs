//! JSON Extraction and Repair
//!
//! Turns arbitrary model output into a parsed JSON value. Models wrap JSON in
//! prose, markdown fences, or truncate it mid-string; four escalating
//! strategies recover the value, first success wins:
//!
//! 1. Direct parse when the trimmed text starts with `{` or `[`
//! 2. Fenced block (optionally ```json-tagged) interior
//! 3. Balanced-object scan with a truncated-string repair pass
//! 4. Balanced-array scan, same algorithm with `[`/`]`
//!
//! Returns `None` when nothing parses - absence is the caller's decision to
//! escalate, never an error here.

use serde_json::Value;
use tracing::debug;

/// Extract the first parseable JSON value from model output.
///
/// Never fails: empty input or prose with no JSON-like tokens yields `None`.
pub fn extract_json(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    // Strategy 1: the whole text is the value
    if (trimmed.starts_with('{') || trimmed.starts_with('['))
        && let Ok(value) = serde_json::from_str(trimmed)
    {
        return Some(value);
    }

    // Strategy 2: fenced block interior, with a balanced scan restricted to
    // the interior when the direct parse fails
    if let Some(inner) = fenced_block(text) {
        if let Ok(value) = serde_json::from_str(inner.trim()) {
            return Some(value);
        }
        if let Some(value) = scan_balanced(inner, '{', '}') {
            debug!("extracted JSON via balanced scan inside fenced block");
            return Some(value);
        }
    }

    // Strategies 3 and 4: balanced scans over the full text
    if let Some(value) = scan_balanced(text, '{', '}') {
        return Some(value);
    }
    scan_balanced(text, '[', ']')
}

/// Locate the interior of the first markdown fence that contains an object or
/// array opener. The `json` language tag is optional.
fn fenced_block(text: &str) -> Option<&str> {
    let mut rest = text;

    while let Some(open) = rest.find("```") {
        let after = &rest[open + 3..];
        let after = after.strip_prefix("json").unwrap_or(after);

        let close = after.find("```")?;
        let inner = &after[..close];

        if inner.contains('{') || inner.contains('[') {
            return Some(inner);
        }
        rest = &after[close + 3..];
    }

    None
}

/// Balanced-delimiter scan from the first opener.
///
/// Tracks nesting depth plus a string-mode flag so structural characters
/// inside string literals never affect the depth counter. String mode toggles
/// on an un-escaped quote, single or double; a backslash suppresses exactly
/// the next character.
fn scan_balanced(text: &str, open: char, close: char) -> Option<Value> {
    let start = text.find(open)?;
    let body = &text[start..];

    let mut depth: u32 = 0;
    let mut in_string = false;
    let mut escape = false;
    let mut end = None;

    for (i, ch) in body.char_indices() {
        if escape {
            escape = false;
            continue;
        }

        match ch {
            '\\' => escape = true,
            '"' | '\'' => in_string = !in_string,
            c if c == open && !in_string => depth += 1,
            c if c == close && !in_string => {
                depth -= 1;
                if depth == 0 {
                    end = Some(i + close.len_utf8());
                    break;
                }
            }
            _ => {}
        }
    }

    // No balance point means the output was cut off; the candidate is
    // everything from the opener onward.
    let candidate = match end {
        Some(e) => &body[..e],
        None => body,
    };

    if let Ok(value) = serde_json::from_str(candidate) {
        return Some(value);
    }

    // Repair pass: the scan ended inside an unterminated string literal,
    // typically model output truncation.
    if in_string {
        let repaired = close_unterminated_string(candidate, close);
        if let Ok(value) = serde_json::from_str(&repaired) {
            debug!("repaired truncated string literal in model output");
            return Some(value);
        }
    }

    None
}

/// Close an unterminated string literal by inserting `"` immediately before
/// the last closing delimiter, falling back to appending at the very end when
/// no closer exists.
fn close_unterminated_string(candidate: &str, close: char) -> String {
    match candidate.rfind(close) {
        Some(idx) => {
            let mut repaired = String::with_capacity(candidate.len() + 1);
            repaired.push_str(&candidate[..idx]);
            repaired.push('"');
            repaired.push_str(&candidate[idx..]);
            repaired
        }
        None => {
            let mut repaired = candidate.to_string();
            repaired.push('"');
            repaired
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_direct_parse_object() {
        let value = extract_json(r#"{"a": 1}"#).unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn test_direct_parse_array_with_whitespace() {
        let value = extract_json("  \n[1, 2, 3]\n").unwrap();
        assert_eq!(value, json!([1, 2, 3]));
    }

    #[test]
    fn test_fenced_block_in_prose() {
        let input = "Here is the result:\n```json\n{\"a\":1,\"b\":[1,2,3]}\n```\nThanks";
        let value = extract_json(input).unwrap();
        assert_eq!(value, json!({"a": 1, "b": [1, 2, 3]}));
    }

    #[test]
    fn test_fenced_block_without_tag() {
        let input = "Sure:\n```\n{\"ok\": true}\n```";
        let value = extract_json(input).unwrap();
        assert_eq!(value, json!({"ok": true}));
    }

    #[test]
    fn test_fence_with_trailing_prose_inside() {
        // Direct parse of the interior fails; the balanced scan restricted to
        // the interior recovers the object.
        let input = "```json\n{\"a\": 1}\nnote: generated\n```";
        let value = extract_json(input).unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn test_object_embedded_in_prose() {
        let input = "The analysis produced {\"complexity\": 4} for this function.";
        let value = extract_json(input).unwrap();
        assert_eq!(value, json!({"complexity": 4}));
    }

    #[test]
    fn test_array_embedded_in_prose() {
        let input = "Candidates: [\"alpha\", \"beta\"] as requested.";
        let value = extract_json(input).unwrap();
        assert_eq!(value, json!(["alpha", "beta"]));
    }

    #[test]
    fn test_structural_chars_inside_strings() {
        let input = r#"Note: {"note":"use {curly} braces"} end"#;
        let value = extract_json(input).unwrap();
        assert_eq!(value, json!({"note": "use {curly} braces"}));
    }

    #[test]
    fn test_escaped_quote_inside_string() {
        let input = r#"{"quote":"she said \"hi\" twice"}"#;
        let value = extract_json(input).unwrap();
        assert_eq!(value, json!({"quote": "she said \"hi\" twice"}));
    }

    #[test]
    fn test_nested_objects() {
        let input = r#"Result: {"outer":{"inner":{"deep":[1,{"x":2}]}}} done"#;
        let value = extract_json(input).unwrap();
        assert_eq!(value, json!({"outer": {"inner": {"deep": [1, {"x": 2}]}}}));
    }

    #[test]
    fn test_truncated_string_repaired() {
        // The model stopped mid-string; the closing brace is swallowed by the
        // unterminated literal. The repair inserts a quote before the last }.
        let input = r#"{"summary": "the function parses}"#;
        let value = extract_json(input).unwrap();
        assert_eq!(value, json!({"summary": "the function parses"}));
    }

    #[test]
    fn test_empty_input_returns_none() {
        assert!(extract_json("").is_none());
        assert!(extract_json("   \n\t ").is_none());
    }

    #[test]
    fn test_prose_without_json_returns_none() {
        assert!(extract_json("No structured data here, sorry.").is_none());
    }

    #[test]
    fn test_unrepairable_truncation_returns_none() {
        assert!(extract_json(r#"{"a": {"b": 1"#).is_none());
    }

    #[test]
    fn test_close_unterminated_string_before_last_brace() {
        assert_eq!(
            close_unterminated_string(r#"{"a": "b}"#, '}'),
            r#"{"a": "b"}"#
        );
    }

    #[test]
    fn test_close_unterminated_string_appends_without_brace() {
        assert_eq!(close_unterminated_string(r#"{"a": "b"#, '}'), r#"{"a": "b""#);
    }

    #[test]
    fn test_fenced_block_skips_codeless_fence() {
        let input = "```\nplain text\n```\nand later {\"a\": 1}";
        let value = extract_json(input).unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    proptest! {
        #[test]
        fn prop_fenced_object_roundtrips(count in 0i64..10_000, note in "[a-z {}\\[\\]:,0-9]{0,30}") {
            let value = json!({"count": count, "note": note});
            let text = format!(
                "Sure, here is the analysis you asked for:\n```json\n{}\n```\nLet me know if you need more.",
                value
            );
            prop_assert_eq!(extract_json(&text).unwrap(), value);
        }

        #[test]
        fn prop_never_panics(input in "\\PC*") {
            let _ = extract_json(&input);
        }
    }
}
