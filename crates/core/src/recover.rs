//! Recovery of JSON structure from raw model output.
//!
//! Model output is frequently wrapped in markdown fences, surrounded by prose,
//! written with Python literals, or left with trailing commas. This module is
//! the one place that turns such text into strictly valid JSON or fails with a
//! [`RecoveryError`].

use crate::error::RecoveryError;
use regex::Regex;
use serde_json::{json, Value};
use std::sync::LazyLock;

/// Regex matching a comma followed only by whitespace before a closing bracket.
static TRAILING_COMMA_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",(\s*[}\]])").unwrap());

/// Markdown code-fence markers removed before anything else.
const FENCE_MARKERS: &[&str] = &["```json", "```"];

/// Characters that open a bullet line.
const BULLET_MARKERS: &[char] = &['-', '*', '•'];

/// Python literal spellings and their JSON equivalents, applied in order.
const LITERAL_REPLACEMENTS: &[(&str, &str)] = &[
    ("'", "\""),
    ("True", "true"),
    ("False", "false"),
    ("None", "null"),
];

/// Recover a JSON value from arbitrary model output.
pub fn recover_value(text: &str) -> Result<Value, RecoveryError> {
    log::debug!("Original response: {}", text);

    let mut clean = strip_fences(text);

    if !starts_structured(&clean) {
        let points = bullet_points(&clean);
        if !points.is_empty() {
            log::debug!("Synthesizing outline from {} bullet points", points.len());
            return Ok(json!([{
                "title": "Key Points",
                "type": "executive_summary",
                "key_points": points,
                "visuals": "Simple bullet point layout",
            }]));
        }

        let start = clean
            .find('[')
            .or_else(|| clean.find('{'))
            .ok_or(RecoveryError::NoStructureFound)?;
        clean = clean[start..].to_string();
    }

    if !ends_structured(&clean) {
        let end = clean
            .rfind(']')
            .or_else(|| clean.rfind('}'))
            .ok_or(RecoveryError::NoStructureFound)?;
        clean.truncate(end + 1);
    }

    log::debug!("Extracted JSON structure: {}", clean);

    let repaired = repair_trailing_commas(&repair_literals(&clean));
    log::debug!("Cleaned JSON string: {}", repaired);

    serde_json::from_str(&repaired).map_err(|e| {
        log::error!("JSON validation failed: {}", e);
        log::error!("Problematic JSON: {}", repaired);
        RecoveryError::ParseFailed {
            message: e.to_string(),
            text: repaired,
        }
    })
}

/// Recover model output and re-serialize it as pretty-printed JSON with
/// sorted keys.
pub fn recover_json(text: &str) -> Result<String, RecoveryError> {
    let value = recover_value(text)?;
    serde_json::to_string_pretty(&value).map_err(|e| RecoveryError::ParseFailed {
        text: text.to_string(),
        message: e.to_string(),
    })
}

/// Remove markdown code fences and surrounding whitespace.
fn strip_fences(text: &str) -> String {
    FENCE_MARKERS
        .iter()
        .fold(text.to_string(), |acc, marker| acc.replace(marker, ""))
        .trim()
        .to_string()
}

fn starts_structured(text: &str) -> bool {
    text.starts_with('[') || text.starts_with('{')
}

fn ends_structured(text: &str) -> bool {
    text.ends_with(']') || text.ends_with('}')
}

/// Collect the text of every bullet line, markers stripped.
fn bullet_points(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| line.starts_with(BULLET_MARKERS))
        .map(|line| {
            line.trim_start_matches(|c: char| BULLET_MARKERS.contains(&c) || c == ' ')
                .trim()
                .to_string()
        })
        .collect()
}

/// Replace Python-style quotes and literals. Not quote-context aware.
fn repair_literals(text: &str) -> String {
    LITERAL_REPLACEMENTS
        .iter()
        .fold(text.to_string(), |acc, (from, to)| acc.replace(from, to))
}

/// Strip commas that directly precede a closing `}` or `]`, including when
/// the closing bracket sits on a later line.
fn repair_trailing_commas(text: &str) -> String {
    TRAILING_COMMA_REGEX.replace_all(text, "$1").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_bullet_fallback() {
        let value = recover_value("- Grow 10%\n- Cut cost 5%").unwrap();
        let entries = value.as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["title"], "Key Points");
        assert_eq!(entries[0]["type"], "executive_summary");
        assert_eq!(entries[0]["key_points"], json!(["Grow 10%", "Cut cost 5%"]));
        assert_eq!(entries[0]["visuals"], "Simple bullet point layout");
    }

    #[test]
    fn test_bullet_fallback_mixed_markers_and_prose() {
        let value = recover_value("Here you go:\n* First\n  • Second\nThanks").unwrap();
        assert_eq!(value[0]["key_points"], json!(["First", "Second"]));
    }

    #[test]
    fn test_literal_repair() {
        let value = recover_value("{'t': 'Exec Summary', 'k': ['A','B',], 'v': 'chart'}").unwrap();
        assert_eq!(
            value,
            json!({"t": "Exec Summary", "k": ["A", "B"], "v": "chart"})
        );
    }

    #[test]
    fn test_python_literals() {
        let value = recover_value("{\"b\": True, \"i\": False, \"c\": None}").unwrap();
        assert_eq!(value, json!({"b": true, "i": false, "c": null}));
    }

    #[test]
    fn test_strips_code_fences() {
        let value = recover_value("```json\n[{\"t\": \"A\"}]\n```").unwrap();
        assert_eq!(value, json!([{"t": "A"}]));
    }

    #[test]
    fn test_extracts_from_surrounding_prose() {
        let text = "Sure! Here is the outline:\n[{\"t\": \"A\"}]\nLet me know.";
        assert_eq!(recover_value(text).unwrap(), json!([{"t": "A"}]));
    }

    #[test]
    fn test_object_with_trailing_prose() {
        let text = "{\"t\": \"A\", \"v\": \"chart\"} hope this helps";
        assert_eq!(recover_value(text).unwrap(), json!({"t": "A", "v": "chart"}));
    }

    #[test]
    fn test_end_boundary_prefers_closing_bracket() {
        // The last `]` wins over a later `}`, cutting the object short.
        let text = "{\"k\": [\"x\"]} trailing words";
        assert!(matches!(
            recover_value(text),
            Err(RecoveryError::ParseFailed { .. })
        ));
    }

    #[test]
    fn test_multiline_trailing_commas() {
        let text = "[\n  {\n    \"t\": \"A\",\n    \"k\": [\"x\",\n    ],\n  },\n\n]";
        assert_eq!(recover_value(text).unwrap(), json!([{"t": "A", "k": ["x"]}]));
    }

    #[test]
    fn test_no_structure() {
        assert_eq!(
            recover_value("I cannot help with that."),
            Err(RecoveryError::NoStructureFound)
        );
        assert_eq!(recover_value(""), Err(RecoveryError::NoStructureFound));
    }

    #[test]
    fn test_parse_failure_carries_text() {
        match recover_value("[{\"t\": \"A\" \"k\": 1}]") {
            Err(RecoveryError::ParseFailed { text, .. }) => {
                assert_eq!(text, "[{\"t\": \"A\" \"k\": 1}]");
            }
            other => panic!("expected parse failure, got {:?}", other),
        }
    }

    #[test]
    fn test_apostrophe_corruption_is_preserved() {
        // Literal repair is not quote-aware: apostrophes in content break parsing.
        let result = recover_value("{\"t\": \"Don't stop\"}");
        assert!(matches!(result, Err(RecoveryError::ParseFailed { .. })));
    }

    #[test]
    fn test_recover_json_sorts_keys() {
        let out = recover_json("{\"v\": 1, \"a\": 2}").unwrap();
        assert!(out.find("\"a\"").unwrap() < out.find("\"v\"").unwrap());
    }

    proptest! {
        #[test]
        fn prop_recovery_is_total(text in ".{0,200}") {
            if let Ok(out) = recover_json(&text) {
                prop_assert!(serde_json::from_str::<Value>(&out).is_ok());
            }
        }

        #[test]
        fn prop_recovery_is_total_on_bracket_soup(text in "[\\[\\]{}:,'\" a-zTFN1-]{0,60}") {
            if let Ok(out) = recover_json(&text) {
                prop_assert!(serde_json::from_str::<Value>(&out).is_ok());
            }
        }
    }
}
