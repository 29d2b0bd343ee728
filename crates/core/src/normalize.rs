//! Schema normalization of recovered model output.
//!
//! Accepts both the compact short-key form requested in prompts (`t`, `k`,
//! `v`, `l`, `s`, `p`, `c`, `f`, `b`) and the canonical long-key form, and
//! produces fully defaulted canonical records.

use crate::error::{Error, Result};
use crate::types::{
    Alignment, DetailedContent, Layout, Location, ParagraphSpacing, Shape, ShapeKind,
    SlideCategory, SlideOutlineEntry, TextRun, TextStyle, DEFAULT_TITLE, DEFAULT_VISUAL_HINT,
};
use serde_json::{Map, Value};
use unicode_normalization::UnicodeNormalization;

/// Default font size for body runs.
pub const DEFAULT_FONT_SIZE: u32 = 24;

/// Font size of a synthesized title run.
pub const TITLE_FONT_SIZE: u32 = 32;

/// Default layout type.
const DEFAULT_LAYOUT_TYPE: &str = "content";

/// Keyword rules for category inference, checked in order; first match wins.
const CATEGORY_KEYWORDS: &[(&[&str], SlideCategory)] = &[
    (&["summary", "overview"], SlideCategory::ExecutiveSummary),
    (&["problem", "challenge"], SlideCategory::ProblemStatement),
    (&["solution", "approach"], SlideCategory::Solution),
    (&["next", "step"], SlideCategory::Roadmap),
    (&["data", "metric", "number", "stat"], SlideCategory::Data),
    (&["conclusion", "recommendation"], SlideCategory::Conclusion),
];

/// Infer a slide category from title keywords.
pub fn infer_category(title: &str) -> SlideCategory {
    let folded = title.nfkc().collect::<String>().to_lowercase();

    CATEGORY_KEYWORDS
        .iter()
        .find(|(words, _)| words.iter().any(|w| folded.contains(w)))
        .map(|(_, category)| *category)
        .unwrap_or(SlideCategory::Content)
}

/// Normalize an outline: an array of entries or a single entry object.
pub fn normalize_outline(value: &Value) -> Result<Vec<SlideOutlineEntry>> {
    match value {
        Value::Array(items) => Ok(items.iter().map(normalize_outline_entry).collect()),
        Value::Object(_) => Ok(vec![normalize_outline_entry(value)]),
        other => Err(Error::Validation(format!(
            "outline must be an array or object, got {}",
            json_kind(other)
        ))),
    }
}

/// Normalize a single outline entry. Non-object values yield a fully
/// defaulted entry.
pub fn normalize_outline_entry(value: &Value) -> SlideOutlineEntry {
    let empty = Map::new();
    let map = value.as_object().unwrap_or(&empty);

    let title = string_field(map, &["title", "t"]).unwrap_or_else(|| DEFAULT_TITLE.to_string());

    let category = string_field(map, &["type"])
        .and_then(|name| {
            let parsed = SlideCategory::from_name(&name);
            if parsed.is_none() {
                log::debug!("Unknown slide type '{}', inferring from title", name);
            }
            parsed
        })
        .unwrap_or_else(|| infer_category(&title));

    let key_points = field(map, &["key_points", "k"])
        .map(string_list)
        .unwrap_or_default();

    let visual_hint =
        string_field(map, &["visuals", "v"]).unwrap_or_else(|| DEFAULT_VISUAL_HINT.to_string());

    SlideOutlineEntry {
        title,
        category,
        key_points,
        visual_hint,
    }
}

/// Normalize detailed slide content for the given outline entry, completing
/// the TITLE and BODY shapes from the entry when the content lacks them.
pub fn normalize_content(value: &Value, entry: &SlideOutlineEntry) -> Result<DetailedContent> {
    let map = value.as_object().ok_or_else(|| {
        Error::Validation(format!(
            "slide content must be an object, got {}",
            json_kind(value)
        ))
    })?;

    let empty = Map::new();
    let layout_map = field(map, &["layout", "l"])
        .and_then(Value::as_object)
        .unwrap_or(&empty);
    let layout = Layout {
        name: string_field(layout_map, &["name", "n"])
            .unwrap_or_else(|| entry.category.layout_name()),
        kind: string_field(layout_map, &["type", "t"])
            .unwrap_or_else(|| DEFAULT_LAYOUT_TYPE.to_string()),
    };

    let shapes = field(map, &["shapes", "s"])
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_object)
                .map(normalize_shape)
                .collect()
        })
        .unwrap_or_default();

    let mut content = DetailedContent { layout, shapes };
    complete_shapes(&mut content, entry);
    Ok(content)
}

/// Insert a TITLE shape and append a BODY shape when missing.
pub fn complete_shapes(content: &mut DetailedContent, entry: &SlideOutlineEntry) {
    if !content.has_kind(&ShapeKind::Title) {
        content.shapes.insert(0, title_shape(entry));
    }
    if !content.has_kind(&ShapeKind::Body) {
        content.shapes.push(body_shape(entry));
    }
}

/// Title shape synthesized from an outline entry.
pub fn title_shape(entry: &SlideOutlineEntry) -> Shape {
    Shape::new(
        ShapeKind::Title,
        Location::TITLE,
        vec![TextRun::new(
            entry.title.clone(),
            TextStyle::new(TITLE_FONT_SIZE, true),
        )],
    )
}

/// Body shape synthesized from an outline entry's key points.
pub fn body_shape(entry: &SlideOutlineEntry) -> Shape {
    Shape::new(
        ShapeKind::Body,
        Location::BODY,
        entry
            .key_points
            .iter()
            .map(|point| TextRun::new(point.clone(), TextStyle::new(DEFAULT_FONT_SIZE, false)))
            .collect(),
    )
}

fn normalize_shape(map: &Map<String, Value>) -> Shape {
    let kind = string_field(map, &["type", "t"])
        .map(ShapeKind::from)
        .unwrap_or(ShapeKind::Body);

    let empty = Map::new();
    let loc = field(map, &["location", "p"])
        .and_then(Value::as_object)
        .unwrap_or(&empty);
    let defaults = Location::BODY;
    let location = Location {
        x: int_field(loc, &["x"]).unwrap_or(defaults.x),
        y: int_field(loc, &["y"]).unwrap_or(defaults.y),
        width: int_field(loc, &["width", "w"]).unwrap_or(defaults.width),
        height: int_field(loc, &["height", "h"]).unwrap_or(defaults.height),
    };

    let text_content = field(map, &["textContent", "c"])
        .and_then(Value::as_array)
        .map(|runs| runs.iter().map(normalize_run).collect())
        .unwrap_or_default();

    Shape {
        kind,
        location,
        text_content,
        table_content: field(map, &["tableContent"]).cloned(),
        chart_content: field(map, &["chartContent"]).cloned(),
    }
}

fn normalize_run(value: &Value) -> TextRun {
    let empty = Map::new();
    let map = match value {
        Value::Object(map) => map,
        // A bare string is taken as the run text.
        Value::String(text) => return TextRun::new(text.clone(), TextStyle::new(DEFAULT_FONT_SIZE, false)),
        _ => &empty,
    };

    let text = field(map, &["text", "t"])
        .and_then(scalar_to_string)
        .unwrap_or_default();

    let style_map = field(map, &["style", "s"])
        .and_then(Value::as_object)
        .unwrap_or(&empty);

    let style = TextStyle {
        font_size: int_field(style_map, &["fontSize", "f"])
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(DEFAULT_FONT_SIZE),
        is_bold: field(style_map, &["isBold", "b"])
            .and_then(Value::as_bool)
            .unwrap_or(false),
        color: string_field(style_map, &["color"]),
        font_name: string_field(style_map, &["fontName"]),
        alignment: field(style_map, &["alignment"])
            .and_then(|v| serde_json::from_value::<Alignment>(v.clone()).ok()),
        paragraph_spacing: field(style_map, &["paragraphSpacing"])
            .and_then(|v| serde_json::from_value::<ParagraphSpacing>(v.clone()).ok()),
        is_italic: field(style_map, &["isItalic"]).and_then(Value::as_bool),
        is_underline: field(style_map, &["isUnderline"]).and_then(Value::as_bool),
    };

    TextRun { text, style }
}

/// First present, non-null value among the given keys.
fn field<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| map.get(*k))
        .find(|v| !v.is_null())
}

/// First non-blank string (or stringified scalar) among the given keys.
fn string_field(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| map.get(*k))
        .filter_map(scalar_to_string)
        .find(|s| !s.trim().is_empty())
}

/// First integer-valued field among the given keys. Floats are rounded and
/// numeric strings are parsed.
fn int_field(map: &Map<String, Value>, keys: &[&str]) -> Option<i64> {
    keys.iter().filter_map(|k| map.get(*k)).find_map(|v| match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f.round() as i64),
        _ => None,
    })
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Scalars become strings; nested values are dropped. A lone scalar is
/// treated as a one-item list.
fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(scalar_to_string).collect(),
        other => scalar_to_string(other).into_iter().collect(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry() -> SlideOutlineEntry {
        SlideOutlineEntry::new("Market Overview", SlideCategory::ExecutiveSummary)
            .with_key_points(["Demand up 12%", "Two new entrants"])
    }

    #[test]
    fn test_defaulting_short_title() {
        let e = normalize_outline_entry(&json!({"t": "X"}));
        assert_eq!(e.title, "X");
        assert_eq!(e.category, SlideCategory::Content);
        assert!(e.key_points.is_empty());
        assert_eq!(e.visual_hint, "Basic layout");
    }

    #[test]
    fn test_empty_entry_gets_default_title() {
        let e = normalize_outline_entry(&json!({"t": "   "}));
        assert_eq!(e.title, "Untitled Slide");
        assert_eq!(normalize_outline_entry(&json!(42)).title, "Untitled Slide");
    }

    #[test]
    fn test_long_keys_win_over_short() {
        let e = normalize_outline_entry(&json!({
            "title": "Long", "t": "Short",
            "key_points": ["a"], "k": ["b"],
            "visuals": "matrix", "v": "chart"
        }));
        assert_eq!(e.title, "Long");
        assert_eq!(e.key_points, vec!["a"]);
        assert_eq!(e.visual_hint, "matrix");
    }

    #[test]
    fn test_category_inference_order() {
        assert_eq!(infer_category("Executive Summary"), SlideCategory::ExecutiveSummary);
        assert_eq!(infer_category("The Challenge"), SlideCategory::ProblemStatement);
        assert_eq!(infer_category("Our Approach"), SlideCategory::Solution);
        assert_eq!(infer_category("Next Steps"), SlideCategory::Roadmap);
        assert_eq!(infer_category("Key Metrics"), SlideCategory::Data);
        assert_eq!(infer_category("Recommendation"), SlideCategory::Conclusion);
        assert_eq!(infer_category("Team"), SlideCategory::Content);
        // "Problem overview" matches the summary rule first.
        assert_eq!(infer_category("Problem Overview"), SlideCategory::ExecutiveSummary);
        // Substring matching: "status" contains "stat".
        assert_eq!(infer_category("Project status"), SlideCategory::Data);
    }

    #[test]
    fn test_category_inference_folds_width() {
        assert_eq!(infer_category("ＳＵＭＭＡＲＹ"), SlideCategory::ExecutiveSummary);
    }

    #[test]
    fn test_explicit_type_wins_unless_unknown() {
        let e = normalize_outline_entry(&json!({"t": "Next Steps", "type": "data"}));
        assert_eq!(e.category, SlideCategory::Data);

        let e = normalize_outline_entry(&json!({"t": "Next Steps", "type": "2x2"}));
        assert_eq!(e.category, SlideCategory::Roadmap);
    }

    #[test]
    fn test_key_points_stringify_scalars() {
        let e = normalize_outline_entry(&json!({"k": ["a", 3, {"x": 1}, null, true]}));
        assert_eq!(e.key_points, vec!["a", "3", "true"]);
    }

    #[test]
    fn test_outline_accepts_array_or_object() {
        assert_eq!(normalize_outline(&json!([{"t": "A"}, {"t": "B"}])).unwrap().len(), 2);
        assert_eq!(normalize_outline(&json!({"t": "A"})).unwrap().len(), 1);
        assert!(matches!(
            normalize_outline(&json!("nope")),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_outline_idempotent() {
        let once = normalize_outline(&json!([{"t": "Next Steps", "k": ["Hire"]}])).unwrap();
        let again = normalize_outline(&serde_json::to_value(&once).unwrap()).unwrap();
        assert_eq!(once, again);
    }

    #[test]
    fn test_compact_content() {
        let value = json!({
            "l": {"n": "Two Content", "t": "comparison"},
            "s": [
                {"t": "TITLE", "p": {"x": 1, "y": 2, "w": 3, "h": 4},
                 "c": [{"t": "Headline", "s": {"f": 40, "b": true}}]},
                {"t": "BODY", "p": {"x": 5},
                 "c": [{"t": "Point"}]}
            ]
        });
        let content = normalize_content(&value, &entry()).unwrap();
        assert_eq!(content.layout.name, "Two Content");
        assert_eq!(content.layout.kind, "comparison");
        assert_eq!(content.shapes.len(), 2);

        let title = &content.shapes[0];
        assert_eq!(title.kind, ShapeKind::Title);
        assert_eq!(title.location, Location::new(1, 2, 3, 4));
        assert_eq!(title.text_content[0].text, "Headline");
        assert_eq!(title.text_content[0].style, TextStyle::new(40, true));

        let body = &content.shapes[1];
        assert_eq!(body.location, Location::new(5, 2_500_000, 8_000_000, 4_000_000));
        assert_eq!(body.text_content[0].style, TextStyle::new(24, false));
    }

    #[test]
    fn test_layout_defaults_from_category() {
        let content = normalize_content(&json!({}), &entry()).unwrap();
        assert_eq!(content.layout.name, "Executive_Summary");
        assert_eq!(content.layout.kind, "content");
    }

    #[test]
    fn test_shape_completion_on_empty_shapes() {
        let content = normalize_content(&json!({"s": []}), &entry()).unwrap();
        assert_eq!(content.shapes.len(), 2);
        assert_eq!(content.shapes[0].kind, ShapeKind::Title);
        assert_eq!(content.shapes[0].location, Location::TITLE);
        assert_eq!(content.shapes[0].text_content[0].text, "Market Overview");
        assert_eq!(content.shapes[0].text_content[0].style, TextStyle::new(32, true));
        assert_eq!(content.shapes[1].kind, ShapeKind::Body);
        assert_eq!(content.shapes[1].location, Location::BODY);
        let texts: Vec<_> = content.shapes[1].text_content.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["Demand up 12%", "Two new entrants"]);
    }

    #[test]
    fn test_shape_completion_keeps_existing_order() {
        let value = json!({"s": [{"t": "PICTURE", "c": []}, {"c": [{"t": "x"}]}]});
        let content = normalize_content(&value, &entry()).unwrap();
        // Untyped shape defaults to BODY, so only a TITLE is synthesized.
        let kinds: Vec<_> = content.shapes.iter().map(|s| s.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                ShapeKind::Title,
                ShapeKind::Other("PICTURE".to_string()),
                ShapeKind::Body
            ]
        );
    }

    #[test]
    fn test_content_must_be_object() {
        assert!(matches!(
            normalize_content(&json!([1, 2]), &entry()),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_content_idempotent_with_optional_fields() {
        let value = json!({
            "layout": {"name": "Title Only", "type": "basic"},
            "shapes": [{
                "type": "TITLE",
                "location": {"x": 10, "y": 20, "width": 30, "height": 40},
                "textContent": [{
                    "text": "Hello",
                    "style": {
                        "fontSize": 28, "isBold": true, "color": "#112233",
                        "fontName": "Georgia", "alignment": "center",
                        "paragraphSpacing": {"before": 3, "after": 4, "line": 1.2},
                        "isItalic": false, "isUnderline": true
                    }
                }]
            }, {
                "type": "BODY",
                "location": {"x": 1, "y": 2, "width": 3, "height": 4},
                "textContent": [],
                "tableContent": [["a", "b"]]
            }]
        });
        let once = normalize_content(&value, &entry()).unwrap();
        let again = normalize_content(&serde_json::to_value(&once).unwrap(), &entry()).unwrap();
        assert_eq!(once, again);
        assert_eq!(serde_json::to_value(&once).unwrap(), value);
    }

    #[test]
    fn test_float_and_string_numbers() {
        let value = json!({"s": [{"t": "BODY", "p": {"x": 12.6, "y": "300"},
            "c": [{"t": 7, "s": {"f": 18.4}}]}]});
        let content = normalize_content(&value, &entry()).unwrap();
        let body = content.shapes.iter().find(|s| s.kind == ShapeKind::Body).unwrap();
        assert_eq!(body.location.x, 13);
        assert_eq!(body.location.y, 300);
        assert_eq!(body.text_content[0].text, "7");
        assert_eq!(body.text_content[0].style.font_size, 18);
    }
}
